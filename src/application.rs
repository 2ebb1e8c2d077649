//! Application layer: the harvesting and reconstruction use cases
//!
//! Orchestrates domain extraction over the abstract document access seam.

pub mod error;
pub mod expander;
pub mod extractor;
pub mod harvester;
pub mod reconstructor;

pub use error::{HarvestError, HarvestResult};
pub use expander::TreeExpander;
pub use extractor::RecordExtractor;
pub use harvester::ListingHarvester;
pub use reconstructor::{FlatNode, TaxonomyReconstructor, build_by_depth, build_by_path};
