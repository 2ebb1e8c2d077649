//! Domain module - data model produced by harvesting and reconstruction
//!
//! Each module is its own file in the domain/ directory; public exports are
//! defined here for convenience.

pub mod listing;
pub mod taxonomy;

pub use listing::{ContractType, ContractingBody, FileReference, ListingRecord};
pub use taxonomy::TaxonomyNode;
