//! Tender Harvest - procurement notice harvesting from rendered portals
//!
//! Extracts structured listing records from a paginated procurement portal
//! and rebuilds the classification-code tree from its rendered tree widget.
//! Both views expose data only through markup, so harvesting drives
//! navigation and reads transient document state through an abstract
//! [`DocumentAccess`] capability implemented once per rendering backend.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export the public surface for easier access
pub use application::{
    HarvestError, HarvestResult, ListingHarvester, RecordExtractor, TaxonomyReconstructor,
    TreeExpander,
};
pub use domain::{ContractType, ContractingBody, FileReference, ListingRecord, TaxonomyNode};
pub use infrastructure::{
    AccessError, DocumentAccess, ElementHandle, HarvestConfig, ResourceKind,
    StaticDocumentAccess, TreeStrategy,
};
