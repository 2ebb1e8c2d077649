//! Infrastructure layer: document access, retry, normalization, config
//!
//! Everything here is mechanism rather than policy: the abstract document
//! access seam and its static backend, the retry executor, the pure field
//! normalizers, configuration and logging setup.

pub mod access;
pub mod config;
pub mod logging;
pub mod normalize;
pub mod retry;
pub mod static_access;

pub use access::{AccessError, DocumentAccess, ElementHandle, ResourceKind};
pub use config::{HarvestConfig, TreeStrategy};
pub use retry::run_with_retry;
pub use static_access::{StaticAccessConfig, StaticDocumentAccess};
