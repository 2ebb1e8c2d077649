//! Error types for harvesting and reconstruction
//!
//! The propagation policy: failures local to one unit of work (a row, a
//! node) are caught at the traversal layer, logged, and dropped from the
//! result. Failures of the shared traversal control (readiness, element
//! queries) are fatal and reach the top-level caller.

use thiserror::Error;

use crate::infrastructure::access::AccessError;

#[derive(Debug, Error)]
pub enum HarvestError {
    /// The listing view never reached a ready state; fatal for the harvest
    #[error("listing view failed to become ready after {attempts} attempts")]
    Navigation {
        attempts: u32,
        #[source]
        source: AccessError,
    },

    /// A retried operation used up its attempt budget
    #[error("operation failed after {attempts} attempts")]
    ExhaustedRetries {
        attempts: u32,
        #[source]
        source: AccessError,
    },

    /// One row's structural read failed; the harvester skips the row
    #[error("row {row} could not be read: {reason}")]
    RowExtraction { row: usize, reason: String },

    /// One tree node could not be read; the reconstructor skips the node
    #[error("tree node {index} could not be read: {reason}")]
    NodeExtraction { index: usize, reason: String },

    /// Traversal-level document access failure
    #[error(transparent)]
    Access(#[from] AccessError),
}

impl HarvestError {
    pub fn row(row: usize, error: &AccessError) -> Self {
        Self::RowExtraction {
            row,
            reason: error.to_string(),
        }
    }

    pub fn node(index: usize, reason: impl Into<String>) -> Self {
        Self::NodeExtraction {
            index,
            reason: reason.into(),
        }
    }

    /// Whether this failure is scoped to one unit of work and should be
    /// skipped rather than aborting the traversal
    pub fn is_unit_scoped(&self) -> bool {
        matches!(
            self,
            Self::RowExtraction { .. } | Self::NodeExtraction { .. }
        )
    }
}

pub type HarvestResult<T> = Result<T, HarvestError>;
