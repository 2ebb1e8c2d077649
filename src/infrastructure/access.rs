//! Abstract document access capability
//!
//! Harvesting and reconstruction never talk to a rendering engine directly.
//! They depend on this narrow, typed interface: locate elements, read text
//! and attributes, activate controls, wait and pause. A backend implements
//! it once per engine; `StaticDocumentAccess` is the bundled one for
//! server-rendered views.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Opaque reference to one located element.
///
/// The token is backend-defined; callers only pass handles back to the
/// backend that produced them. Handles may become stale after navigation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(String);

impl ElementHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

/// Non-essential sub-resource categories a backend may skip loading to
/// speed up traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Image,
    Stylesheet,
    Font,
    Media,
}

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("timed out after {timeout:?} waiting for '{selector}'")]
    Timeout { selector: String, timeout: Duration },

    #[error("no element matched '{selector}'")]
    NotFound { selector: String },

    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("stale element handle '{token}'")]
    Stale { token: String },

    #[error("operation not supported by this backend: {operation}")]
    Unsupported { operation: String },

    #[error("backend failure: {0}")]
    Backend(#[from] anyhow::Error),
}

impl AccessError {
    pub fn stale(handle: &ElementHandle) -> Self {
        Self::Stale {
            token: handle.token().to_string(),
        }
    }

    pub fn unsupported(operation: &str) -> Self {
        Self::Unsupported {
            operation: operation.to_string(),
        }
    }
}

/// Capability for navigating and querying one rendered document view.
///
/// All operations are asynchronous suspension points; callers issue them
/// strictly sequentially against a single view, so implementations need no
/// locking discipline beyond their own internal state.
#[async_trait]
pub trait DocumentAccess: Send + Sync {
    /// Load `url` and block until `ready_selector` matches, or time out
    async fn navigate(
        &self,
        url: &str,
        ready_selector: &str,
        timeout: Duration,
    ) -> Result<(), AccessError>;

    /// Locate all elements matching `selector`, in document order
    async fn query(&self, selector: &str) -> Result<Vec<ElementHandle>, AccessError>;

    /// Locate matching elements inside `scope`, in document order.
    ///
    /// A scope that no longer resolves is an error; a resolving scope with
    /// no matches is an empty result.
    async fn query_within(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, AccessError>;

    /// Concatenated text content of the element
    async fn text(&self, element: &ElementHandle) -> Result<String, AccessError>;

    /// Value of attribute `name`, or `None` when the attribute is absent
    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, AccessError>;

    /// Activate (click) the element
    async fn click(&self, element: &ElementHandle) -> Result<(), AccessError>;

    /// Whether the element is currently rendered visible
    async fn is_visible(&self, element: &ElementHandle) -> Result<bool, AccessError>;

    /// Block until `selector` matches, or time out
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), AccessError>;

    /// Sibling-index path of the element from the document root, counting
    /// element nodes only. Used to derive parent/child relationships when
    /// rendered depth is unreliable.
    async fn position_path(&self, element: &ElementHandle) -> Result<Vec<usize>, AccessError>;

    /// Fixed-duration settling pause
    async fn pause(&self, duration: Duration);

    /// Ask the backend to skip loading the given sub-resource kinds.
    /// Backends without that lever accept the hint and do nothing.
    async fn suppress_resources(&self, _kinds: &[ResourceKind]) -> Result<(), AccessError> {
        Ok(())
    }
}
