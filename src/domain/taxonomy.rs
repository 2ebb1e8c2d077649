//! Classification-tree nodes reconstructed from the rendered taxonomy widget

use serde::{Deserialize, Serialize};

/// One classification-tree entry.
///
/// Parent/child relationships are inferred during reconstruction and stored
/// only downward: a node owns its `children` in document order, with no back
/// references. `depth` is the level the node was rendered at (roots are 0).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyNode {
    /// 8-digit classification code; empty when the label carried none
    pub code: String,
    pub description: String,
    pub depth: usize,
    pub children: Vec<TaxonomyNode>,
}

impl TaxonomyNode {
    pub fn new(code: impl Into<String>, description: impl Into<String>, depth: usize) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            depth,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including self
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TaxonomyNode::count).sum::<usize>()
    }

    /// Flatten the subtree into `(depth, code, description)` rows in document
    /// order. This is the tabular rendering callers can feed to a report
    /// writer; the nested form stays the canonical one.
    pub fn flatten(&self) -> Vec<(usize, String, String)> {
        let mut rows = vec![(self.depth, self.code.clone(), self.description.clone())];
        for child in &self.children {
            rows.extend(child.flatten());
        }
        rows
    }
}
