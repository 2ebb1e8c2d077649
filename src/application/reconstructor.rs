//! Flat-to-hierarchy reconstruction of the expanded classification tree
//!
//! The widget renders the tree as a linear, document-order stream of nodes;
//! parentage is never explicit. Two strategies recover it: depth derived
//! from rendered indentation with an ancestor stack, or sibling-index paths
//! with a parent lookup by path prefix. Both preserve document order and
//! promote nodes with no discoverable ancestor to roots instead of dropping
//! them.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::application::error::{HarvestError, HarvestResult};
use crate::domain::taxonomy::TaxonomyNode;
use crate::infrastructure::access::{DocumentAccess, ElementHandle};
use crate::infrastructure::config::{HarvestConfig, TreeStrategy};
use crate::infrastructure::normalize::parse_label;

lazy_static! {
    static ref INDENT_RE: Regex =
        Regex::new(r"(?:padding|margin)-left:\s*([0-9]+(?:\.[0-9]+)?)px").unwrap();
}

/// One rendered tree entry in document order, before parentage is inferred.
/// The depth-stack strategy fills `depth`; the positional-path strategy
/// fills `path`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatNode {
    pub code: String,
    pub description: String,
    pub depth: usize,
    pub path: Vec<usize>,
}

enum ReadMode {
    Depth,
    Path,
}

pub struct TaxonomyReconstructor {
    config: HarvestConfig,
}

impl TaxonomyReconstructor {
    pub fn new(config: HarvestConfig) -> Self {
        Self { config }
    }

    /// Rebuild the tree from the currently rendered (expanded) node stream,
    /// using the configured strategy
    pub async fn reconstruct(
        &self,
        access: &dyn DocumentAccess,
    ) -> HarvestResult<Vec<TaxonomyNode>> {
        match self.config.tree.strategy {
            TreeStrategy::DepthStack => self.reconstruct_by_depth(access).await,
            TreeStrategy::PositionalPath => self.reconstruct_by_path(access).await,
        }
    }

    pub async fn reconstruct_by_depth(
        &self,
        access: &dyn DocumentAccess,
    ) -> HarvestResult<Vec<TaxonomyNode>> {
        let entries = self.read_flat_stream(access, ReadMode::Depth).await?;
        let roots = build_by_depth(entries);
        info!(
            "🌳 reconstructed {} root(s), {} node(s) total (depth strategy)",
            roots.len(),
            roots.iter().map(TaxonomyNode::count).sum::<usize>()
        );
        Ok(roots)
    }

    pub async fn reconstruct_by_path(
        &self,
        access: &dyn DocumentAccess,
    ) -> HarvestResult<Vec<TaxonomyNode>> {
        let entries = self.read_flat_stream(access, ReadMode::Path).await?;
        let roots = build_by_path(entries);
        info!(
            "🌳 reconstructed {} root(s), {} node(s) total (path strategy)",
            roots.len(),
            roots.iter().map(TaxonomyNode::count).sum::<usize>()
        );
        Ok(roots)
    }

    /// Read every rendered node in document order. Unreadable nodes are
    /// logged and skipped; their descendants attach to the next viable
    /// ancestor or become roots.
    async fn read_flat_stream(
        &self,
        access: &dyn DocumentAccess,
        mode: ReadMode,
    ) -> HarvestResult<Vec<FlatNode>> {
        let node_elements = access.query(&self.config.selectors.taxonomy.node).await?;
        let mut entries = Vec::with_capacity(node_elements.len());

        for (index, element) in node_elements.iter().enumerate() {
            match self.read_entry(access, element, index, &mode).await {
                Ok(entry) => entries.push(entry),
                Err(error) if error.is_unit_scoped() => {
                    warn!("skipping tree node: {}", error);
                }
                Err(error) => return Err(error),
            }
        }
        Ok(entries)
    }

    async fn read_entry(
        &self,
        access: &dyn DocumentAccess,
        element: &ElementHandle,
        index: usize,
        mode: &ReadMode,
    ) -> HarvestResult<FlatNode> {
        let label_selector = &self.config.selectors.taxonomy.node_label;
        let label_element = access
            .query_within(element, label_selector)
            .await
            .map_err(|e| HarvestError::node(index, e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| HarvestError::node(index, "label element missing"))?;

        let label = access
            .text(&label_element)
            .await
            .map_err(|e| HarvestError::node(index, e.to_string()))?;
        if label.trim().is_empty() {
            return Err(HarvestError::node(index, "empty label"));
        }
        let (code, description) = parse_label(&label);

        let (depth, path) = match mode {
            ReadMode::Depth => {
                let style = access
                    .attribute(element, "style")
                    .await
                    .map_err(|e| HarvestError::node(index, e.to_string()))?;
                (self.depth_from_style(style.as_deref()), Vec::new())
            }
            ReadMode::Path => {
                let path = access
                    .position_path(element)
                    .await
                    .map_err(|e| HarvestError::node(index, e.to_string()))?;
                (0, path)
            }
        };

        Ok(FlatNode {
            code,
            description,
            depth,
            path,
        })
    }

    /// Rendered indentation divided by the per-level indent width, floored.
    /// Roots carry no indentation and read as depth 0.
    fn depth_from_style(&self, style: Option<&str>) -> usize {
        let per_level = self.config.tree.indent_px_per_level;
        if per_level <= 0.0 {
            return 0;
        }
        style
            .and_then(|s| INDENT_RE.captures(s))
            .and_then(|caps| caps[1].parse::<f64>().ok())
            .map(|px| (px / per_level).floor() as usize)
            .unwrap_or(0)
    }
}

/// Depth-stack reconstruction: a node at depth d becomes a child of the
/// most recent node at depth d-1; with no such ancestor it becomes a root.
pub fn build_by_depth(entries: Vec<FlatNode>) -> Vec<TaxonomyNode> {
    let count = entries.len();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut roots: Vec<usize> = Vec::new();
    let mut stack: Vec<usize> = Vec::new();

    for index in 0..count {
        let depth = entries[index].depth;
        while stack
            .last()
            .is_some_and(|&top| entries[top].depth >= depth)
        {
            stack.pop();
        }
        match stack.last() {
            Some(&top) if entries[top].depth + 1 == depth => children[top].push(index),
            // depth gap or empty stack: no ancestor exactly one level up
            _ => roots.push(index),
        }
        stack.push(index);
    }

    let mut nodes: Vec<Option<TaxonomyNode>> = entries
        .into_iter()
        .map(|e| Some(TaxonomyNode::new(e.code, e.description, e.depth)))
        .collect();
    roots
        .iter()
        .filter_map(|&root| assemble(root, None, &mut nodes, &children))
        .collect()
}

/// Positional-path reconstruction: the parent is the node registered under
/// the current path minus its last segment; a missing parent promotes the
/// node to root. Depth is derived from attachment (roots are 0).
pub fn build_by_path(entries: Vec<FlatNode>) -> Vec<TaxonomyNode> {
    let count = entries.len();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut roots: Vec<usize> = Vec::new();
    let mut by_path: HashMap<Vec<usize>, usize> = HashMap::with_capacity(count);

    for index in 0..count {
        let path = &entries[index].path;
        let parent = if path.len() > 1 {
            by_path.get(&path[..path.len() - 1]).copied()
        } else {
            None
        };
        match parent {
            Some(parent_index) => children[parent_index].push(index),
            None => roots.push(index),
        }
        by_path.insert(path.clone(), index);
    }

    let mut nodes: Vec<Option<TaxonomyNode>> = entries
        .into_iter()
        .map(|e| Some(TaxonomyNode::new(e.code, e.description, 0)))
        .collect();
    roots
        .iter()
        .filter_map(|&root| assemble(root, Some(0), &mut nodes, &children))
        .collect()
}

/// Move nodes out of the arena into their nested shape, preserving document
/// order. `depth` reassigns levels from the attachment structure (positional
/// strategy); `None` keeps the rendered depth (depth strategy).
fn assemble(
    index: usize,
    depth: Option<usize>,
    nodes: &mut Vec<Option<TaxonomyNode>>,
    children: &[Vec<usize>],
) -> Option<TaxonomyNode> {
    let mut node = nodes[index].take()?;
    if let Some(level) = depth {
        node.depth = level;
    }
    let child_depth = depth.map(|level| level + 1);
    node.children = children[index]
        .iter()
        .filter_map(|&child| assemble(child, child_depth, nodes, children))
        .collect();
    Some(node)
}
