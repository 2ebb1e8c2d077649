//! Harvest configuration: retry budgets, pacing, selector tables
//!
//! Everything the traversal logic keys on lives here so a deployment can be
//! repointed at a restyled portal without touching code. Configuration
//! round-trips through pretty-printed JSON.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level configuration for one harvest deployment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub retry: RetryConfig,
    pub paging: PagingConfig,
    pub expansion: ExpansionConfig,
    pub tree: TreeConfig,
    pub formats: FormatConfig,
    pub selectors: SelectorConfig,
}

impl HarvestConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Write configuration as pretty-printed JSON
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content =
            serde_json::to_string_pretty(self).context("failed to serialize configuration")?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write config file {}", path.display()))
    }
}

/// Retry budget for the readiness phase of a harvest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

/// Pagination pacing and bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Settling pause after activating the next-page control
    pub settle_ms: u64,
    /// How long to wait for the results table to (re)appear
    pub table_timeout_ms: u64,
    /// Safety cap on pages visited; `None` trusts the portal to disable
    /// its next control eventually
    pub max_pages: Option<u32>,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            settle_ms: 500,
            table_timeout_ms: 30_000,
            max_pages: None,
        }
    }
}

/// Bounds for the expand-to-fixpoint tree sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    /// Sweep ceiling against widgets that keep producing expandable nodes
    pub max_iterations: u32,
    /// Settling pause after each sweep of activations
    pub settle_ms: u64,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            settle_ms: 300,
        }
    }
}

/// Which reconstruction strategy reads the expanded tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TreeStrategy {
    /// Depth from rendered indentation, ancestor stack
    DepthStack,
    /// Sibling-index paths, parent looked up by path prefix
    PositionalPath,
}

/// Tree reconstruction tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub strategy: TreeStrategy,
    /// Rendered indentation per tree level, used by the depth-stack strategy
    pub indent_px_per_level: f64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            strategy: TreeStrategy::DepthStack,
            indent_px_per_level: 20.0,
        }
    }
}

/// Date patterns used when normalizing listing cells
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    pub due_date_input: String,
    pub due_date_output: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            due_date_input: "%d/%m/%Y".to_string(),
            due_date_output: "%Y-%m-%d".to_string(),
        }
    }
}

/// Selector tables for both harvested views
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub listing: ListingSelectors,
    pub taxonomy: TaxonomySelectors,
}

/// CSS selectors for the paginated notice listing.
///
/// Comma-separated alternatives are allowed anywhere; the first match wins.
/// Field selectors are evaluated inside one row element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    /// Search submit control; empty when the view loads pre-submitted
    pub search_submit: String,
    pub results_table: String,
    pub row: String,
    pub file_ref_link: String,
    pub file_ref_description: String,
    pub electronic_bid_marker: String,
    pub contract_type: String,
    pub contract_subtype: String,
    pub status: String,
    pub amount: String,
    pub due_date: String,
    pub body_link: String,
    /// Next-page control, probed after each page
    pub next_page: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            search_submit: "input[type='submit'].search, #searchButton".to_string(),
            results_table: "table#tenderResults, table.tender-listing".to_string(),
            row: "table#tenderResults tbody tr, table.tender-listing tbody tr".to_string(),
            file_ref_link: "td:nth-child(1) a".to_string(),
            file_ref_description: "td:nth-child(1) div.descripcion, td:nth-child(1) .description"
                .to_string(),
            electronic_bid_marker:
                "td:nth-child(1) img[alt*='lectr'], td:nth-child(1) .electronic-bid".to_string(),
            contract_type: "td:nth-child(2) div.tipo, td:nth-child(2) span.tipo".to_string(),
            contract_subtype: "td:nth-child(2) div.subtipo, td:nth-child(2) .subtype".to_string(),
            status: "td:nth-child(3)".to_string(),
            amount: "td:nth-child(4)".to_string(),
            due_date: "td:nth-child(5)".to_string(),
            body_link: "td:nth-child(6) a".to_string(),
            next_page: "a#nextPageLink, li.next > a, a.siguiente".to_string(),
        }
    }
}

/// CSS selectors for the classification-tree widget
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomySelectors {
    /// One rendered tree entry (the element carrying the indentation)
    pub node: String,
    /// Label element inside a node
    pub node_label: String,
    /// Controls that reveal more of the tree when activated
    pub expand_control: String,
}

impl Default for TaxonomySelectors {
    fn default() -> Self {
        Self {
            node: "li.tree-node, .ygtvitem".to_string(),
            node_label: "span.node-label, .ygtvlabel".to_string(),
            expand_control: "a.toggle-expand, .ygtvspacer a, td.ygtv-expand a".to_string(),
        }
    }
}

/// Logging output configuration, consumed by `infrastructure::logging`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub console_output: bool,
    pub file_output: bool,
    /// Log directory; defaults to `./logs` under the working directory
    pub directory: Option<String>,
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            directory: None,
            file_name: "tender-harvest.log".to_string(),
        }
    }
}
