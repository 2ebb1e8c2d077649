//! Scripted in-memory DocumentAccess fake shared by the integration tests
//!
//! The fake interprets the short selector names installed by `test_config`
//! directly instead of parsing CSS, and scripts page advancement and tree
//! expansion through plain state transitions.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tender_harvest::{AccessError, DocumentAccess, ElementHandle, HarvestConfig};

pub const TABLE: &str = "table";
pub const ROW: &str = "row";
pub const NEXT: &str = "next";
pub const NODE: &str = "node";
pub const LABEL: &str = "label";
pub const EXPAND: &str = "expand";

/// Config wired to the fake's selector names, with pacing collapsed so
/// tests run instantly
pub fn test_config() -> HarvestConfig {
    let mut config = HarvestConfig::default();
    config.retry.base_delay_ms = 1;
    config.paging.settle_ms = 0;
    config.paging.table_timeout_ms = 50;
    config.expansion.settle_ms = 0;

    let listing = &mut config.selectors.listing;
    listing.search_submit = String::new();
    listing.results_table = TABLE.to_string();
    listing.row = ROW.to_string();
    listing.file_ref_link = "ref".to_string();
    listing.file_ref_description = "desc".to_string();
    listing.electronic_bid_marker = "ebid".to_string();
    listing.contract_type = "type".to_string();
    listing.contract_subtype = "subtype".to_string();
    listing.status = "status".to_string();
    listing.amount = "amount".to_string();
    listing.due_date = "due".to_string();
    listing.body_link = "body".to_string();
    listing.next_page = NEXT.to_string();

    let taxonomy = &mut config.selectors.taxonomy;
    taxonomy.node = NODE.to_string();
    taxonomy.node_label = LABEL.to_string();
    taxonomy.expand_control = EXPAND.to_string();

    config
}

/// One scripted listing row: field selector -> (text, optional href)
#[derive(Debug, Clone, Default)]
pub struct FakeRow {
    pub fields: HashMap<String, (String, Option<String>)>,
    pub poisoned: bool,
}

impl FakeRow {
    /// Fully populated notice row
    pub fn tender(id: &str) -> Self {
        let mut row = Self::default();
        row.set("ref", &format!("EXP {id}"), Some(&format!("/tender/{id}")));
        row.set("desc", "Works contract", None);
        row.set("type", "Obras", None);
        row.set("subtype", "Construcción", None);
        row.set("status", "Publicada", None);
        row.set("amount", "12,50 EUR", None);
        row.set("due", "31/12/2024", None);
        row.set("body", "Ayuntamiento de Getafe", Some("/organ/1"));
        row
    }

    pub fn poisoned() -> Self {
        Self {
            poisoned: true,
            ..Self::default()
        }
    }

    pub fn set(&mut self, selector: &str, text: &str, href: Option<&str>) {
        self.fields.insert(
            selector.to_string(),
            (text.to_string(), href.map(str::to_string)),
        );
    }

    pub fn with_field(mut self, selector: &str, text: &str, href: Option<&str>) -> Self {
        self.set(selector, text, href);
        self
    }

    pub fn without(mut self, selector: &str) -> Self {
        self.fields.remove(selector);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub rows: Vec<FakeRow>,
}

impl FakePage {
    pub fn of(rows: Vec<FakeRow>) -> Self {
        Self { rows }
    }
}

/// One scripted tree entry; `reveals` lists node indices made visible when
/// this node's expand control is activated
#[derive(Debug, Clone)]
pub struct FakeTreeNode {
    pub label: String,
    pub style: String,
    pub path: Vec<usize>,
    pub visible: bool,
    pub expandable: bool,
    pub reveals: Vec<usize>,
    pub label_missing: bool,
}

impl FakeTreeNode {
    pub fn new(label: &str, style: &str, path: &[usize]) -> Self {
        Self {
            label: label.to_string(),
            style: style.to_string(),
            path: path.to_vec(),
            visible: true,
            expandable: false,
            reveals: Vec::new(),
            label_missing: false,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn expands_into(mut self, reveals: &[usize]) -> Self {
        self.expandable = true;
        self.reveals = reveals.to_vec();
        self
    }

    pub fn without_label(mut self) -> Self {
        self.label_missing = true;
        self
    }
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub pages: Vec<FakePage>,
    pub current_page: usize,
    /// wait_for(table) fails this many times before succeeding
    pub ready_failures: u32,
    /// the next-page control never disappears; clicks are only counted
    pub endless_next: bool,
    pub next_disabled: bool,
    pub next_clicks: u32,
    pub tree: Vec<FakeTreeNode>,
    /// always one more expand control, regardless of tree state
    pub endless_expand: bool,
    pub expand_clicks: u32,
}

pub struct FakeAccess {
    state: Mutex<FakeState>,
}

impl FakeAccess {
    pub fn new(state: FakeState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn listing(pages: Vec<FakePage>) -> Self {
        Self::new(FakeState {
            pages,
            ..FakeState::default()
        })
    }

    pub fn tree(nodes: Vec<FakeTreeNode>) -> Self {
        Self::new(FakeState {
            tree: nodes,
            ..FakeState::default()
        })
    }

    pub fn with_state(self, f: impl FnOnce(&mut FakeState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn next_clicks(&self) -> u32 {
        self.state.lock().unwrap().next_clicks
    }

    pub fn expand_clicks(&self) -> u32 {
        self.state.lock().unwrap().expand_clicks
    }

    fn parse_row_token(token: &str) -> Option<(usize, usize)> {
        let rest = token.strip_prefix("row:")?;
        let (page, row) = rest.split_once(':')?;
        Some((page.parse().ok()?, row.parse().ok()?))
    }

    fn parse_index(token: &str, prefix: &str) -> Option<usize> {
        token.strip_prefix(prefix)?.parse().ok()
    }
}

#[async_trait]
impl DocumentAccess for FakeAccess {
    async fn navigate(
        &self,
        _url: &str,
        _ready_selector: &str,
        _timeout: Duration,
    ) -> Result<(), AccessError> {
        Ok(())
    }

    async fn query(&self, selector: &str) -> Result<Vec<ElementHandle>, AccessError> {
        let state = self.state.lock().unwrap();
        let handles = match selector {
            TABLE => vec![ElementHandle::new("table")],
            ROW => {
                let page = state.current_page;
                state
                    .pages
                    .get(page)
                    .map(|p| {
                        (0..p.rows.len())
                            .map(|i| ElementHandle::new(format!("row:{page}:{i}")))
                            .collect()
                    })
                    .unwrap_or_default()
            }
            NEXT => {
                if state.endless_next || state.current_page + 1 < state.pages.len() {
                    vec![ElementHandle::new("next")]
                } else {
                    Vec::new()
                }
            }
            NODE => state
                .tree
                .iter()
                .enumerate()
                .filter(|(_, n)| n.visible)
                .map(|(i, _)| ElementHandle::new(format!("node:{i}")))
                .collect(),
            EXPAND => {
                if state.endless_expand {
                    vec![ElementHandle::new("expand:endless")]
                } else {
                    state
                        .tree
                        .iter()
                        .enumerate()
                        .filter(|(_, n)| n.visible && n.expandable)
                        .map(|(i, _)| ElementHandle::new(format!("expand:{i}")))
                        .collect()
                }
            }
            _ => Vec::new(),
        };
        Ok(handles)
    }

    async fn query_within(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, AccessError> {
        let state = self.state.lock().unwrap();
        let token = scope.token();

        if let Some((page, index)) = Self::parse_row_token(token) {
            let row = state
                .pages
                .get(page)
                .and_then(|p| p.rows.get(index))
                .ok_or(AccessError::Stale {
                    token: token.to_string(),
                })?;
            if row.poisoned {
                return Err(AccessError::Stale {
                    token: token.to_string(),
                });
            }
            return Ok(if row.fields.contains_key(selector) {
                vec![ElementHandle::new(format!("field:{page}:{index}:{selector}"))]
            } else {
                Vec::new()
            });
        }

        if let Some(index) = Self::parse_index(token, "node:") {
            let node = state.tree.get(index).ok_or(AccessError::Stale {
                token: token.to_string(),
            })?;
            if selector == LABEL && !node.label_missing {
                return Ok(vec![ElementHandle::new(format!("nodelabel:{index}"))]);
            }
            return Ok(Vec::new());
        }

        Ok(Vec::new())
    }

    async fn text(&self, element: &ElementHandle) -> Result<String, AccessError> {
        let state = self.state.lock().unwrap();
        let token = element.token();

        if let Some(rest) = token.strip_prefix("field:") {
            let mut parts = rest.splitn(3, ':');
            let page: usize = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
            let index: usize = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
            let selector = parts.next().unwrap_or("");
            return state
                .pages
                .get(page)
                .and_then(|p| p.rows.get(index))
                .and_then(|r| r.fields.get(selector))
                .map(|(text, _)| text.clone())
                .ok_or(AccessError::Stale {
                    token: token.to_string(),
                });
        }

        if let Some(index) = Self::parse_index(token, "nodelabel:") {
            return state
                .tree
                .get(index)
                .map(|n| n.label.clone())
                .ok_or(AccessError::Stale {
                    token: token.to_string(),
                });
        }

        Err(AccessError::Stale {
            token: token.to_string(),
        })
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, AccessError> {
        let state = self.state.lock().unwrap();
        let token = element.token();

        if token == "next" {
            return Ok(match name {
                "disabled" if state.next_disabled => Some("disabled".to_string()),
                _ => None,
            });
        }

        if let Some(rest) = token.strip_prefix("field:") {
            if name == "href" {
                let mut parts = rest.splitn(3, ':');
                let page: usize = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
                let index: usize = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
                let selector = parts.next().unwrap_or("");
                return Ok(state
                    .pages
                    .get(page)
                    .and_then(|p| p.rows.get(index))
                    .and_then(|r| r.fields.get(selector))
                    .and_then(|(_, href)| href.clone()));
            }
            return Ok(None);
        }

        if let Some(index) = Self::parse_index(token, "node:") {
            if name == "style" {
                return Ok(state.tree.get(index).map(|n| n.style.clone()));
            }
            return Ok(None);
        }

        Ok(None)
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), AccessError> {
        let mut state = self.state.lock().unwrap();
        let token = element.token();

        if token == "next" {
            state.next_clicks += 1;
            if !state.endless_next {
                state.current_page += 1;
            }
            return Ok(());
        }

        if token == "expand:endless" {
            state.expand_clicks += 1;
            return Ok(());
        }

        if let Some(index) = Self::parse_index(token, "expand:") {
            state.expand_clicks += 1;
            let reveals = match state.tree.get_mut(index) {
                Some(node) => {
                    node.expandable = false;
                    node.reveals.clone()
                }
                None => Vec::new(),
            };
            for revealed in reveals {
                if let Some(node) = state.tree.get_mut(revealed) {
                    node.visible = true;
                }
            }
            return Ok(());
        }

        Ok(())
    }

    async fn is_visible(&self, element: &ElementHandle) -> Result<bool, AccessError> {
        let state = self.state.lock().unwrap();
        let token = element.token();

        if let Some(index) = Self::parse_index(token, "expand:") {
            return Ok(state.tree.get(index).map(|n| n.visible).unwrap_or(false));
        }
        if let Some(index) = Self::parse_index(token, "node:") {
            return Ok(state.tree.get(index).map(|n| n.visible).unwrap_or(false));
        }
        Ok(true)
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), AccessError> {
        let mut state = self.state.lock().unwrap();
        if selector == TABLE && state.ready_failures > 0 {
            state.ready_failures -= 1;
            return Err(AccessError::Timeout {
                selector: selector.to_string(),
                timeout,
            });
        }
        Ok(())
    }

    async fn position_path(&self, element: &ElementHandle) -> Result<Vec<usize>, AccessError> {
        let state = self.state.lock().unwrap();
        let token = element.token();
        Self::parse_index(token, "node:")
            .and_then(|i| state.tree.get(i))
            .map(|n| n.path.clone())
            .ok_or(AccessError::Stale {
                token: token.to_string(),
            })
    }

    async fn pause(&self, _duration: Duration) {
        // scripted state settles instantly
    }
}
