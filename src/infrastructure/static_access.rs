//! Document access backend for server-rendered views
//!
//! Fetches pages with `reqwest` and queries them with `scraper`. The
//! document is held as markup text and re-parsed per operation, which keeps
//! every future `Send`; handles are step paths (selector, index) re-resolved
//! against the current document and invalidated by navigation.
//!
//! Scripted interactions are out of reach for a static fetcher: `click`
//! follows `href` links and everything else reports `Unsupported`.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use scraper::{ElementRef, Html, Selector};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info};
use url::Url;

use super::access::{AccessError, DocumentAccess, ElementHandle, ResourceKind};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// HTTP behavior of the static backend
#[derive(Debug, Clone)]
pub struct StaticAccessConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub follow_redirects: bool,
}

impl Default for StaticAccessConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: "tender-harvest/0.2 (harvesting tool)".to_string(),
            follow_redirects: true,
        }
    }
}

/// One resolution step: n-th match of a selector inside the previous scope
type Steps = Vec<(String, usize)>;

struct RegisteredHandle {
    generation: u64,
    steps: Steps,
}

struct DocState {
    markup: String,
    base: Option<Url>,
    generation: u64,
    handles: HashMap<u64, RegisteredHandle>,
    next_handle_id: u64,
    suppressed: Vec<ResourceKind>,
}

/// `DocumentAccess` over plain fetched markup
pub struct StaticDocumentAccess {
    client: Client,
    state: Mutex<DocState>,
}

impl StaticDocumentAccess {
    pub fn new() -> Result<Self, AccessError> {
        Self::with_config(StaticAccessConfig::default())
    }

    pub fn with_config(config: StaticAccessConfig) -> Result<Self, AccessError> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .map_err(|e| AccessError::Backend(anyhow!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            state: Mutex::new(DocState {
                markup: String::new(),
                base: None,
                generation: 0,
                handles: HashMap::new(),
                next_handle_id: 0,
                suppressed: Vec::new(),
            }),
        })
    }

    /// Build a backend already holding `markup`, without any fetch. Useful
    /// for pre-fetched documents and offline tests.
    pub fn from_markup(markup: impl Into<String>) -> Result<Self, AccessError> {
        let mut access = Self::new()?;
        {
            let state = access.state.get_mut();
            state.markup = markup.into();
            state.generation = 1;
        }
        Ok(access)
    }

    /// Sub-resource kinds callers asked to suppress, for policy assertions
    pub async fn suppressed_resources(&self) -> Vec<ResourceKind> {
        self.state.lock().await.suppressed.clone()
    }

    /// Replace the current document. Outstanding handles become stale.
    pub async fn load_markup(&self, markup: impl Into<String>, base: Option<&str>) -> Result<(), AccessError> {
        let parsed_base = match base {
            Some(raw) => Some(
                Url::parse(raw)
                    .map_err(|e| AccessError::Backend(anyhow!("invalid base URL '{raw}': {e}")))?,
            ),
            None => None,
        };
        let mut state = self.state.lock().await;
        state.markup = markup.into();
        state.base = parsed_base;
        state.generation += 1;
        state.handles.clear();
        Ok(())
    }

    async fn fetch_markup(&self, url: &str) -> Result<String, AccessError> {
        info!("🌐 HTTP GET: {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AccessError::Backend(anyhow!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AccessError::Backend(anyhow!("HTTP error {status}: {url}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AccessError::Backend(anyhow!("failed to read response body: {e}")))?;
        if body.is_empty() {
            return Err(AccessError::Backend(anyhow!("empty response from {url}")));
        }
        Ok(body)
    }

    async fn install_document(&self, markup: String, base: Option<Url>) {
        let mut state = self.state.lock().await;
        state.markup = markup;
        state.base = base;
        state.generation += 1;
        state.handles.clear();
    }

    fn parse_selector(selector: &str) -> Result<Selector, AccessError> {
        Selector::parse(selector).map_err(|e| AccessError::InvalidSelector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })
    }

    fn decode(handle: &ElementHandle) -> Result<u64, AccessError> {
        handle
            .token()
            .parse::<u64>()
            .map_err(|_| AccessError::stale(handle))
    }

    fn resolve<'a>(html: &'a Html, steps: &Steps) -> Result<ElementRef<'a>, AccessError> {
        let mut current: Option<ElementRef<'a>> = None;
        for (selector_str, index) in steps {
            let selector = Self::parse_selector(selector_str)?;
            let next = match current {
                None => html.select(&selector).nth(*index),
                Some(scope) => scope.select(&selector).nth(*index),
            };
            current = Some(next.ok_or_else(|| AccessError::NotFound {
                selector: selector_str.clone(),
            })?);
        }
        current.ok_or_else(|| AccessError::NotFound {
            selector: String::new(),
        })
    }

    /// Run `f` against the resolved element. The parsed document lives only
    /// for the duration of the closure; no await happens while it exists.
    async fn with_element<R>(
        &self,
        handle: &ElementHandle,
        f: impl for<'a> FnOnce(ElementRef<'a>) -> Result<R, AccessError>,
    ) -> Result<R, AccessError> {
        let id = Self::decode(handle)?;
        let state = self.state.lock().await;
        let registered = state.handles.get(&id).ok_or_else(|| AccessError::stale(handle))?;
        if registered.generation != state.generation {
            return Err(AccessError::stale(handle));
        }
        let html = Html::parse_document(&state.markup);
        let element = Self::resolve(&html, &registered.steps)?;
        f(element)
    }

    async fn present(&self, selector: &str) -> Result<bool, AccessError> {
        let compiled = Self::parse_selector(selector)?;
        let state = self.state.lock().await;
        let html = Html::parse_document(&state.markup);
        Ok(html.select(&compiled).next().is_some())
    }

    fn visible(element: ElementRef<'_>) -> bool {
        if element.value().attr("hidden").is_some() {
            return false;
        }
        match element.value().attr("style") {
            Some(style) => {
                let compact: String = style.chars().filter(|c| !c.is_whitespace()).collect();
                !compact.contains("display:none") && !compact.contains("visibility:hidden")
            }
            None => true,
        }
    }
}

#[async_trait]
impl DocumentAccess for StaticDocumentAccess {
    async fn navigate(
        &self,
        url: &str,
        ready_selector: &str,
        timeout: Duration,
    ) -> Result<(), AccessError> {
        let markup = self.fetch_markup(url).await?;
        let base = Url::parse(url)
            .map_err(|e| AccessError::Backend(anyhow!("invalid URL '{url}': {e}")))?;
        self.install_document(markup, Some(base)).await;
        self.wait_for(ready_selector, timeout).await
    }

    async fn query(&self, selector: &str) -> Result<Vec<ElementHandle>, AccessError> {
        let compiled = Self::parse_selector(selector)?;
        let mut state = self.state.lock().await;
        let count = {
            let html = Html::parse_document(&state.markup);
            html.select(&compiled).count()
        };

        let generation = state.generation;
        let mut handles = Vec::with_capacity(count);
        for index in 0..count {
            let id = state.next_handle_id;
            state.next_handle_id += 1;
            state.handles.insert(
                id,
                RegisteredHandle {
                    generation,
                    steps: vec![(selector.to_string(), index)],
                },
            );
            handles.push(ElementHandle::new(id.to_string()));
        }
        Ok(handles)
    }

    async fn query_within(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, AccessError> {
        let compiled = Self::parse_selector(selector)?;
        let scope_id = Self::decode(scope)?;
        let mut state = self.state.lock().await;

        let (scope_steps, count) = {
            let registered = state
                .handles
                .get(&scope_id)
                .ok_or_else(|| AccessError::stale(scope))?;
            if registered.generation != state.generation {
                return Err(AccessError::stale(scope));
            }
            let html = Html::parse_document(&state.markup);
            let scope_element = Self::resolve(&html, &registered.steps)?;
            (registered.steps.clone(), scope_element.select(&compiled).count())
        };

        let generation = state.generation;
        let mut handles = Vec::with_capacity(count);
        for index in 0..count {
            let id = state.next_handle_id;
            state.next_handle_id += 1;
            let mut steps = scope_steps.clone();
            steps.push((selector.to_string(), index));
            state.handles.insert(id, RegisteredHandle { generation, steps });
            handles.push(ElementHandle::new(id.to_string()));
        }
        Ok(handles)
    }

    async fn text(&self, element: &ElementHandle) -> Result<String, AccessError> {
        self.with_element(element, |el| {
            Ok(el.text().collect::<String>().trim().to_string())
        })
        .await
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, AccessError> {
        let name = name.to_string();
        self.with_element(element, move |el| {
            Ok(el.value().attr(&name).map(str::to_string))
        })
        .await
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), AccessError> {
        let (href, base) = {
            let id = Self::decode(element)?;
            let state = self.state.lock().await;
            let registered = state.handles.get(&id).ok_or_else(|| AccessError::stale(element))?;
            if registered.generation != state.generation {
                return Err(AccessError::stale(element));
            }
            let html = Html::parse_document(&state.markup);
            let el = Self::resolve(&html, &registered.steps)?;
            let href = el
                .value()
                .attr("href")
                .map(str::to_string)
                .ok_or_else(|| AccessError::unsupported("click on element without href"))?;
            (href, state.base.clone())
        };

        if href == "#" || href.starts_with("javascript:") {
            return Err(AccessError::unsupported("click on script-driven control"));
        }

        let target = match base {
            Some(base_url) => base_url
                .join(&href)
                .map_err(|e| AccessError::Backend(anyhow!("cannot resolve '{href}': {e}")))?,
            None => Url::parse(&href)
                .map_err(|_| AccessError::unsupported("relative link without a base URL"))?,
        };

        debug!("following link: {}", target);
        let markup = self.fetch_markup(target.as_str()).await?;
        self.install_document(markup, Some(target)).await;
        Ok(())
    }

    async fn is_visible(&self, element: &ElementHandle) -> Result<bool, AccessError> {
        self.with_element(element, |el| Ok(Self::visible(el))).await
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), AccessError> {
        let started = tokio::time::Instant::now();
        loop {
            if self.present(selector).await? {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(AccessError::Timeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            sleep(POLL_INTERVAL.min(timeout)).await;
        }
    }

    async fn position_path(&self, element: &ElementHandle) -> Result<Vec<usize>, AccessError> {
        self.with_element(element, |el| {
            let mut path = Vec::new();
            let mut node = *el;
            loop {
                if node.value().is_element() {
                    let index = node
                        .prev_siblings()
                        .filter(|sibling| sibling.value().is_element())
                        .count();
                    path.push(index);
                }
                match node.parent() {
                    Some(parent) => node = parent,
                    None => break,
                }
            }
            path.reverse();
            Ok(path)
        })
        .await
    }

    async fn pause(&self, duration: Duration) {
        sleep(duration).await;
    }

    async fn suppress_resources(&self, kinds: &[ResourceKind]) -> Result<(), AccessError> {
        // A static fetcher never loads sub-resources; record the hint so
        // callers can assert the policy was accepted.
        let mut state = self.state.lock().await;
        state.suppressed = kinds.to_vec();
        debug!("sub-resource suppression noted: {:?}", kinds);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <html><body>
        <table id="tenderResults"><tbody>
            <tr><td><a href="/detail/1">EXP-1</a></td><td>Works</td></tr>
            <tr><td><a href="/detail/2">EXP-2</a></td><td style="display: none">Hidden</td></tr>
        </tbody></table>
        <ul><li><span class="mark">alpha</span></li><li><span class="mark">beta</span></li></ul>
        </body></html>
    "#;

    #[tokio::test]
    async fn query_returns_handles_in_document_order() {
        let access = StaticDocumentAccess::from_markup(SAMPLE).unwrap();
        let rows = access.query("table#tenderResults tbody tr").await.unwrap();
        assert_eq!(rows.len(), 2);

        let links = access.query_within(&rows[0], "td a").await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(access.text(&links[0]).await.unwrap(), "EXP-1");
        assert_eq!(
            access.attribute(&links[0], "href").await.unwrap(),
            Some("/detail/1".to_string())
        );
    }

    #[tokio::test]
    async fn missing_matches_are_empty_not_errors() {
        let access = StaticDocumentAccess::from_markup(SAMPLE).unwrap();
        let rows = access.query("table#tenderResults tbody tr").await.unwrap();
        let none = access.query_within(&rows[0], "div.absent").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn style_hidden_elements_are_invisible() {
        let access = StaticDocumentAccess::from_markup(SAMPLE).unwrap();
        let cells = access.query("td").await.unwrap();
        assert!(access.is_visible(&cells[0]).await.unwrap());
        assert!(!access.is_visible(&cells[3]).await.unwrap());
    }

    #[tokio::test]
    async fn position_path_orders_siblings() {
        let access = StaticDocumentAccess::from_markup(SAMPLE).unwrap();
        let marks = access.query("span.mark").await.unwrap();
        let first = access.position_path(&marks[0]).await.unwrap();
        let second = access.position_path(&marks[1]).await.unwrap();
        // same parent chain, differing only in the <li> sibling index
        assert_eq!(first.len(), second.len());
        assert_eq!(first[first.len() - 2] + 1, second[second.len() - 2]);
    }

    #[tokio::test]
    async fn handles_go_stale_after_document_replacement() {
        let access = StaticDocumentAccess::from_markup(SAMPLE).unwrap();
        let rows = access.query("table#tenderResults tbody tr").await.unwrap();
        access.load_markup("<html><body></body></html>", None).await.unwrap();
        let result = access.text(&rows[0]).await;
        assert!(matches!(result, Err(AccessError::Stale { .. })));
    }

    #[tokio::test]
    async fn invalid_selector_is_reported() {
        let access = StaticDocumentAccess::from_markup(SAMPLE).unwrap();
        let result = access.query("td[[").await;
        assert!(matches!(result, Err(AccessError::InvalidSelector { .. })));
    }

    #[tokio::test]
    async fn click_without_href_is_unsupported() {
        let access = StaticDocumentAccess::from_markup(SAMPLE).unwrap();
        let cells = access.query("td").await.unwrap();
        let result = access.click(&cells[1]).await;
        assert!(matches!(result, Err(AccessError::Unsupported { .. })));
    }

    #[tokio::test]
    async fn resource_suppression_hint_is_recorded() {
        let access = StaticDocumentAccess::from_markup(SAMPLE).unwrap();
        access
            .suppress_resources(&[ResourceKind::Image, ResourceKind::Font])
            .await
            .unwrap();
        assert_eq!(
            access.suppressed_resources().await,
            vec![ResourceKind::Image, ResourceKind::Font]
        );
    }

    #[tokio::test]
    async fn wait_for_times_out_on_absent_selector() {
        let access = StaticDocumentAccess::from_markup(SAMPLE).unwrap();
        let result = access
            .wait_for("div.never-there", Duration::from_millis(120))
            .await;
        assert!(matches!(result, Err(AccessError::Timeout { .. })));
    }
}
