//! Paginated listing harvester
//!
//! Drives the notice listing page by page: ready the view (with retries),
//! extract every row, probe the next-page control, repeat until the control
//! disappears or is disabled. Row-level failures are skipped and logged;
//! readiness failures after the retry budget abort the whole harvest.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::application::error::{HarvestError, HarvestResult};
use crate::application::extractor::RecordExtractor;
use crate::domain::listing::ListingRecord;
use crate::infrastructure::access::{AccessError, DocumentAccess, ElementHandle};
use crate::infrastructure::config::HarvestConfig;
use crate::infrastructure::retry::run_with_retry;

/// Accumulator threaded through the pagination loop; lives only for one
/// `harvest` call
struct HarvestState {
    page: u32,
    records: Vec<ListingRecord>,
}

pub struct ListingHarvester {
    config: HarvestConfig,
    extractor: RecordExtractor,
}

impl ListingHarvester {
    pub fn new(config: HarvestConfig) -> Self {
        let extractor = RecordExtractor::new(&config);
        Self { config, extractor }
    }

    /// Harvest every page reachable from the current view, in page order.
    ///
    /// Not restartable mid-stream: each call traverses afresh from the page
    /// the view is on. The caller owns persistence of the returned records.
    pub async fn harvest(&self, access: &dyn DocumentAccess) -> HarvestResult<Vec<ListingRecord>> {
        info!("🗂 starting listing harvest");
        self.ensure_ready(access).await?;

        let table_timeout = Duration::from_millis(self.config.paging.table_timeout_ms);
        let settle = Duration::from_millis(self.config.paging.settle_ms);
        let mut state = HarvestState {
            page: 1,
            records: Vec::new(),
        };

        loop {
            let page_records = self.extract_page(access, state.page).await?;
            state.records.extend(page_records);

            let Some(control) = self.next_page_control(access).await? else {
                debug!("no active next-page control, pagination exhausted");
                break;
            };

            if let Some(cap) = self.config.paging.max_pages {
                if state.page >= cap {
                    warn!(
                        "⚠ page cap {} reached with the next control still active, stopping",
                        cap
                    );
                    break;
                }
            }

            access.click(&control).await?;
            access.pause(settle).await;
            access
                .wait_for(&self.config.selectors.listing.results_table, table_timeout)
                .await?;
            state.page += 1;
        }

        info!(
            "✅ harvest complete: {} records across {} page(s)",
            state.records.len(),
            state.page
        );
        Ok(state.records)
    }

    /// Submit the search form (when configured) and wait for the results
    /// table, retrying the whole readiness sequence on failure
    async fn ensure_ready(&self, access: &dyn DocumentAccess) -> HarvestResult<()> {
        let attempts = self.config.retry.max_attempts;
        let base_delay = Duration::from_millis(self.config.retry.base_delay_ms);
        let table_timeout = Duration::from_millis(self.config.paging.table_timeout_ms);
        let selectors = &self.config.selectors.listing;

        // move || async move: the retried future must own its (Copy) captures
        run_with_retry(attempts, base_delay, move || async move {
            if !selectors.search_submit.is_empty() {
                if let Some(submit) = access
                    .query(&selectors.search_submit)
                    .await?
                    .into_iter()
                    .next()
                {
                    access.click(&submit).await?;
                }
            }
            access.wait_for(&selectors.results_table, table_timeout).await
        })
        .await
        .map_err(|source| HarvestError::Navigation { attempts, source })
    }

    /// Extract all rows of the current page; failed rows are logged and
    /// dropped, never aborting the page
    async fn extract_page(
        &self,
        access: &dyn DocumentAccess,
        page: u32,
    ) -> HarvestResult<Vec<ListingRecord>> {
        let rows = access.query(&self.config.selectors.listing.row).await?;
        let mut records = Vec::with_capacity(rows.len());

        for (index, row) in rows.iter().enumerate() {
            match self.extractor.extract(access, row, index).await {
                Ok(record) => records.push(record),
                Err(error) if error.is_unit_scoped() => {
                    warn!("skipping row on page {}: {}", page, error);
                }
                Err(error) => return Err(error),
            }
        }

        info!("📄 page {}: {}/{} rows extracted", page, records.len(), rows.len());
        Ok(records)
    }

    /// The first next-page candidate that is not disabled, if any
    async fn next_page_control(
        &self,
        access: &dyn DocumentAccess,
    ) -> Result<Option<ElementHandle>, AccessError> {
        let candidates = access.query(&self.config.selectors.listing.next_page).await?;
        for control in candidates {
            if !self.is_disabled(access, &control).await? {
                return Ok(Some(control));
            }
        }
        Ok(None)
    }

    async fn is_disabled(
        &self,
        access: &dyn DocumentAccess,
        control: &ElementHandle,
    ) -> Result<bool, AccessError> {
        if access.attribute(control, "disabled").await?.is_some() {
            return Ok(true);
        }
        if let Some(class) = access.attribute(control, "class").await? {
            if class.split_whitespace().any(|c| c.contains("disabled")) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
