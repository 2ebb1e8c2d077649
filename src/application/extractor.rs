//! Record extraction: one result-table row into one `ListingRecord`
//!
//! Every sub-field is read independently and defensively. A cell that is
//! missing or empty yields the field's default; only a structural failure
//! of the row itself (its scope no longer resolves) surfaces as
//! `RowExtraction`, which the harvester logs and skips.

use crate::application::error::{HarvestError, HarvestResult};
use crate::domain::listing::{ContractType, ContractingBody, FileReference, ListingRecord};
use crate::infrastructure::access::{AccessError, DocumentAccess, ElementHandle};
use crate::infrastructure::config::{FormatConfig, HarvestConfig, ListingSelectors};
use crate::infrastructure::normalize::{parse_amount, parse_date, parse_flag};

/// Assembles listing records from row elements, driven by the configured
/// selector table
pub struct RecordExtractor {
    selectors: ListingSelectors,
    formats: FormatConfig,
}

impl RecordExtractor {
    pub fn new(config: &HarvestConfig) -> Self {
        Self {
            selectors: config.selectors.listing.clone(),
            formats: config.formats.clone(),
        }
    }

    /// Extract one record from `row`. Never returns a partial record: the
    /// result is either complete (with defaults for absent cells) or a
    /// `RowExtraction` error.
    pub async fn extract(
        &self,
        access: &dyn DocumentAccess,
        row: &ElementHandle,
        row_index: usize,
    ) -> HarvestResult<ListingRecord> {
        self.extract_inner(access, row)
            .await
            .map_err(|e| HarvestError::row(row_index, &e))
    }

    async fn extract_inner(
        &self,
        access: &dyn DocumentAccess,
        row: &ElementHandle,
    ) -> Result<ListingRecord, AccessError> {
        let (file_id, file_link) = self
            .linked_text(access, row, &self.selectors.file_ref_link)
            .await?;
        let description = self
            .field_text(access, row, &self.selectors.file_ref_description)
            .await?
            .unwrap_or_default();
        let is_electronic_bid = self.presence_flag(access, row).await?;

        let kind = self
            .field_text(access, row, &self.selectors.contract_type)
            .await?
            .unwrap_or_default();
        let subtype = self
            .field_text(access, row, &self.selectors.contract_subtype)
            .await?
            .unwrap_or_default();

        let status = self
            .field_text(access, row, &self.selectors.status)
            .await?
            .unwrap_or_default();

        let amount = parse_amount(
            &self
                .field_text(access, row, &self.selectors.amount)
                .await?
                .unwrap_or_default(),
        );

        let due_date = match self.field_text(access, row, &self.selectors.due_date).await? {
            Some(raw) => parse_date(&raw, &self.formats.due_date_input, &self.formats.due_date_output),
            None => String::new(),
        };

        let (body_name, body_link) = self
            .linked_text(access, row, &self.selectors.body_link)
            .await?;

        Ok(ListingRecord {
            file_reference: FileReference {
                id: file_id,
                description,
                is_electronic_bid,
                link: file_link,
            },
            contract_type: ContractType { kind, subtype },
            status,
            amount,
            due_date,
            contracting_body: ContractingBody {
                name: body_name,
                link: body_link,
            },
        })
    }

    /// First element matching `selector` inside `scope`, if any. An empty
    /// selector means the field is not configured and reads as absent.
    async fn first_within(
        &self,
        access: &dyn DocumentAccess,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Option<ElementHandle>, AccessError> {
        if selector.is_empty() {
            return Ok(None);
        }
        Ok(access
            .query_within(scope, selector)
            .await?
            .into_iter()
            .next())
    }

    async fn field_text(
        &self,
        access: &dyn DocumentAccess,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Option<String>, AccessError> {
        match self.first_within(access, scope, selector).await? {
            Some(element) => {
                let text = access.text(&element).await?;
                let trimmed = text.trim().to_string();
                Ok(if trimmed.is_empty() { None } else { Some(trimmed) })
            }
            None => Ok(None),
        }
    }

    /// Text plus `href` of a link cell; both default to empty
    async fn linked_text(
        &self,
        access: &dyn DocumentAccess,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<(String, String), AccessError> {
        match self.first_within(access, scope, selector).await? {
            Some(element) => {
                let text = access.text(&element).await?.trim().to_string();
                let href = access.attribute(&element, "href").await?.unwrap_or_default();
                Ok((text, href))
            }
            None => Ok((String::new(), String::new())),
        }
    }

    /// Electronic-bid marker: a present marker with no text counts as set;
    /// textual markers go through flag normalization.
    async fn presence_flag(
        &self,
        access: &dyn DocumentAccess,
        scope: &ElementHandle,
    ) -> Result<bool, AccessError> {
        match self
            .first_within(access, scope, &self.selectors.electronic_bid_marker)
            .await?
        {
            Some(element) => {
                let text = access.text(&element).await?;
                Ok(if text.trim().is_empty() { true } else { parse_flag(&text) })
            }
            None => Ok(false),
        }
    }
}
