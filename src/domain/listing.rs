//! Listing records extracted from procurement notice result tables

use serde::{Deserialize, Serialize};

/// File reference column of a notice row: the expedient identifier plus its
/// descriptive text and detail link
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReference {
    pub id: String,
    pub description: String,
    pub is_electronic_bid: bool,
    pub link: String,
}

/// Contract classification as rendered in the listing (type plus subtype)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractType {
    #[serde(rename = "type")]
    pub kind: String,
    pub subtype: String,
}

/// Contracting body column: organisation name and its profile link
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractingBody {
    pub name: String,
    pub link: String,
}

/// One procurement notice assembled from one result-table row.
///
/// Every field carries a defined default; a record is never partially
/// constructed. Rows that cannot be read structurally are skipped by the
/// harvester instead of producing a half-filled record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    pub file_reference: FileReference,
    pub contract_type: ContractType,
    pub status: String,
    /// Tender amount; 0.0 when the rendered cell could not be parsed
    pub amount: f64,
    /// Canonical `%Y-%m-%d` date, or the raw cell text when unparseable
    pub due_date: String,
    pub contracting_body: ContractingBody,
}
