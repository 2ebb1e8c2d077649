//! Pure field normalizers for rendered cell content
//!
//! Every function here is total over arbitrary input: malformed content
//! degrades to a documented default instead of failing the row or node that
//! carried it.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LABEL_RE: Regex = Regex::new(r"^\s*(\d{8})\s*-\s*(.*)$").unwrap();
}

/// Parse a rendered currency cell into a plain number.
///
/// Strips every character that is not an ASCII digit or a comma, then
/// substitutes the decimal comma with a dot. Thousands separators are
/// therefore stripped together with the currency symbol: `"1.234,56 EUR"`
/// parses as 1234.56, and an amount rendered with a comma thousands
/// separator ("1,234,56") does not parse at all and yields 0.0. That
/// conflation is the portal's observed rendering contract, kept as-is
/// until a domain owner rules otherwise.
pub fn parse_amount(text: &str) -> f64 {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .collect();
    kept.replace(',', ".").parse::<f64>().unwrap_or(0.0)
}

/// Parse a localized date into `output_pattern` form.
///
/// Returns the input unchanged when it does not match `source_pattern`, so a
/// malformed date never aborts an extraction.
pub fn parse_date(text: &str, source_pattern: &str, output_pattern: &str) -> String {
    match NaiveDate::parse_from_str(text.trim(), source_pattern) {
        Ok(date) => date.format(output_pattern).to_string(),
        Err(_) => text.to_string(),
    }
}

/// Split a taxonomy label of the form `"<8-digit-code>-<description>"`.
///
/// When the leading code is absent the code comes back empty and the whole
/// trimmed label becomes the description.
pub fn parse_label(text: &str) -> (String, String) {
    match LABEL_RE.captures(text) {
        Some(caps) => (caps[1].to_string(), caps[2].trim().to_string()),
        None => (String::new(), text.trim().to_string()),
    }
}

/// Normalize a rendered presence flag into a boolean.
///
/// Empty text and the usual negative markers read as `false`; any other
/// non-empty text reads as `true`.
pub fn parse_flag(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    !matches!(
        trimmed.to_lowercase().as_str(),
        "no" | "false" | "0" | "-"
    )
}
