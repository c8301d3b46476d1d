//! Document extractor for catalogue part pages
//!
//! Turns a fetched page into structured specification and cross-reference
//! data. Pure function of its input: no I/O, no shared state, and never a
//! hard failure. Anything the page does not provide degrades to "not
//! found" or an empty collection.

use crate::crawler::fetcher::RawDocument;
use crate::record::CrossReference;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

/// Phrases the catalogue renders on an empty search result page.
const NOT_FOUND_MARKERS: [&str; 2] = ["no results", "not found"];

/// Structured data extracted from one part page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Whether the searched part itself is present on the page.
    pub found: bool,
    /// Specification label/value pairs; duplicate labels keep the last
    /// value seen.
    pub specifications: HashMap<String, String>,
    /// Cross-references in document order.
    pub crosses: Vec<CrossReference>,
    /// URL the document was fetched from.
    pub source_url: String,
}

impl ExtractionResult {
    fn not_found(source_url: &str) -> Self {
        Self {
            found: false,
            specifications: HashMap::new(),
            crosses: Vec::new(),
            source_url: source_url.to_string(),
        }
    }
}

/// Extracts specifications and cross-references from a fetched page.
///
/// `found` is true only when the part heading is present and the page
/// does not carry a no-results marker. Missing specification or cross
/// sections yield empty collections rather than failures.
pub fn extract(doc: &RawDocument) -> ExtractionResult {
    let lowered = doc.body.to_lowercase();
    if NOT_FOUND_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return ExtractionResult::not_found(&doc.source_url);
    }

    let document = Html::parse_document(&doc.body);

    if !has_part_heading(&document) {
        return ExtractionResult::not_found(&doc.source_url);
    }

    ExtractionResult {
        found: true,
        specifications: extract_specifications(&document),
        crosses: extract_crosses(&document),
        source_url: doc.source_url.clone(),
    }
}

/// Whether the page carries the searched part's heading element.
fn has_part_heading(document: &Html) -> bool {
    match Selector::parse(".part-number, .part-detail") {
        Ok(selector) => document.select(&selector).next().is_some(),
        Err(_) => false,
    }
}

/// Collects specification label/value pairs.
///
/// Two markup shapes are in the wild: `.specification-item` blocks with
/// `.label`/`.value` children, and table rows inside a `.specification`
/// section with `th` labels and `td` values.
fn extract_specifications(document: &Html) -> HashMap<String, String> {
    let mut specs = HashMap::new();

    if let Ok(item_selector) = Selector::parse(".specification-item") {
        let label_selector = Selector::parse(".label").ok();
        let value_selector = Selector::parse(".value").ok();

        if let (Some(label_selector), Some(value_selector)) = (label_selector, value_selector) {
            for item in document.select(&item_selector) {
                let label = item.select(&label_selector).next().map(element_text);
                let value = item.select(&value_selector).next().map(element_text);
                insert_spec(&mut specs, label, value);
            }
        }
    }

    if let Ok(row_selector) = Selector::parse(".specification tr") {
        let th_selector = Selector::parse("th").ok();
        let td_selector = Selector::parse("td").ok();

        if let (Some(th_selector), Some(td_selector)) = (th_selector, td_selector) {
            for row in document.select(&row_selector) {
                let label = row.select(&th_selector).next().map(element_text);
                let value = row.select(&td_selector).next().map(element_text);
                insert_spec(&mut specs, label, value);
            }
        }
    }

    specs
}

/// Inserts a label/value pair if both are non-empty after cleanup.
fn insert_spec(
    specs: &mut HashMap<String, String>,
    label: Option<String>,
    value: Option<String>,
) {
    if let (Some(label), Some(value)) = (label, value) {
        let label = label.trim_end_matches(':').trim().to_string();
        if !label.is_empty() && !value.is_empty() {
            specs.insert(label, value);
        }
    }
}

/// Collects cross-reference rows in document order.
///
/// Rows come from a `.crosses-table` or a table inside a `.crosses`
/// section; the first cell is the owner, the second the number. Header
/// rows have no `td` cells and fall out naturally.
fn extract_crosses(document: &Html) -> Vec<CrossReference> {
    let mut crosses = Vec::new();

    let row_selector = match Selector::parse(".crosses-table tr, .crosses table tr") {
        Ok(selector) => selector,
        Err(_) => return crosses,
    };
    let td_selector = match Selector::parse("td") {
        Ok(selector) => selector,
        Err(_) => return crosses,
    };

    for row in document.select(&row_selector) {
        let mut cells = row.select(&td_selector);
        let owner = cells.next().map(element_text).unwrap_or_default();
        let number = cells.next().map(element_text).unwrap_or_default();

        if !owner.is_empty() && !number.is_empty() {
            crosses.push(CrossReference { owner, number });
        }
    }

    crosses
}

/// Concatenated, trimmed text content of an element.
fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
