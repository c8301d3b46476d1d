//! Result aggregation
//!
//! Pure mapping from an input record plus its lookup outcome to the final
//! report row. Also owns construction of the catalogue search URL so the
//! fetcher and the failure path agree on it.

use crate::crawler::extractor::ExtractionResult;
use crate::crawler::fetcher::FetchFailure;
use crate::record::{CrawlResult, InputRecord};
use url::Url;

/// How a record's lookup ended, as seen by the aggregator.
#[derive(Debug)]
pub enum RecordOutcome {
    /// The record had no lookup key; no fetch was attempted.
    Skipped,
    /// The page was fetched and extracted (found or not).
    Extracted(ExtractionResult),
    /// The fetch failed.
    Failed(FetchFailure),
}

/// Builds the catalogue search URL for an item code.
///
/// The item code is percent-encoded into the `part` query parameter.
pub fn build_search_url(base: &Url, item_code: &str) -> Url {
    let mut url = base.clone();

    // Validated config guarantees a base URL with a path; a degenerate
    // base just keeps its original path.
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push("search");
    }
    url.query_pairs_mut().append_pair("part", item_code);
    url
}

/// Merges one input record with its lookup outcome.
///
/// Descriptive input fields are always copied through unchanged and
/// `jikiu_part_number` always carries the input item code. A found part
/// gets its specification fields and crosses populated; anything else
/// produces an empty not-found row whose URL still points at the search
/// page for manual verification.
pub fn merge(record: InputRecord, lookup_url: &str, outcome: RecordOutcome) -> CrawlResult {
    let item_code = record.item_code.clone();

    match outcome {
        RecordOutcome::Extracted(extraction) if extraction.found => {
            let specs = &extraction.specifications;
            CrawlResult {
                record,
                found_in_jikiu: true,
                jikiu_part_number: item_code,
                jikiu_url: extraction.source_url.clone(),
                cone_pitch: spec_field(specs, "Cone Pitch", None),
                cone_size_mm: spec_field(specs, "Cone Size Ø (mm)", Some("Cone Size")),
                thread_size: spec_field(specs, "Thread Size", None),
                overall_height_mm: spec_field(specs, "Overall Height (mm)", Some("Overall Height")),
                diameter_mm: spec_field(specs, "Ø (mm)", Some("Diameter")),
                mounting_height_mm: spec_field(
                    specs,
                    "Mounting Height (mm)",
                    Some("Mounting Height"),
                ),
                location: spec_field(specs, "Location", None),
                position: spec_field(specs, "Position", None),
                crosses: extraction.crosses,
            }
        }

        // Content-level miss, fetch failure, and missing lookup key all
        // report the same way: could not confirm a match.
        RecordOutcome::Extracted(_) | RecordOutcome::Failed(_) | RecordOutcome::Skipped => {
            CrawlResult {
                record,
                found_in_jikiu: false,
                jikiu_part_number: item_code,
                jikiu_url: lookup_url.to_string(),
                ..CrawlResult::default()
            }
        }
    }
}

/// Looks up a specification value by its primary label, then a fallback.
fn spec_field(
    specs: &std::collections::HashMap<String, String>,
    primary: &str,
    fallback: Option<&str>,
) -> String {
    specs
        .get(primary)
        .or_else(|| fallback.and_then(|name| specs.get(name)))
        .cloned()
        .unwrap_or_default()
}
