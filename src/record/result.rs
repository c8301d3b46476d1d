use crate::record::InputRecord;

/// An equivalent part number under another brand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossReference {
    pub owner: String,
    pub number: String,
}

/// The final output unit: one per input record, in input order.
///
/// A failed or skipped lookup is indistinguishable from a genuine
/// catalogue miss: `found_in_jikiu` is false and the specification and
/// cross fields are empty. `jikiu_url` is always populated with the
/// search URL so a human can verify by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlResult {
    /// The input record this result was produced for, copied unchanged.
    pub record: InputRecord,

    pub found_in_jikiu: bool,
    pub jikiu_part_number: String,
    pub jikiu_url: String,

    // Flattened specification fields
    pub cone_pitch: String,
    pub cone_size_mm: String,
    pub thread_size: String,
    pub overall_height_mm: String,
    pub diameter_mm: String,
    pub mounting_height_mm: String,
    pub location: String,
    pub position: String,

    pub crosses: Vec<CrossReference>,
}
