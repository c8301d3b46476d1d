//! Tabular input loader
//!
//! Reads the parts list CSV and maps each row to an `InputRecord`.
//! Header resolution tolerates the spelling variations found across
//! revisions of the source spreadsheet (see `InputRecord::from_row`).

use crate::record::{InputRecord, Row};
use crate::report::csv::parse_rows;
use crate::JikiuError;
use std::path::Path;

/// Loads input records from a CSV file.
///
/// The first row is the header. Rows shorter than the header are padded
/// with empty cells; rows with an empty item code are kept, since they
/// still produce a report row.
pub fn load_records(path: &Path) -> Result<Vec<InputRecord>, JikiuError> {
    let text = std::fs::read_to_string(path)?;
    let mut rows = parse_rows(&text).into_iter();

    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(|h| h.trim().to_string()).collect(),
        None => {
            return Err(JikiuError::Input(format!(
                "input file {} is empty",
                path.display()
            )))
        }
    };

    let records = rows
        .map(|cells| {
            let row: Row = headers
                .iter()
                .cloned()
                .zip(cells.into_iter().chain(std::iter::repeat(String::new())))
                .collect();
            InputRecord::from_row(&row)
        })
        .collect();

    Ok(records)
}
