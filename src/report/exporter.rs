//! Report exporter
//!
//! Writes the final crawl report as CSV, one row per result, with the
//! fixed column set the downstream spreadsheet consumers expect.

use crate::record::{CrawlResult, CrossReference};
use crate::report::csv::format_row;
use crate::JikiuError;
use std::io::Write;
use std::path::Path;

/// Report column headers, in output order.
const HEADERS: [&str; 24] = [
    "Brand",
    "Item Code",
    "Car Maker Name",
    "Car Model Name",
    "Car Chassis Name",
    "Car Engine Desc Name",
    "Car Vehicle Name",
    "Year From",
    "Year To",
    "OEM No.",
    "Part Description",
    "Alias Name",
    "Print Description",
    "Found in Jikiu",
    "Jikiu URL",
    "Cone Pitch",
    "Cone Size (mm)",
    "Thread Size",
    "Overall Height (mm)",
    "Diameter (mm)",
    "Mounting Height (mm)",
    "Location",
    "Position",
    "Crosses",
];

/// Writes the report CSV to the given path.
pub fn export_csv(results: &[CrawlResult], path: &Path) -> Result<(), JikiuError> {
    let mut file = std::fs::File::create(path)?;

    writeln!(file, "{}", format_row(&HEADERS))?;
    for result in results {
        writeln!(file, "{}", format_row(&result_row(result)))?;
    }
    file.flush()?;

    Ok(())
}

/// Renders cross-references as "owner: number" pairs joined by "; ".
pub fn render_crosses(crosses: &[CrossReference]) -> String {
    crosses
        .iter()
        .map(|cross| format!("{}: {}", cross.owner, cross.number))
        .collect::<Vec<_>>()
        .join("; ")
}

fn result_row(result: &CrawlResult) -> Vec<String> {
    let record = &result.record;
    vec![
        record.brand.clone(),
        record.item_code.clone(),
        record.car_maker_name.clone(),
        record.car_model_name.clone(),
        record.car_chassis_name.clone(),
        record.car_engine_desc_name.clone(),
        record.car_vehicle_name.clone(),
        record.year_from.clone(),
        record.year_to.clone(),
        record.oem_no.clone(),
        record.part_description.clone(),
        record.alias_name.clone(),
        record.print_description.clone(),
        if result.found_in_jikiu { "YES" } else { "NO" }.to_string(),
        result.jikiu_url.clone(),
        result.cone_pitch.clone(),
        result.cone_size_mm.clone(),
        result.thread_size.clone(),
        result.overall_height_mm.clone(),
        result.diameter_mm.clone(),
        result.mounting_height_mm.clone(),
        result.location.clone(),
        result.position.clone(),
        render_crosses(&result.crosses),
    ]
}
