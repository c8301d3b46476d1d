//! Input and report adapters
//!
//! The mechanical I/O around the pipeline: loading the parts list,
//! writing the report CSV, and the completion summary.

pub mod csv;

mod exporter;
mod loader;
mod stats;

pub use exporter::{export_csv, render_crosses};
pub use loader::load_records;
pub use stats::{print_summary, BatchStatistics};
