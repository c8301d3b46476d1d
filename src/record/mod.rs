//! Batch record types
//!
//! Input records as loaded from the parts list, and the merged crawl
//! results the pipeline produces for them.

mod input;
mod result;

pub use input::{InputRecord, Row};
pub use result::{CrawlResult, CrossReference};
