//! Crawl pipeline for catalogue lookups
//!
//! This module contains the core pipeline, including:
//! - Request rate limiting across workers
//! - HTTP fetching with retry and backoff
//! - Document extraction into structured fields
//! - Per-record aggregation into report rows
//! - Batch coordination, progress, and cancellation

mod aggregator;
mod coordinator;
mod extractor;
mod fetcher;
mod limiter;

pub use aggregator::{build_search_url, merge, RecordOutcome};
pub use coordinator::{run_batch, BatchOutcome, Coordinator};
pub use extractor::{extract, ExtractionResult};
pub use fetcher::{
    build_http_client, FailureKind, FetchFailure, FetchOutcome, Fetcher, RawDocument,
};
pub use limiter::{Cancelled, RateLimiter};
