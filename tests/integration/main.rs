//! Integration tests for the crawl pipeline
//!
//! These tests run the full coordinator against a wiremock catalogue
//! server and check ordering, retry, cancellation, and progress behavior
//! end-to-end.

mod crawl_tests;
