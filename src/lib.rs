//! Jikiu-Enrich: a parts-catalog enrichment crawler
//!
//! This crate takes a batch of spare-parts records, looks each one up in the
//! Jikiu online catalogue, and merges the extracted specifications and
//! cross-references back into an ordered report: one output row per input
//! row regardless of how individual lookups fare.

pub mod config;
pub mod crawler;
pub mod record;
pub mod report;
pub mod state;

use thiserror::Error;

/// Main error type for Jikiu-Enrich operations
#[derive(Debug, Error)]
pub enum JikiuError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Batch cannot start from state {0:?}")]
    BatchNotIdle(state::BatchState),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Jikiu-Enrich operations
pub type Result<T> = std::result::Result<T, JikiuError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use record::{CrawlResult, CrossReference, InputRecord};
pub use state::{BatchState, ProgressState};
