//! Batch summary statistics
//!
//! Found/not-found counts over a finished batch, printed in the banner
//! style the report consumers are used to.

use crate::record::CrawlResult;
use crate::state::BatchState;

/// Summary of one batch run.
#[derive(Debug, Clone)]
pub struct BatchStatistics {
    pub total: usize,
    pub found: usize,
    pub not_found: usize,
    pub state: BatchState,
}

impl BatchStatistics {
    /// Computes statistics over the delivered results.
    pub fn from_results(results: &[CrawlResult], state: BatchState) -> Self {
        let found = results.iter().filter(|r| r.found_in_jikiu).count();
        Self {
            total: results.len(),
            found,
            not_found: results.len() - found,
            state,
        }
    }

    /// Percentage of delivered results that matched, 0.0 for an empty run.
    pub fn success_rate(&self) -> f64 {
        if self.total > 0 {
            self.found as f64 / self.total as f64 * 100.0
        } else {
            0.0
        }
    }
}

/// Prints the completion banner to stdout.
pub fn print_summary(stats: &BatchStatistics) {
    println!();
    println!("{}", "=".repeat(50));
    match stats.state {
        BatchState::Cancelled => println!("CRAWLING CANCELLED"),
        _ => println!("CRAWLING COMPLETED!"),
    }
    println!("{}", "=".repeat(50));
    println!("Total Items: {}", stats.total);
    println!("Found in Jikiu: {}", stats.found);
    println!("Not Found: {}", stats.not_found);
    println!("Success Rate: {:.1}%", stats.success_rate());
    println!(
        "Finished at: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
}
