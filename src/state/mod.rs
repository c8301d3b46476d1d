//! Batch lifecycle and progress state
//!
//! The batch state machine and the progress counter observers subscribe
//! to. Pipeline logic never reads progress; it only advances it.

mod batch;
mod progress;

pub use batch::BatchState;
pub use progress::{ProgressState, ProgressTracker};
