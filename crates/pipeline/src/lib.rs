//! Batch orchestration: one synchronous recompute pass from raw feed rows to
//! a complete dashboard snapshot, with cooperative cancellation between
//! stages.

pub mod cancel;
pub mod logging;
pub mod runner;
pub mod snapshot;

pub use cancel::CancellationToken;
pub use runner::{Pipeline, PipelineInput};
pub use snapshot::DashboardSnapshot;
