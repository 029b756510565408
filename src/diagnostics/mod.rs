//! Diagnostics returned alongside every segmentation pass.
//!
//! A [`RunReport`] records what the pass did: how the pixels were sampled,
//! one [`AttemptReport`] per discovery attempt, how many pixels the merge
//! phase resolved, every [`Anomaly`] raised on the way, and phase timings.
//! All types serialize to camelCase JSON for the demo tooling.

mod report;
pub mod timing;

pub use report::{Anomaly, AttemptReport, InputDescriptor, RunReport};
pub use timing::{StageTiming, TimingBreakdown};
