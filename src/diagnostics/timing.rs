use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Wall-clock time spent in one phase of a segmentation pass.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

/// Per-phase timings of a segmentation pass.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    /// Record the time elapsed since `start` under `label`.
    pub fn push_since(&mut self, label: impl Into<String>, start: Instant) {
        self.stages.push(StageTiming {
            label: label.into(),
            elapsed_ms: elapsed_ms(start),
        });
    }

    /// Close the breakdown with the total time elapsed since `start`.
    pub fn finish(&mut self, start: Instant) {
        self.total_ms = elapsed_ms(start);
    }

    pub fn stage(&self, label: &str) -> Option<f64> {
        self.stages
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.elapsed_ms)
    }
}

pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
