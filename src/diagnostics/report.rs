use crate::diagnostics::TimingBreakdown;
use crate::iteration::ConvergenceStatus;
use crate::types::SegmentationMode;
use serde::Serialize;

/// Recoverable condition raised during a pass.
///
/// Anomalies never abort the pass; they are logged, forwarded to the
/// observer, and kept in the report.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Anomaly {
    /// An attempt stopped without reaching the requested precision; its
    /// working set was extracted on the atomic path.
    #[serde(rename_all = "camelCase")]
    NonConvergence {
        attempt: usize,
        rounds: usize,
        /// Step distance of the last completed round, if any.
        last_distance: Option<f64>,
        status: ConvergenceStatus,
    },
    /// Pending pixels had no qualifying segment to join and were gathered
    /// into a catch-all segment.
    #[serde(rename_all = "camelCase")]
    EmptyMergeTarget { pending: usize },
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub width: usize,
    pub height: usize,
    pub grayscale: bool,
}

/// One discovery attempt: iterate, extract, extrapolate.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptReport {
    pub index: usize,
    pub nodes: usize,
    pub rounds: usize,
    pub status: ConvergenceStatus,
    pub atomic: bool,
    /// Internal nodes that made it into the segment.
    pub discovered: usize,
    /// External pixels claimed by extrapolation.
    pub extrapolated: usize,
    /// Whether the segment reached the minimal size.
    pub qualifies: bool,
    pub elapsed_ms: f64,
}

impl AttemptReport {
    pub fn segment_size(&self) -> usize {
        self.discovered + self.extrapolated
    }
}

/// Full trace of one segmentation pass.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub mode: SegmentationMode,
    pub input: InputDescriptor,
    pub internal_nodes: usize,
    pub external_pixels: usize,
    /// Sampling drew no internal node and every pixel entered the graph.
    pub sampling_fell_back: bool,
    pub attempts: Vec<AttemptReport>,
    /// Pixels in qualifying segments when discovery stopped.
    pub segmented_before_merge: usize,
    pub pending_pixels: usize,
    pub merged_pixels: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catch_all_size: Option<usize>,
    pub anomalies: Vec<Anomaly>,
    pub timings: TimingBreakdown,
}

impl RunReport {
    pub(crate) fn new(mode: SegmentationMode, input: InputDescriptor) -> Self {
        Self {
            mode,
            input,
            internal_nodes: 0,
            external_pixels: 0,
            sampling_fell_back: false,
            attempts: Vec::new(),
            segmented_before_merge: 0,
            pending_pixels: 0,
            merged_pixels: 0,
            catch_all_size: None,
            anomalies: Vec::new(),
            timings: TimingBreakdown::default(),
        }
    }

    pub fn atomic_attempts(&self) -> usize {
        self.attempts.iter().filter(|a| a.atomic).count()
    }
}
