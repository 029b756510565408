//! Parameters of a segmentation command.
//!
//! The numerical knobs shape the affinity kernel and the discovery loop; the
//! run controls bound how long a single command may take. Every field has a
//! default, so partial JSON configurations deserialize cleanly.

use crate::affinity::AffinitySettings;
use crate::error::{Result, SegmentationError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationParams {
    /// Fraction of the image that qualifying segments must cover before
    /// discovery stops, in `(0, 1]`.
    pub target_coverage_ratio: f64,
    /// Segments smaller than this are dissolved and merged.
    pub minimal_segment_size: usize,
    /// Step distance at which power iteration is considered converged.
    pub convergence_precision: f64,
    /// Probability that a pixel enters the graph in quick mode, in `[0, 1]`.
    pub sampling_probability: f64,
    /// Squared kernel width of the affinity function.
    pub weight_ratio_square: f64,
    /// Compare luma only, even for colour images.
    pub force_grayscale: bool,
    /// Round cap for one discovery attempt.
    pub max_rounds: usize,
    /// Seed of the quick-mode sampler.
    pub seed: u64,
    /// Optional wall-clock budget for one command, in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            target_coverage_ratio: 0.9,
            minimal_segment_size: 50,
            convergence_precision: 0.01,
            sampling_probability: 0.1,
            weight_ratio_square: 0.01,
            force_grayscale: false,
            max_rounds: 1000,
            seed: 24,
            timeout_ms: None,
        }
    }
}

impl SegmentationParams {
    /// Reject out-of-range values before any work starts.
    pub fn validate(&self) -> Result<()> {
        let ratio = self.target_coverage_ratio;
        if !(ratio.is_finite() && ratio > 0.0 && ratio <= 1.0) {
            return Err(SegmentationError::invalid_argument(
                "target_coverage_ratio",
                format!("{ratio} is outside (0, 1]"),
            ));
        }
        let precision = self.convergence_precision;
        if !(precision.is_finite() && precision > 0.0) {
            return Err(SegmentationError::invalid_argument(
                "convergence_precision",
                format!("{precision} must be a positive number"),
            ));
        }
        let p = self.sampling_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(SegmentationError::invalid_argument(
                "sampling_probability",
                format!("{p} is outside [0, 1]"),
            ));
        }
        let wrs = self.weight_ratio_square;
        if !(wrs.is_finite() && wrs > 0.0) {
            return Err(SegmentationError::invalid_argument(
                "weight_ratio_square",
                format!("{wrs} must be a positive number"),
            ));
        }
        if self.max_rounds == 0 {
            return Err(SegmentationError::invalid_argument(
                "max_rounds",
                "at least one round is required",
            ));
        }
        if self.timeout_ms == Some(0) {
            return Err(SegmentationError::invalid_argument(
                "timeout_ms",
                "timeout must be positive when set",
            ));
        }
        Ok(())
    }

    pub fn affinity_settings(&self) -> AffinitySettings {
        AffinitySettings {
            force_grayscale: self.force_grayscale,
            weight_ratio_square: self.weight_ratio_square,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Number of pixels qualifying segments must cover in an image of
    /// `total` pixels.
    pub fn coverage_target(&self, total: usize) -> f64 {
        self.target_coverage_ratio * total as f64
    }
}
