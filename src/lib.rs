#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod controller;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod types;

// Pipeline stages. Public so tools can drive a single stage, but the
// controller is the supported entry point.
pub mod affinity;
pub mod extraction;
pub mod extrapolation;
pub mod iteration;
pub mod merge;
pub mod pool;
pub mod sampling;

pub mod config;

// --- High-level re-exports -------------------------------------------------

// Main entry points: controller + results.
pub use crate::controller::{
    LogObserver, SegmentationController, SegmentationObserver, SegmentationParams,
    SegmentationResult,
};
pub use crate::error::{InvalidState, Result, SegmentationError};
pub use crate::types::{Pixel, Segment, SegmentationMode, SubProcess, WeightedSegment};

// Per-pass diagnostics returned with every result.
pub use crate::diagnostics::{Anomaly, RunReport};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use dominant_segments::prelude::*;
///
/// # fn main() -> Result<(), SegmentationError> {
/// let image = ColorImage::from_fn(32, 32, |x, _| {
///     if x < 16 {
///         [200, 30, 30]
///     } else {
///         [30, 30, 200]
///     }
/// });
///
/// let controller = SegmentationController::new(LogObserver);
/// controller.open_image(image)?;
///
/// let params = SegmentationParams {
///     minimal_segment_size: 8,
///     ..Default::default()
/// };
/// for result in controller.segment(SegmentationMode::Quick, &params)? {
///     println!("{}: {} segments", result.mode, result.segments.len());
/// }
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::ColorImage;
    pub use crate::{
        LogObserver, SegmentationController, SegmentationError, SegmentationMode,
        SegmentationParams, SegmentationResult,
    };
}
