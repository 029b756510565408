//! Segmentation controller: the `Idle → Running → Idle` state machine.
//!
//! The controller holds the current image and a single in-flight flag. Any
//! `open_image` or `segment` call made while a run is in flight is rejected
//! with [`InvalidState::AlreadyRunning`] and leaves the running pass alone.
//! Everything a pass mutates lives in a run context created for that pass.

mod observer;
mod params;
mod run;

pub use observer::{LogObserver, SegmentationObserver};
pub use params::SegmentationParams;

use crate::diagnostics::RunReport;
use crate::error::{InvalidState, Result, SegmentationError};
use crate::image::ColorImage;
use crate::pool::ParallelOptions;
use crate::types::{Segment, SegmentationMode, WeightedSegment};
use log::warn;
use parking_lot::Mutex;
use run::{run_pass, RunControl};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outcome of one segmentation pass.
#[derive(Clone, Debug)]
pub struct SegmentationResult {
    pub mode: SegmentationMode,
    /// Final segments in discovery order; together they cover every pixel
    /// exactly once.
    pub segments: Vec<Segment>,
    /// The same segments with their membership weights.
    pub weighted_segments: Vec<WeightedSegment>,
    pub report: RunReport,
}

pub struct SegmentationController<O = ()> {
    observer: O,
    image: Mutex<Option<Arc<ColorImage>>>,
    in_flight: AtomicBool,
    cancel_requested: AtomicBool,
    parallel: ParallelOptions,
}

impl Default for SegmentationController<()> {
    fn default() -> Self {
        Self::new(())
    }
}

/// Clears the in-flight flag however the run ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<O: SegmentationObserver> SegmentationController<O> {
    pub fn new(observer: O) -> Self {
        Self {
            observer,
            image: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            cancel_requested: AtomicBool::new(false),
            parallel: ParallelOptions::default(),
        }
    }

    /// Override when fan-out batches go to the thread pool.
    pub fn with_parallel(mut self, parallel: ParallelOptions) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// The image segmentation commands will run on.
    pub fn image(&self) -> Option<Arc<ColorImage>> {
        self.image.lock().clone()
    }

    /// Replace the current image.
    ///
    /// The image must hold exactly `w × h` pixels and at least one.
    pub fn open_image(&self, image: ColorImage) -> Result<()> {
        image.check_dimensions()?;
        if image.is_empty() {
            return Err(SegmentationError::invalid_argument(
                "image",
                "image has no pixels",
            ));
        }
        let image = Arc::new(image);
        {
            let mut slot = self.image.lock();
            if self.is_running() {
                return Err(SegmentationError::InvalidState(InvalidState::AlreadyRunning));
            }
            *slot = Some(Arc::clone(&image));
        }
        self.observer.image_changed(&image);
        Ok(())
    }

    /// Segment the current image in `mode` and block until every pass is
    /// done.
    ///
    /// [`SegmentationMode::Both`] runs a deep pass followed by a quick pass
    /// and returns both results in that order. A failing pass stops the
    /// command; results of earlier passes are dropped.
    pub fn segment(
        &self,
        mode: SegmentationMode,
        params: &SegmentationParams,
    ) -> Result<Vec<SegmentationResult>> {
        params.validate()?;
        let image = {
            let slot = self.image.lock();
            // Cleared before the run becomes visible to `cancel()`.
            self.cancel_requested.store(false, Ordering::Release);
            if self
                .in_flight
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return Err(SegmentationError::InvalidState(InvalidState::AlreadyRunning));
            }
            match slot.as_ref() {
                Some(image) => Arc::clone(image),
                None => {
                    self.in_flight.store(false, Ordering::Release);
                    return Err(SegmentationError::InvalidState(InvalidState::NoImage));
                }
            }
        };
        let _guard = InFlight(&self.in_flight);

        let control = RunControl::new(&self.cancel_requested, params.timeout());
        let mut results = Vec::with_capacity(mode.passes().len());
        for &pass in mode.passes() {
            match run_pass(&image, pass, params, &self.observer, &control, self.parallel) {
                Ok(result) => results.push(result),
                Err(err) => {
                    warn!("{pass} segmentation aborted: {err}");
                    self.observer.segmentation_failed(pass, &err);
                    return Err(err);
                }
            }
        }
        Ok(results)
    }

    /// Ask the in-flight run to stop at its next checkpoint.
    ///
    /// Has no effect when nothing is running.
    pub fn cancel(&self) {
        if self.is_running() {
            self.cancel_requested.store(true, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_without_image_is_rejected() {
        let controller = SegmentationController::new(());
        let err = controller
            .segment(SegmentationMode::Deep, &SegmentationParams::default())
            .unwrap_err();
        assert_eq!(err, SegmentationError::InvalidState(InvalidState::NoImage));
        assert!(!controller.is_running());
    }

    #[test]
    fn invalid_params_are_rejected_before_work() {
        let controller = SegmentationController::new(());
        controller
            .open_image(ColorImage::filled(2, 2, [1, 2, 3]))
            .unwrap();
        let params = SegmentationParams {
            convergence_precision: -1.0,
            ..Default::default()
        };
        let err = controller.segment(SegmentationMode::Quick, &params).unwrap_err();
        assert!(matches!(err, SegmentationError::InvalidArgument { .. }));
    }

    #[test]
    fn empty_image_is_rejected() {
        let controller = SegmentationController::new(());
        let err = controller
            .open_image(ColorImage::filled(0, 3, [0, 0, 0]))
            .unwrap_err();
        assert!(matches!(
            err,
            SegmentationError::InvalidArgument { name: "image", .. }
        ));
        assert!(controller.image().is_none());
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let controller = SegmentationController::new(());
        let image = ColorImage {
            w: 4,
            h: 4,
            data: vec![[1, 2, 3]; 3],
        };
        let err = controller.open_image(image).unwrap_err();
        assert!(matches!(
            err,
            SegmentationError::InvalidArgument { name: "image", .. }
        ));
        assert!(controller.image().is_none());
        let err = controller
            .segment(SegmentationMode::Deep, &SegmentationParams::default())
            .unwrap_err();
        assert_eq!(err, SegmentationError::InvalidState(InvalidState::NoImage));
    }

    #[test]
    fn cancel_while_idle_does_not_leak_into_the_next_run() {
        let controller = SegmentationController::new(());
        controller
            .open_image(ColorImage::filled(2, 2, [5, 5, 5]))
            .unwrap();
        controller.cancel_requested.store(true, Ordering::Release);
        let params = SegmentationParams {
            minimal_segment_size: 1,
            ..Default::default()
        };
        assert!(controller.segment(SegmentationMode::Deep, &params).is_ok());
    }

    #[test]
    fn both_runs_deep_then_quick() {
        let controller = SegmentationController::new(());
        controller
            .open_image(ColorImage::filled(3, 3, [40, 40, 40]))
            .unwrap();
        let params = SegmentationParams {
            minimal_segment_size: 1,
            ..Default::default()
        };
        let results = controller.segment(SegmentationMode::Both, &params).unwrap();
        let modes: Vec<_> = results.iter().map(|r| r.mode).collect();
        assert_eq!(modes, vec![SegmentationMode::Deep, SegmentationMode::Quick]);
        assert!(!controller.is_running());
    }
}
