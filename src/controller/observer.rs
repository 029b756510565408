//! Event sink for the presentation layer.
//!
//! The controller invokes these callbacks only from the thread that issued
//! the command, never from worker tasks. All methods default to no-ops.

use crate::diagnostics::Anomaly;
use crate::error::SegmentationError;
use crate::image::ColorImage;
use crate::types::{Segment, SegmentationMode, SubProcess};
use log::{debug, info, trace, warn};

pub trait SegmentationObserver {
    /// A new image replaced the previous one.
    fn image_changed(&self, _image: &ColorImage) {}

    /// A pass in `mode` started.
    fn segmentation_started(&self, _mode: SegmentationMode) {}

    /// A qualifying segment was discovered (after extrapolation).
    fn segment_changed(&self, _mode: SegmentationMode, _segment: &Segment) {}

    /// Pixels covered by qualifying segments so far.
    fn segmentation_progress(&self, _segmented: usize, _total: usize) {}

    /// Fine-grained progress inside one phase.
    fn sub_process_progress(&self, _phase: SubProcess, _current: usize, _total: usize) {}

    /// A recoverable anomaly occurred.
    fn segmentation_anomaly(&self, _mode: SegmentationMode, _anomaly: &Anomaly) {}

    /// A pass finished with its final segment list.
    fn segmentation_finished(&self, _mode: SegmentationMode, _segments: &[Segment]) {}

    /// A pass aborted.
    fn segmentation_failed(&self, _mode: SegmentationMode, _error: &SegmentationError) {}
}

impl SegmentationObserver for () {}

impl<T: SegmentationObserver + ?Sized> SegmentationObserver for &T {
    fn image_changed(&self, image: &ColorImage) {
        (**self).image_changed(image)
    }
    fn segmentation_started(&self, mode: SegmentationMode) {
        (**self).segmentation_started(mode)
    }
    fn segment_changed(&self, mode: SegmentationMode, segment: &Segment) {
        (**self).segment_changed(mode, segment)
    }
    fn segmentation_progress(&self, segmented: usize, total: usize) {
        (**self).segmentation_progress(segmented, total)
    }
    fn sub_process_progress(&self, phase: SubProcess, current: usize, total: usize) {
        (**self).sub_process_progress(phase, current, total)
    }
    fn segmentation_anomaly(&self, mode: SegmentationMode, anomaly: &Anomaly) {
        (**self).segmentation_anomaly(mode, anomaly)
    }
    fn segmentation_finished(&self, mode: SegmentationMode, segments: &[Segment]) {
        (**self).segmentation_finished(mode, segments)
    }
    fn segmentation_failed(&self, mode: SegmentationMode, error: &SegmentationError) {
        (**self).segmentation_failed(mode, error)
    }
}

/// Forwards every event to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl SegmentationObserver for LogObserver {
    fn image_changed(&self, image: &ColorImage) {
        info!("image changed: {}x{}", image.w, image.h);
    }

    fn segmentation_started(&self, mode: SegmentationMode) {
        info!("{mode} segmentation started");
    }

    fn segment_changed(&self, mode: SegmentationMode, segment: &Segment) {
        debug!("{mode} segment discovered: {} px", segment.len());
    }

    fn segmentation_progress(&self, segmented: usize, total: usize) {
        debug!("segmented {segmented}/{total} px");
    }

    fn sub_process_progress(&self, phase: SubProcess, current: usize, total: usize) {
        if current == total {
            trace!("{phase} batch done ({total} tasks)");
        }
    }

    fn segmentation_anomaly(&self, mode: SegmentationMode, anomaly: &Anomaly) {
        warn!("{mode} segmentation anomaly: {anomaly:?}");
    }

    fn segmentation_finished(&self, mode: SegmentationMode, segments: &[Segment]) {
        info!("{mode} segmentation finished with {} segments", segments.len());
    }

    fn segmentation_failed(&self, mode: SegmentationMode, error: &SegmentationError) {
        warn!("{mode} segmentation failed: {error}");
    }
}
