//! Run-scoped state of one segmentation pass.
//!
//! A [`RunContext`] is created for every pass and owns the working node set,
//! the held-out pixels and the segments discovered so far. Nothing in here
//! outlives the pass, so two passes never observe each other's state.

use super::observer::SegmentationObserver;
use super::params::SegmentationParams;
use super::SegmentationResult;
use crate::affinity::WeightFunction;
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{Anomaly, AttemptReport, InputDescriptor, RunReport};
use crate::error::{Result, SegmentationError};
use crate::extraction::{Extraction, SegmentExtractor};
use crate::extrapolation::Extrapolator;
use crate::image::ColorImage;
use crate::iteration::PowerIteration;
use crate::merge::Merger;
use crate::pool::ParallelOptions;
use crate::sampling::Sampler;
use crate::types::{Node, Pixel, Segment, SegmentationMode, SubProcess, WeightedSegment};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Cooperative stop conditions shared by every pass of one command.
pub(crate) struct RunControl<'a> {
    cancel: &'a AtomicBool,
    started: Instant,
    timeout: Option<Duration>,
}

impl<'a> RunControl<'a> {
    pub(crate) fn new(cancel: &'a AtomicBool, timeout: Option<Duration>) -> Self {
        Self {
            cancel,
            started: Instant::now(),
            timeout,
        }
    }

    /// Fails once cancellation was requested or the time budget is spent.
    pub(crate) fn checkpoint(&self) -> Result<()> {
        if self.cancel.load(Ordering::Acquire) {
            return Err(SegmentationError::Cancelled);
        }
        if let Some(limit) = self.timeout {
            let elapsed = self.started.elapsed();
            if elapsed >= limit {
                return Err(SegmentationError::TimedOut {
                    elapsed_ms: elapsed.as_millis() as u64,
                });
            }
        }
        Ok(())
    }
}

pub(crate) struct RunContext<'a, O: SegmentationObserver> {
    mode: SegmentationMode,
    params: &'a SegmentationParams,
    observer: &'a O,
    control: &'a RunControl<'a>,
    parallel: ParallelOptions,
    affinity: WeightFunction,
    total: usize,
    internal: Vec<Node>,
    external: Vec<Pixel>,
    /// Segments that reached the minimal size, in discovery order.
    segments: Vec<WeightedSegment>,
    /// Segments dissolved into the pending pool at finalize.
    undersized: Vec<WeightedSegment>,
    segmented: usize,
    report: RunReport,
}

impl<'a, O: SegmentationObserver> RunContext<'a, O> {
    /// Build the weight function and sample the pixel universe.
    pub(crate) fn initialize(
        image: &ColorImage,
        mode: SegmentationMode,
        params: &'a SegmentationParams,
        observer: &'a O,
        control: &'a RunControl<'a>,
        parallel: ParallelOptions,
    ) -> Self {
        let start = Instant::now();
        let affinity = WeightFunction::new(image, params.affinity_settings());
        let sampled = Sampler::new(params.sampling_probability, params.seed).sample(image, mode);

        let mut report = RunReport::new(
            mode,
            InputDescriptor {
                width: image.w,
                height: image.h,
                grayscale: affinity.is_grayscale(),
            },
        );
        report.internal_nodes = sampled.internal.len();
        report.external_pixels = sampled.external.len();
        report.sampling_fell_back = sampled.fell_back;
        report.timings.push_since("initialize", start);

        info!(
            "{mode} pass on {}x{}: {} internal nodes, {} external pixels{}",
            image.w,
            image.h,
            sampled.internal.len(),
            sampled.external.len(),
            if sampled.fell_back { " (sampling fallback)" } else { "" }
        );

        Self {
            mode,
            params,
            observer,
            control,
            parallel,
            affinity,
            total: image.pixel_count(),
            internal: sampled.internal,
            external: sampled.external,
            segments: Vec::new(),
            undersized: Vec::new(),
            segmented: 0,
            report,
        }
    }

    /// Discover segments until the coverage target is met or the working set
    /// is exhausted.
    pub(crate) fn solve(&mut self) -> Result<()> {
        let start = Instant::now();
        let target = self.params.coverage_target(self.total);
        self.observer.segmentation_progress(0, self.total);
        while (self.segmented as f64) < target && !self.internal.is_empty() {
            self.control.checkpoint()?;
            self.attempt()?;
        }
        debug!(
            "{} pass: {} attempts, {}/{} px in qualifying segments",
            self.mode,
            self.report.attempts.len(),
            self.segmented,
            self.total
        );
        self.report.timings.push_since("solve", start);
        Ok(())
    }

    fn attempt(&mut self) -> Result<()> {
        let start = Instant::now();
        let index = self.report.attempts.len();
        let observer = self.observer;
        let control = self.control;

        let mut nodes = std::mem::take(&mut self.internal);
        let node_count = nodes.len();
        let convergence = PowerIteration::new(
            &self.affinity,
            self.params.convergence_precision,
            self.params.max_rounds,
        )
        .with_parallel(self.parallel)
        .converge(
            &mut nodes,
            |done, total| observer.sub_process_progress(SubProcess::Iteration, done, total),
            || control.checkpoint(),
        )?;

        let converged = convergence.converged();
        if !converged {
            self.raise(Anomaly::NonConvergence {
                attempt: index,
                rounds: convergence.rounds,
                last_distance: convergence
                    .distance
                    .is_finite()
                    .then_some(convergence.distance),
                status: convergence.status,
            });
        }

        let extractor = SegmentExtractor::new(&self.affinity);
        let Extraction {
            mut segment,
            remainder,
            atomic,
        } = if converged {
            extractor.extract(nodes, convergence.initial_weight)
        } else {
            extractor.extract_atomic(nodes)
        };
        self.internal = remainder;
        let discovered = segment.len();

        control.checkpoint()?;
        let extrapolated = Extrapolator::new(&self.affinity)
            .with_parallel(self.parallel)
            .extrapolate(&mut segment, &mut self.external, |done, total| {
                observer.sub_process_progress(SubProcess::Extrapolation, done, total)
            });

        let qualifies = segment.len() >= self.params.minimal_segment_size;
        debug!(
            "{} attempt {index}: {node_count} nodes, {} rounds ({:?}), \
             {discovered} discovered{}, {extrapolated} extrapolated",
            self.mode,
            convergence.rounds,
            convergence.status,
            if atomic { " atomically" } else { "" },
        );
        if qualifies {
            self.segmented += segment.len();
            observer.segment_changed(self.mode, &segment.to_segment());
            self.segments.push(segment);
        } else {
            self.undersized.push(segment);
        }
        observer.segmentation_progress(self.segmented, self.total);

        self.report.attempts.push(AttemptReport {
            index,
            nodes: node_count,
            rounds: convergence.rounds,
            status: convergence.status,
            atomic,
            discovered,
            extrapolated,
            qualifies,
            elapsed_ms: elapsed_ms(start),
        });
        Ok(())
    }

    /// Merge every leftover pixel and publish the final segment list.
    pub(crate) fn finalize(mut self) -> Result<SegmentationResult> {
        let start = Instant::now();
        self.report.segmented_before_merge = self.segmented;

        let mut pending = std::mem::take(&mut self.external);
        pending.extend(self.internal.drain(..).map(|node| node.pixel));
        for segment in self.undersized.drain(..) {
            pending.extend(segment.pixels());
        }
        self.report.pending_pixels = pending.len();

        self.control.checkpoint()?;
        let observer = self.observer;
        let outcome = Merger::new(&self.affinity)
            .with_parallel(self.parallel)
            .merge(&mut self.segments, pending, |done, total| {
                observer.sub_process_progress(SubProcess::Merging, done, total)
            });
        self.report.merged_pixels = outcome.merged;
        self.report.catch_all_size = outcome.catch_all;
        if let Some(size) = outcome.catch_all {
            self.raise(Anomaly::EmptyMergeTarget { pending: size });
        }
        self.report.timings.push_since("finalize", start);

        let segments: Vec<Segment> = self
            .segments
            .iter()
            .map(WeightedSegment::to_segment)
            .collect();
        observer.segmentation_progress(self.total, self.total);
        observer.segmentation_finished(self.mode, &segments);
        info!(
            "{} pass finished: {} segments, {} px merged",
            self.mode,
            segments.len(),
            outcome.merged
        );

        Ok(SegmentationResult {
            mode: self.mode,
            segments,
            weighted_segments: self.segments,
            report: self.report,
        })
    }

    fn raise(&mut self, anomaly: Anomaly) {
        warn!("{} pass anomaly: {anomaly:?}", self.mode);
        self.observer.segmentation_anomaly(self.mode, &anomaly);
        self.report.anomalies.push(anomaly);
    }
}

/// Run one full pass: initialize, solve, finalize.
pub(crate) fn run_pass<O: SegmentationObserver>(
    image: &ColorImage,
    mode: SegmentationMode,
    params: &SegmentationParams,
    observer: &O,
    control: &RunControl<'_>,
    parallel: ParallelOptions,
) -> Result<SegmentationResult> {
    let start = Instant::now();
    observer.segmentation_started(mode);
    let mut context = RunContext::initialize(image, mode, params, observer, control, parallel);
    context.solve()?;
    let mut result = context.finalize()?;
    result.report.timings.finish(start);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_reports_cancellation_first() {
        let flag = AtomicBool::new(true);
        let control = RunControl::new(&flag, Some(Duration::ZERO));
        assert_eq!(control.checkpoint(), Err(SegmentationError::Cancelled));
    }

    #[test]
    fn checkpoint_times_out() {
        let flag = AtomicBool::new(false);
        let control = RunControl::new(&flag, Some(Duration::ZERO));
        assert!(matches!(
            control.checkpoint(),
            Err(SegmentationError::TimedOut { .. })
        ));
        let relaxed = RunControl::new(&flag, None);
        assert_eq!(relaxed.checkpoint(), Ok(()));
    }

    #[test]
    fn pass_covers_every_pixel_once() {
        let image = ColorImage::from_fn(6, 4, |x, _| {
            if x < 3 {
                [10, 10, 10]
            } else {
                [240, 240, 240]
            }
        });
        let params = SegmentationParams {
            minimal_segment_size: 2,
            target_coverage_ratio: 1.0,
            ..Default::default()
        };
        let flag = AtomicBool::new(false);
        let control = RunControl::new(&flag, None);
        let result = run_pass(
            &image,
            SegmentationMode::Deep,
            &params,
            &(),
            &control,
            ParallelOptions::disabled(),
        )
        .unwrap();

        let mut seen: Vec<Pixel> = result.segments.iter().flatten().copied().collect();
        seen.sort();
        let mut all: Vec<Pixel> = image.pixels().collect();
        all.sort();
        assert_eq!(seen, all);
        assert_eq!(result.segments.len(), 2);
        for segment in &result.weighted_segments {
            assert!((segment.weight_sum() - 1.0).abs() < 1e-9);
        }
        assert!(result.report.timings.stage("solve").is_some());
    }
}
