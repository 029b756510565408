//! Resolve pixels left over once discovery stops.
//!
//! Every pending pixel joins the qualifying segment with the largest induced
//! weight (see [`crate::extrapolation::induced_weight`]); ties go to the
//! earliest-discovered segment. When no segment qualifies, the pending pixels
//! are gathered into a single catch-all segment so that every pixel still
//! ends up in exactly one segment.
use crate::affinity::WeightFunction;
use crate::extrapolation::induced_weight;
use crate::pool::{scatter_gather, ParallelOptions};
use crate::types::{Pixel, WeightedSegment};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Pending pixels appended to existing segments.
    pub merged: usize,
    /// Size of the catch-all segment, when one had to be created.
    pub catch_all: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct Merger<'a> {
    affinity: &'a WeightFunction,
    parallel: ParallelOptions,
}

impl<'a> Merger<'a> {
    pub fn new(affinity: &'a WeightFunction) -> Self {
        Self {
            affinity,
            parallel: ParallelOptions::default(),
        }
    }

    pub fn with_parallel(mut self, parallel: ParallelOptions) -> Self {
        self.parallel = parallel;
        self
    }

    /// Index of the segment that fits `pixel` best.
    pub fn best_segment(&self, segments: &[WeightedSegment], pixel: Pixel) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                continue;
            }
            let score = induced_weight(self.affinity, segment, pixel);
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((idx, score)),
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Append every pending pixel to its best segment.
    ///
    /// Decisions are taken against the segments as they are on entry; merged
    /// pixels carry weight zero and would not change them anyway.
    pub fn merge<P>(
        &self,
        segments: &mut Vec<WeightedSegment>,
        pending: Vec<Pixel>,
        mut progress: P,
    ) -> MergeOutcome
    where
        P: FnMut(usize, usize),
    {
        if pending.is_empty() {
            return MergeOutcome::default();
        }
        if segments.iter().all(WeightedSegment::is_empty) {
            let size = pending.len();
            segments.push(WeightedSegment::uniform(&pending));
            progress(size, size);
            return MergeOutcome {
                merged: 0,
                catch_all: Some(size),
            };
        }

        let total = pending.len();
        let targets = {
            let segments: &[WeightedSegment] = &segments[..];
            let pending = &pending;
            scatter_gather(
                total,
                self.parallel,
                |i| self.best_segment(segments, pending[i]),
                |done| progress(done, total),
            )
        };

        let mut merged = 0usize;
        for (pixel, target) in pending.into_iter().zip(targets) {
            if let Some(idx) = target {
                segments[idx].push_unweighted(pixel);
                merged += 1;
            }
        }
        MergeOutcome {
            merged,
            catch_all: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affinity::AffinitySettings;
    use crate::image::ColorImage;
    use crate::types::Node;

    /// Columns: red, red, blue, blue, green.
    fn stripes() -> ColorImage {
        ColorImage::from_fn(5, 2, |x, _| match x {
            0 | 1 => [200, 10, 10],
            2 | 3 => [10, 10, 200],
            _ => [10, 200, 10],
        })
    }

    fn affinity(image: &ColorImage) -> WeightFunction {
        WeightFunction::new(
            image,
            AffinitySettings {
                force_grayscale: false,
                weight_ratio_square: 0.5,
            },
        )
    }

    fn seg(pixels: &[(u32, u32)]) -> WeightedSegment {
        let nodes: Vec<_> = pixels
            .iter()
            .map(|&(x, y)| Node::new(Pixel::new(x, y), 1.0))
            .collect();
        WeightedSegment::normalized(&nodes)
    }

    #[test]
    fn pending_pixels_join_the_best_segment() {
        let img = stripes();
        let wf = affinity(&img);
        let mut segments = vec![seg(&[(0, 0), (1, 0)]), seg(&[(2, 0), (3, 0)])];
        let pending = vec![Pixel::new(0, 1), Pixel::new(3, 1), Pixel::new(1, 1)];
        let mut calls = 0;
        let outcome = Merger::new(&wf).merge(&mut segments, pending, |_, _| calls += 1);
        assert_eq!(outcome.merged, 3);
        assert_eq!(outcome.catch_all, None);
        assert_eq!(calls, 3);
        assert_eq!(segments[0].len(), 4);
        assert_eq!(segments[1].len(), 3);
        assert!(segments.iter().all(|s| (s.weight_sum() - 1.0).abs() < 1e-9));
    }

    #[test]
    fn every_pending_pixel_lands_somewhere() {
        let img = stripes();
        let wf = affinity(&img);
        let mut segments = vec![seg(&[(0, 0)]), seg(&[(2, 0)])];
        let pending: Vec<_> = img
            .pixels()
            .filter(|p| *p != Pixel::new(0, 0) && *p != Pixel::new(2, 0))
            .collect();
        let outcome = Merger::new(&wf).merge(&mut segments, pending, |_, _| {});
        assert_eq!(outcome.merged, 8);
        assert_eq!(segments.iter().map(|s| s.len()).sum::<usize>(), 10);
    }

    #[test]
    fn no_target_creates_catch_all_segment() {
        let img = stripes();
        let wf = affinity(&img);
        let mut segments = Vec::new();
        let pending: Vec<_> = img.pixels().collect();
        let outcome = Merger::new(&wf).merge(&mut segments, pending, |_, _| {});
        assert_eq!(outcome.catch_all, Some(10));
        assert_eq!(segments.len(), 1);
        assert!((segments[0].weight_sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn ties_prefer_the_earliest_segment() {
        let img = ColorImage::filled(3, 1, [50, 50, 50]);
        let wf = affinity(&img);
        let segments = vec![seg(&[(0, 0)]), seg(&[(1, 0)])];
        assert_eq!(Merger::new(&wf).best_segment(&segments, Pixel::new(2, 0)), Some(0));
    }
}
