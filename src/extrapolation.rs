//! Assign held-out pixels to a freshly discovered segment.
//!
//! The test is the *induced weight* of a pixel `p` with respect to a segment
//! `S` with basis `b` (its first member):
//!
//! ```text
//! iw(S, p) = Σ_(q, w) ∈ S  w · (A(q, p) − A(q, b))
//! ```
//!
//! A non-negative value means `p` matches the segment's affinity profile at
//! least as well as the basis does. Claimed pixels join the segment with
//! weight zero and leave the external pool for good.
use crate::affinity::WeightFunction;
use crate::pool::{scatter_gather, ParallelOptions};
use crate::types::{Pixel, WeightedSegment};

/// Induced weight of `pixel` with respect to `segment`.
///
/// Returns negative infinity for an empty segment so it never wins a
/// comparison.
pub fn induced_weight(affinity: &WeightFunction, segment: &WeightedSegment, pixel: Pixel) -> f64 {
    let Some(basis) = segment.basis() else {
        return f64::NEG_INFINITY;
    };
    segment
        .entries()
        .iter()
        .filter(|&&(_, w)| w != 0.0)
        .map(|&(q, w)| w * (affinity.weight(q, pixel) - affinity.weight(q, basis)))
        .sum()
}

#[derive(Clone, Debug)]
pub struct Extrapolator<'a> {
    affinity: &'a WeightFunction,
    parallel: ParallelOptions,
}

impl<'a> Extrapolator<'a> {
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

    /// Move every external pixel with non-negative induced weight into
    /// `segment` and return how many were claimed.
    ///
    /// Unclaimed pixels stay in `external`, in their original order.
    pub fn extrapolate<P>(
        &self,
        segment: &mut WeightedSegment,
        external: &mut Vec<Pixel>,
        mut progress: P,
    ) -> usize
    where
        P: FnMut(usize, usize),
    {
        if segment.is_empty() || external.is_empty() {
            return 0;
        }

        let total = external.len();
        let claims = {
            let segment: &WeightedSegment = &*segment;
            let pixels: &[Pixel] = &external[..];
            let affinity = self.affinity;
            scatter_gather(
                total,
                self.parallel,
                |i| induced_weight(affinity, segment, pixels[i]) >= 0.0,
                |done| progress(done, total),
            )
        };

        let mut kept = Vec::with_capacity(total);
        let mut claimed = 0usize;
        for (pixel, claim) in external.drain(..).zip(claims) {
            if claim {
                segment.push_unweighted(pixel);
                claimed += 1;
            } else {
                kept.push(pixel);
            }
        }
        *external = kept;
        claimed
    }
}
