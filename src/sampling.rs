//! Split the pixel universe into graph nodes and held-out pixels.
use crate::image::ColorImage;
use crate::types::{Node, Pixel, SegmentationMode};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Result of sampling: internal nodes enter the affinity graph, external
/// pixels wait for extrapolation.
#[derive(Clone, Debug, Default)]
pub struct SampledPixels {
    pub internal: Vec<Node>,
    pub external: Vec<Pixel>,
    /// True when sampling produced no internal node and every pixel was
    /// moved into the graph.
    pub fell_back: bool,
}

#[derive(Clone, Debug)]
pub struct Sampler {
    probability: f64,
    seed: u64,
}

impl Sampler {
    pub fn new(probability: f64, seed: u64) -> Self {
        Self { probability, seed }
    }

    /// Classify every pixel of `image` for a pass in `mode`.
    ///
    /// Deep passes keep every pixel internal. Quick passes keep a pixel with
    /// probability `probability`. Node weights are left at zero; the engine
    /// resets them at the start of each attempt.
    pub fn sample(&self, image: &ColorImage, mode: SegmentationMode) -> SampledPixels {
        let mut sampled = SampledPixels::default();
        match mode {
            SegmentationMode::Quick => {
                let p = self.probability.clamp(0.0, 1.0);
                let mut rng = StdRng::seed_from_u64(self.seed);
                for pixel in image.pixels() {
                    if rng.gen_bool(p) {
                        sampled.internal.push(Node::new(pixel, 0.0));
                    } else {
                        sampled.external.push(pixel);
                    }
                }
            }
            SegmentationMode::Deep | SegmentationMode::Both => {
                sampled.internal = image.pixels().map(|p| Node::new(p, 0.0)).collect();
            }
        }

        if sampled.internal.is_empty() && !sampled.external.is_empty() {
            debug!(
                "Sampler: no internal node drawn from {} pixels, using all of them",
                sampled.external.len()
            );
            sampled.internal = sampled
                .external
                .drain(..)
                .map(|p| Node::new(p, 0.0))
                .collect();
            sampled.fell_back = true;
        }
        sampled
    }
}
