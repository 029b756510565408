//! Pairwise pixel affinity.
//!
//! Every pixel is projected once per run onto a small feature vector:
//!
//! - grayscale mode: `[luma, 0, 0]` with luma normalised to `[0, 1]`;
//! - colour mode: `[v, v·s·cos(h), v·s·sin(h)]` from the HSV decomposition,
//!   i.e. value plus two chroma axes, which keeps hue distances meaningful
//!   across the 0°/360° seam and collapses hue for unsaturated colours.
//!
//! The affinity of two pixels is `exp(-d² / weight_ratio_square)` where `d²`
//! is the squared Euclidean distance between their features. It lies in
//! `(0, 1]`, is symmetric, and equals exactly `1.0` for identical features.

use crate::image::ColorImage;
use crate::types::Pixel;
use image::Pixel as _;
use palette::{FromColor, Hsv, Srgb};

/// Settings that shape the affinity kernel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffinitySettings {
    /// Compare luma only, even for colour images.
    pub force_grayscale: bool,
    /// Kernel width; larger values make distant colours look more alike.
    pub weight_ratio_square: f64,
}

/// Immutable affinity oracle for one image.
#[derive(Clone, Debug)]
pub struct WeightFunction {
    width: usize,
    features: Vec<[f64; 3]>,
    weight_ratio_square: f64,
    grayscale: bool,
}

impl WeightFunction {
    /// Precompute per-pixel features.
    ///
    /// Grayscale features are used when forced or when the image carries no
    /// chroma at all.
    pub fn new(image: &ColorImage, settings: AffinitySettings) -> Self {
        let grayscale = settings.force_grayscale || image.is_grayscale();
        let features = image
            .data
            .iter()
            .map(|&rgb| {
                if grayscale {
                    luma_feature(rgb)
                } else {
                    chroma_feature(rgb)
                }
            })
            .collect();
        Self {
            width: image.w,
            features,
            weight_ratio_square: settings.weight_ratio_square,
            grayscale,
        }
    }

    /// Affinity between two pixels, in `(0, 1]`.
    #[inline]
    pub fn weight(&self, a: Pixel, b: Pixel) -> f64 {
        let fa = &self.features[self.index(a)];
        let fb = &self.features[self.index(b)];
        let d2 = (fa[0] - fb[0]).powi(2) + (fa[1] - fb[1]).powi(2) + (fa[2] - fb[2]).powi(2);
        (-d2 / self.weight_ratio_square).exp()
    }

    pub fn is_grayscale(&self) -> bool {
        self.grayscale
    }

    #[inline]
    fn index(&self, p: Pixel) -> usize {
        p.y as usize * self.width + p.x as usize
    }
}

fn luma_feature(rgb: [u8; 3]) -> [f64; 3] {
    let luma = image::Rgb(rgb).to_luma().0[0];
    [f64::from(luma) / 255.0, 0.0, 0.0]
}

fn chroma_feature([r, g, b]: [u8; 3]) -> [f64; 3] {
    let srgb = Srgb::new(
        f64::from(r) / 255.0,
        f64::from(g) / 255.0,
        f64::from(b) / 255.0,
    );
    let hsv = Hsv::from_color(srgb);
    let hue = hsv.hue.into_radians();
    let radius = hsv.value * hsv.saturation;
    [hsv.value, radius * hue.cos(), radius * hue.sin()]
}
