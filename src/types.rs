use crate::error::SegmentationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Integer pixel coordinate inside the image bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pixel {
    pub x: u32,
    pub y: u32,
}

impl Pixel {
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Pixel paired with its belief weight during a discovery attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    pub pixel: Pixel,
    pub weight: f64,
}

impl Node {
    #[inline]
    pub const fn new(pixel: Pixel, weight: f64) -> Self {
        Self { pixel, weight }
    }
}

/// Discovered cluster as an ordered `(pixel, weight)` sequence.
///
/// Weights of the discovered members sum to one; pixels appended later by
/// extrapolation or merging carry weight zero, so the sum is preserved.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeightedSegment {
    entries: Vec<(Pixel, f64)>,
}

impl WeightedSegment {
    /// Build a segment from nodes, normalising their weights to sum to one.
    ///
    /// Falls back to uniform weights when the weights are degenerate
    /// (non-finite or non-positive sum).
    pub fn normalized(nodes: &[Node]) -> Self {
        let sum: f64 = nodes.iter().map(|n| n.weight).sum();
        let entries = if sum.is_finite() && sum > 0.0 {
            nodes.iter().map(|n| (n.pixel, n.weight / sum)).collect()
        } else {
            let uniform = 1.0 / nodes.len().max(1) as f64;
            nodes.iter().map(|n| (n.pixel, uniform)).collect()
        };
        Self { entries }
    }

    /// Segment whose members share the weight uniformly.
    pub fn uniform(pixels: &[Pixel]) -> Self {
        let uniform = 1.0 / pixels.len().max(1) as f64;
        Self {
            entries: pixels.iter().map(|&p| (p, uniform)).collect(),
        }
    }

    /// Append a pixel that does not contribute to the characteristic vector.
    pub fn push_unweighted(&mut self, pixel: Pixel) {
        self.entries.push((pixel, 0.0));
    }

    /// Reference member used to centre induced-weight comparisons.
    pub fn basis(&self) -> Option<Pixel> {
        self.entries.first().map(|&(p, _)| p)
    }

    pub fn entries(&self) -> &[(Pixel, f64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn weight_sum(&self) -> f64 {
        self.entries.iter().map(|&(_, w)| w).sum()
    }

    pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
        self.entries.iter().map(|&(p, _)| p)
    }

    pub fn to_segment(&self) -> Segment {
        self.pixels().collect()
    }
}

/// Plain pixel list; the externally visible result of a discovered cluster.
pub type Segment = Vec<Pixel>;

/// Which pixels take part in the affinity graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentationMode {
    /// Sample a subset of pixels into the graph and extrapolate to the rest.
    Quick,
    /// Every pixel is a graph node.
    Deep,
    /// Deep, then quick, one after the other.
    Both,
}

impl SegmentationMode {
    /// Concrete passes executed for this mode, in order.
    pub fn passes(self) -> &'static [SegmentationMode] {
        match self {
            Self::Quick => &[Self::Quick],
            Self::Deep => &[Self::Deep],
            Self::Both => &[Self::Deep, Self::Quick],
        }
    }
}

impl fmt::Display for SegmentationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Quick => "quick",
            Self::Deep => "deep",
            Self::Both => "both",
        };
        f.write_str(name)
    }
}

impl FromStr for SegmentationMode {
    type Err = SegmentationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Ok(Self::Quick),
            "deep" => Ok(Self::Deep),
            "both" => Ok(Self::Both),
            other => Err(SegmentationError::invalid_argument(
                "mode",
                format!("unsupported mode '{other}', expected quick, deep or both"),
            )),
        }
    }
}

/// Phases reporting fine-grained progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubProcess {
    Iteration,
    Extrapolation,
    Merging,
}

impl fmt::Display for SubProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Iteration => "iteration",
            Self::Extrapolation => "extrapolation",
            Self::Merging => "merging",
        };
        f.write_str(name)
    }
}
