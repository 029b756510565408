//! Split a converged node set into a discovered segment and a remainder.
//!
//! Nodes whose weight ended above the attempt's initial uniform weight form
//! the segment. When none did, the attempt is *atomic*: the
//! weights carry no preference, so the segment is grown around the first node
//! instead, taking every node at least as affine to it as its mean affinity
//! over the set. A coherent set is taken whole; a set made of unrelated blocks
//! yields the basis's block and leaves the rest for the next attempt.
use crate::affinity::WeightFunction;
use crate::types::{Node, WeightedSegment};

/// Slack on the atomic membership test, absorbing summation rounding.
const ATOMIC_TOLERANCE: f64 = 1e-12;

/// Relative margin a weight must clear above the initial weight. Keeps a
/// set whose weights stayed uniform up to rounding on the atomic path.
const CANDIDATE_MARGIN: f64 = 1e-9;

#[derive(Clone, Debug)]
pub struct Extraction {
    /// Discovered segment with weights normalised to sum to one.
    pub segment: WeightedSegment,
    /// Nodes forming the next attempt's working set.
    pub remainder: Vec<Node>,
    /// True when the segment came from the atomic path.
    pub atomic: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct SegmentExtractor<'a> {
    affinity: &'a WeightFunction,
}

impl<'a> SegmentExtractor<'a> {
    pub fn new(affinity: &'a WeightFunction) -> Self {
        Self { affinity }
    }

    /// Partition `nodes` against `threshold`, the attempt's initial weight.
    pub fn extract(&self, nodes: Vec<Node>, threshold: f64) -> Extraction {
        let cutoff = threshold * (1.0 + CANDIDATE_MARGIN);
        let (candidate, remainder): (Vec<Node>, Vec<Node>) =
            nodes.iter().partition(|node| node.weight > cutoff);
        if candidate.is_empty() {
            return self.extract_atomic(nodes);
        }
        Extraction {
            segment: WeightedSegment::normalized(&candidate),
            remainder,
            atomic: false,
        }
    }

    /// Grow a segment around the first node, ignoring the node weights'
    /// ranking.
    pub fn extract_atomic(&self, nodes: Vec<Node>) -> Extraction {
        let Some(basis) = nodes.first().map(|node| node.pixel) else {
            return Extraction {
                segment: WeightedSegment::default(),
                remainder: Vec::new(),
                atomic: true,
            };
        };

        let affinities: Vec<f64> = nodes
            .iter()
            .map(|node| self.affinity.weight(basis, node.pixel))
            .collect();
        let mean = affinities.iter().sum::<f64>() / nodes.len() as f64;
        let cutoff = mean - ATOMIC_TOLERANCE;

        let mut members = Vec::new();
        let mut remainder = Vec::new();
        for (node, affinity) in nodes.into_iter().zip(affinities) {
            if affinity >= cutoff {
                members.push(node);
            } else {
                remainder.push(node);
            }
        }

        Extraction {
            segment: WeightedSegment::normalized(&members),
            remainder,
            atomic: true,
        }
    }
}
