//! Power-iteration engine driving a node set to its fixed point.
//!
//! Each round computes, for every node `i`,
//!
//! ```text
//! fitness_i = Σ_j w_j · A(p_i, p_j)
//! ```
//!
//! against the weights of the previous round (a dense matrix-vector product,
//! parallel over `i`), then rescales
//!
//! ```text
//! w_i ← w_i · fitness_i / Σ_k w_k · fitness_k
//! ```
//!
//! so nodes with above-average affinity to the current mass gain weight and
//! the rest fade. Iteration stops once the Euclidean step between two weight
//! vectors drops to the configured precision, when the round cap is reached,
//! or when the overall fitness collapses to a non-positive or non-finite
//! value.
//!
//! Weights are written only between rounds, after all fitness tasks joined.

use crate::affinity::WeightFunction;
use crate::error::Result;
use crate::pool::{scatter_gather, ParallelOptions};
use crate::types::Node;
use log::debug;
use nalgebra::DVector;
use serde::Serialize;

/// How an attempt's iteration ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConvergenceStatus {
    /// The step distance reached the requested precision.
    Converged,
    /// The round cap was hit before reaching the precision.
    RoundLimit,
    /// The overall fitness became non-positive or non-finite.
    Collapsed,
}

/// Summary of one call to [`PowerIteration::converge`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Convergence {
    pub status: ConvergenceStatus,
    pub rounds: usize,
    /// Step distance of the last completed round.
    pub distance: f64,
    /// Uniform weight `1/N` assigned at the start of the attempt.
    pub initial_weight: f64,
}

impl Convergence {
    pub fn converged(&self) -> bool {
        self.status == ConvergenceStatus::Converged
    }
}

#[derive(Clone, Debug)]
pub struct PowerIteration<'a> {
    affinity: &'a WeightFunction,
    precision: f64,
    max_rounds: usize,
    parallel: ParallelOptions,
}

impl<'a> PowerIteration<'a> {
    pub fn new(affinity: &'a WeightFunction, precision: f64, max_rounds: usize) -> Self {
        Self {
            affinity,
            precision,
            max_rounds: max_rounds.max(1),
            parallel: ParallelOptions::default(),
        }
    }

    pub fn with_parallel(mut self, parallel: ParallelOptions) -> Self {
        self.parallel = parallel;
        self
    }

    /// Reset every weight to `1/N` and return that value.
    pub fn reset(nodes: &mut [Node]) -> f64 {
        if nodes.is_empty() {
            return 0.0;
        }
        let uniform = 1.0 / nodes.len() as f64;
        for node in nodes.iter_mut() {
            node.weight = uniform;
        }
        uniform
    }

    /// Run rounds from uniform weights until a stop condition holds.
    ///
    /// `progress(done, total)` fires once per resolved node fitness;
    /// `checkpoint()` runs before every round and aborts the attempt when it
    /// returns an error.
    pub fn converge<P, C>(
        &self,
        nodes: &mut [Node],
        mut progress: P,
        mut checkpoint: C,
    ) -> Result<Convergence>
    where
        P: FnMut(usize, usize),
        C: FnMut() -> Result<()>,
    {
        let initial_weight = Self::reset(nodes);
        if nodes.is_empty() {
            return Ok(Convergence {
                status: ConvergenceStatus::Converged,
                rounds: 0,
                distance: 0.0,
                initial_weight,
            });
        }

        let mut distance = f64::INFINITY;
        for round in 1..=self.max_rounds {
            checkpoint()?;
            let Some(step) = self.round(nodes, &mut progress) else {
                debug!(
                    "PowerIteration: overall fitness collapsed at round {round} ({} nodes)",
                    nodes.len()
                );
                return Ok(Convergence {
                    status: ConvergenceStatus::Collapsed,
                    rounds: round,
                    distance,
                    initial_weight,
                });
            };
            distance = step;
            if distance <= self.precision {
                debug!(
                    "PowerIteration: converged after {round} rounds \
                     ({} nodes, step={distance:.3e})",
                    nodes.len()
                );
                return Ok(Convergence {
                    status: ConvergenceStatus::Converged,
                    rounds: round,
                    distance,
                    initial_weight,
                });
            }
        }

        debug!(
            "PowerIteration: round cap {} reached ({} nodes, step={distance:.3e})",
            self.max_rounds,
            nodes.len()
        );
        Ok(Convergence {
            status: ConvergenceStatus::RoundLimit,
            rounds: self.max_rounds,
            distance,
            initial_weight,
        })
    }

    /// Perform one round in place and return the step distance.
    ///
    /// Returns `None` without touching the weights when the overall fitness
    /// is not a positive finite number.
    pub fn round<P>(&self, nodes: &mut [Node], progress: &mut P) -> Option<f64>
    where
        P: FnMut(usize, usize),
    {
        let n = nodes.len();
        let previous = DVector::from_iterator(n, nodes.iter().map(|node| node.weight));

        let fitness = {
            let nodes: &[Node] = &*nodes;
            let previous = &previous;
            let affinity = self.affinity;
            scatter_gather(
                n,
                self.parallel,
                |i| {
                    let pi = nodes[i].pixel;
                    nodes
                        .iter()
                        .zip(previous.iter())
                        .map(|(node, &w)| w * affinity.weight(pi, node.pixel))
                        .sum::<f64>()
                },
                |done| progress(done, n),
            )
        };
        let fitness = DVector::from_vec(fitness);

        let overall = previous.dot(&fitness);
        if !(overall.is_finite() && overall > 0.0) {
            return None;
        }

        let next = previous.component_mul(&fitness) / overall;
        let distance = (&next - &previous).norm();
        for (node, &w) in nodes.iter_mut().zip(next.iter()) {
            node.weight = w;
        }
        Some(distance)
    }
}
