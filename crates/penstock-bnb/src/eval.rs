// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! # Constraint Evaluator
//!
//! Classifies the simulator state after one period advance. The checks run
//! in a fixed short-circuit order (LEVELS, TIMESTEP, COST, PRESSURES,
//! STABILITY on the horizon leaf, ACTUATIONS) and the first failing class
//! is reported. The order is part of the engine's observable behavior: it
//! decides which statistics bucket a pruned branch lands in, and it keeps
//! the cheap tank reads ahead of the pressure queries.

use crate::cursor::SimulatorCursor;
use crate::path::DecisionPath;
use penstock_model::network::Network;
use penstock_sim::engine::HydraulicEngine;
use penstock_sim::err::EngineResult;

/// The feasibility classification of a search state. `None` means the
/// state is feasible so far; every other variant names the first violated
/// constraint class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PruneReason {
    /// Feasible so far.
    None,
    /// A monitored node is below its minimum pressure.
    Pressures,
    /// A tank head left its admissible band.
    Levels,
    /// A tank would end the horizon below its initial head.
    Stability,
    /// The accumulated cost reached the incumbent bound.
    Cost,
    /// A pump exceeded its per-pump transition budget.
    Actuations,
    /// The hydraulic step was fractional: a mid-period event is
    /// inconsistent with the period-boundary decision model.
    Timestep,
}

impl PruneReason {
    /// All classification values, in statistics order.
    pub const ALL: [PruneReason; 7] = [
        PruneReason::None,
        PruneReason::Pressures,
        PruneReason::Levels,
        PruneReason::Stability,
        PruneReason::Cost,
        PruneReason::Actuations,
        PruneReason::Timestep,
    ];

    /// The statistics/JSON label of this class.
    #[inline]
    pub const fn label(&self) -> &'static str {
        match self {
            PruneReason::None => "NONE",
            PruneReason::Pressures => "PRESSURES",
            PruneReason::Levels => "LEVELS",
            PruneReason::Stability => "STABILITY",
            PruneReason::Cost => "COST",
            PruneReason::Actuations => "ACTUATIONS",
            PruneReason::Timestep => "TIMESTEP",
        }
    }

    /// The index of this class in statistics tables.
    #[inline]
    pub const fn index(&self) -> usize {
        match self {
            PruneReason::None => 0,
            PruneReason::Pressures => 1,
            PruneReason::Levels => 2,
            PruneReason::Stability => 3,
            PruneReason::Cost => 4,
            PruneReason::Actuations => 5,
            PruneReason::Timestep => 6,
        }
    }
}

impl std::fmt::Display for PruneReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The evaluator's verdict on one search state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// The first failing constraint class, or `None`.
    pub reason: PruneReason,
    /// The accumulated pump energy cost, when the evaluation got far
    /// enough to read it (the cost bound check and everything after it).
    pub cost: Option<f64>,
}

impl Evaluation {
    #[inline]
    fn pruned(reason: PruneReason) -> Self {
        Self { reason, cost: None }
    }

    #[inline]
    fn pruned_at_cost(reason: PruneReason, cost: f64) -> Self {
        Self {
            reason,
            cost: Some(cost),
        }
    }

    /// Returns `true` if the state is feasible so far.
    #[inline]
    pub fn is_feasible(&self) -> bool {
        self.reason == PruneReason::None
    }
}

/// Evaluates hydraulic feasibility of the current simulator state against
/// the network's constraint set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConstraintEvaluator {
    /// Optional per-pump ceiling on speed transitions across the horizon;
    /// both switch directions count. Disabled when `None`.
    max_actuations: Option<u32>,
}

impl ConstraintEvaluator {
    /// Creates an evaluator without an actuation budget.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an evaluator with a per-pump transition ceiling.
    #[inline]
    pub fn with_max_actuations(max_actuations: Option<u32>) -> Self {
        Self { max_actuations }
    }

    /// Returns the configured actuation ceiling.
    #[inline]
    pub fn max_actuations(&self) -> Option<u32> {
        self.max_actuations
    }

    /// Classifies the simulator state after a period advance.
    ///
    /// `dt` is the hydraulic step length the advance just returned,
    /// `bound` is `min(best_cost_local, best_cost_global)`, and
    /// `at_horizon` selects the end-of-horizon stability check.
    ///
    /// Engine read failures surface as errors; they are not prune
    /// classifications.
    pub fn evaluate<E>(
        &self,
        cursor: &SimulatorCursor<'_, E>,
        network: &Network,
        path: &DecisionPath,
        dt: i64,
        bound: f64,
        at_horizon: bool,
    ) -> EngineResult<Evaluation>
    where
        E: HydraulicEngine,
    {
        // LEVELS: every tank head must stay inside its admissible band.
        for tank in network.tanks() {
            let head = cursor.tank_head(tank)?;
            if !tank.levels().contains(head) {
                return Ok(Evaluation::pruned(PruneReason::Levels));
            }
        }

        // TIMESTEP: the decision model changes pump states only at period
        // boundaries; a fractional step means a mid-period hydraulic event.
        if dt != 0 && dt != network.hyd_timestep() {
            return Ok(Evaluation::pruned(PruneReason::Timestep));
        }

        // COST: the branch-and-bound bound rule.
        let cost = cursor.total_cost(network)?;
        if cost >= bound {
            return Ok(Evaluation::pruned_at_cost(PruneReason::Cost, cost));
        }

        // PRESSURES: every monitored node must hold its threshold.
        for monitor in network.monitors() {
            let pressure = cursor.node_pressure(monitor)?;
            if pressure < monitor.min_pressure() {
                return Ok(Evaluation::pruned_at_cost(PruneReason::Pressures, cost));
            }
        }

        // STABILITY: only at the horizon leaf; the schedule must leave
        // every tank at least as full as it began.
        if at_horizon {
            for tank in network.tanks() {
                let head = cursor.tank_head(tank)?;
                if head < tank.initial_level() {
                    return Ok(Evaluation::pruned_at_cost(PruneReason::Stability, cost));
                }
            }
        }

        // ACTUATIONS: optional per-pump transition budget.
        if let Some(ceiling) = self.max_actuations {
            for pump in 0..path.num_pumps() {
                if path.transitions(pump) > ceiling {
                    return Ok(Evaluation::pruned_at_cost(PruneReason::Actuations, cost));
                }
            }
        }

        Ok(Evaluation {
            reason: PruneReason::None,
            cost: Some(cost),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_match_reference_names() {
        let labels: Vec<&str> = PruneReason::ALL.iter().map(|r| r.label()).collect();
        assert_eq!(
            labels,
            vec![
                "NONE",
                "PRESSURES",
                "LEVELS",
                "STABILITY",
                "COST",
                "ACTUATIONS",
                "TIMESTEP"
            ]
        );
    }

    #[test]
    fn test_indices_are_dense_and_stable() {
        for (expected, reason) in PruneReason::ALL.iter().enumerate() {
            assert_eq!(reason.index(), expected);
        }
    }

    #[test]
    fn test_evaluation_feasibility() {
        assert!(Evaluation {
            reason: PruneReason::None,
            cost: Some(1.0)
        }
        .is_feasible());
        assert!(!Evaluation::pruned(PruneReason::Levels).is_feasible());
    }

    #[test]
    fn test_display_uses_labels() {
        assert_eq!(format!("{}", PruneReason::Timestep), "TIMESTEP");
        assert_eq!(format!("{}", PruneReason::None), "NONE");
    }
}
