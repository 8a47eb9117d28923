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

use crate::stats::RunStatistics;
use penstock_model::schedule::Schedule;

/// The result of the solver after termination.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResult {
    /// The full tree was enumerated and no feasible schedule exists.
    Infeasible,
    /// A schedule was found and its optimality proven by exhaustion.
    Optimal(Schedule),
    /// A feasible schedule was found, but the search stopped before
    /// proving optimality.
    Feasible(Schedule),
    /// The search stopped without finding a schedule and without proving
    /// infeasibility.
    Unknown,
}

impl SearchResult {
    /// Returns the schedule cost if a schedule was found.
    #[inline]
    pub fn cost(&self) -> Option<f64> {
        match self {
            SearchResult::Optimal(schedule) | SearchResult::Feasible(schedule) => {
                Some(schedule.cost())
            }
            _ => None,
        }
    }

    /// Returns the found schedule, if any.
    #[inline]
    pub fn schedule(&self) -> Option<&Schedule> {
        match self {
            SearchResult::Optimal(schedule) | SearchResult::Feasible(schedule) => Some(schedule),
            _ => None,
        }
    }

    #[inline]
    pub fn unwrap_optimal(&self) -> &Schedule {
        match self {
            SearchResult::Optimal(schedule) => schedule,
            _ => panic!("called `SearchResult::unwrap_optimal()` on a non-optimal result"),
        }
    }
}

impl std::fmt::Display for SearchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchResult::Infeasible => write!(f, "Infeasible"),
            SearchResult::Optimal(schedule) => write!(f, "Optimal(cost={:.2})", schedule.cost()),
            SearchResult::Feasible(schedule) => write!(f, "Feasible(cost={:.2})", schedule.cost()),
            SearchResult::Unknown => write!(f, "Unknown"),
        }
    }
}

/// The reason for the solver's termination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// Every worker exhausted its partition of the tree with an incumbent.
    OptimalityProven,
    /// Every worker exhausted its partition without any feasible schedule.
    InfeasibilityProven,
    /// The search was stopped early (time limit, interrupt, repeated
    /// simulator failures). The string names the cause.
    Aborted(String),
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::OptimalityProven => write!(f, "Optimality Proven"),
            TerminationReason::InfeasibilityProven => write!(f, "Infeasibility Proven"),
            TerminationReason::Aborted(cause) => write!(f, "Aborted: {}", cause),
        }
    }
}

/// The complete outcome of a solver run: result, termination reason, and
/// run-level statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    result: SearchResult,
    reason: TerminationReason,
    statistics: RunStatistics,
}

impl SolveOutcome {
    /// Creates an outcome for a proven-optimal schedule.
    #[inline]
    pub fn optimal(schedule: Schedule, statistics: RunStatistics) -> Self {
        Self {
            result: SearchResult::Optimal(schedule),
            reason: TerminationReason::OptimalityProven,
            statistics,
        }
    }

    /// Creates an outcome for a proven-infeasible problem.
    #[inline]
    pub fn infeasible(statistics: RunStatistics) -> Self {
        Self {
            result: SearchResult::Infeasible,
            reason: TerminationReason::InfeasibilityProven,
            statistics,
        }
    }

    /// Creates an outcome for a feasible schedule found before abortion.
    #[inline]
    pub fn feasible<R>(schedule: Schedule, abort_reason: R, statistics: RunStatistics) -> Self
    where
        R: Into<String>,
    {
        Self {
            result: SearchResult::Feasible(schedule),
            reason: TerminationReason::Aborted(abort_reason.into()),
            statistics,
        }
    }

    /// Creates an outcome for an aborted run without any schedule.
    #[inline]
    pub fn unknown<R>(abort_reason: R, statistics: RunStatistics) -> Self
    where
        R: Into<String>,
    {
        Self {
            result: SearchResult::Unknown,
            reason: TerminationReason::Aborted(abort_reason.into()),
            statistics,
        }
    }

    /// Returns the search result.
    #[inline]
    pub fn result(&self) -> &SearchResult {
        &self.result
    }

    /// Returns the termination reason.
    #[inline]
    pub fn reason(&self) -> &TerminationReason {
        &self.reason
    }

    /// Returns the run statistics.
    #[inline]
    pub fn statistics(&self) -> &RunStatistics {
        &self.statistics
    }

    /// Returns `true` if optimality was proven.
    #[inline]
    pub fn is_optimal(&self) -> bool {
        matches!(self.result, SearchResult::Optimal(_))
    }

    /// Returns `true` if infeasibility was proven.
    #[inline]
    pub fn is_infeasible(&self) -> bool {
        matches!(self.result, SearchResult::Infeasible)
    }

    /// Returns `true` if any schedule was found.
    #[inline]
    pub fn has_schedule(&self) -> bool {
        matches!(
            self.result,
            SearchResult::Optimal(_) | SearchResult::Feasible(_)
        )
    }
}

impl std::fmt::Display for SolveOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Result: {}", self.result)?;
        writeln!(f, "Termination: {}", self.reason)?;
        write!(f, "{}", self.statistics)?;
        Ok(())
    }
}
