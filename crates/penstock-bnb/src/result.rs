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

use crate::stats::SearchStatistics;
use penstock_model::schedule::Schedule;
use penstock_search::result::TerminationReason;

/// The outcome of one worker's branch-and-bound run over its partition of
/// the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerOutcome {
    schedule: Option<Schedule>,
    termination: TerminationReason,
    statistics: SearchStatistics,
}

impl WorkerOutcome {
    /// The worker exhausted its partition and holds its best schedule.
    #[inline]
    pub fn exhausted_with(schedule: Schedule, statistics: SearchStatistics) -> Self {
        Self {
            schedule: Some(schedule),
            termination: TerminationReason::OptimalityProven,
            statistics,
        }
    }

    /// The worker exhausted its partition without finding any feasible
    /// schedule. With bound sharing this proves nothing on its own; the
    /// coordinator aggregates.
    #[inline]
    pub fn exhausted_empty(statistics: SearchStatistics) -> Self {
        Self {
            schedule: None,
            termination: TerminationReason::InfeasibilityProven,
            statistics,
        }
    }

    /// The worker stopped early; the best schedule so far (if any) rides
    /// along.
    #[inline]
    pub fn aborted<R>(schedule: Option<Schedule>, cause: R, statistics: SearchStatistics) -> Self
    where
        R: Into<String>,
    {
        Self {
            schedule,
            termination: TerminationReason::Aborted(cause.into()),
            statistics,
        }
    }

    /// Returns the worker's best schedule, if any.
    #[inline]
    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    /// Returns the termination reason.
    #[inline]
    pub fn termination(&self) -> &TerminationReason {
        &self.termination
    }

    /// Returns the worker's statistics.
    #[inline]
    pub fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    /// Returns `true` if the worker ran its partition to exhaustion.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        !matches!(self.termination, TerminationReason::Aborted(_))
    }
}

impl std::fmt::Display for WorkerOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.schedule {
            Some(schedule) => write!(
                f,
                "WorkerOutcome(best_cost: {:.2}, termination: {})",
                schedule.cost(),
                self.termination
            ),
            None => write!(f, "WorkerOutcome(no schedule, termination: {})", self.termination),
        }
    }
}
