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

use crate::eval::PruneReason;
use crate::stats::SearchStatistics;
use penstock_model::network::Network;
use penstock_model::schedule::Schedule;
use penstock_search::monitor::search_monitor::SearchCommand;

/// Trait for observing and controlling the branch-and-bound tree search.
/// Richer than the generic `SearchMonitor`: it sees descends, backtracks
/// and classified prunes.
pub trait TreeSearchMonitor {
    /// Returns the name of the monitor.
    fn name(&self) -> &str;
    /// Called when the search starts.
    fn on_enter_search(&mut self, network: &Network, statistics: &SearchStatistics);
    /// Called when the search ends.
    fn on_exit_search(&mut self, statistics: &SearchStatistics);
    /// Called to determine the next action of the search.
    fn search_command(&mut self, _statistics: &SearchStatistics) -> SearchCommand {
        SearchCommand::Continue
    }
    /// Called once per search-loop iteration.
    fn on_step(&mut self, depth: usize, statistics: &SearchStatistics);
    /// Called when descending after a feasible period decision.
    fn on_descend(&mut self, depth: usize, actuation: u32, statistics: &SearchStatistics);
    /// Called when backtracking to the parent depth.
    fn on_backtrack(&mut self, depth: usize, statistics: &SearchStatistics);
    /// Called when a branch is pruned with a classified reason.
    fn on_prune(&mut self, reason: PruneReason, depth: usize, statistics: &SearchStatistics);
    /// Called when a new incumbent schedule is found.
    fn on_schedule_found(&mut self, schedule: &Schedule, statistics: &SearchStatistics);
}

impl std::fmt::Debug for dyn TreeSearchMonitor + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TreeSearchMonitor({})", self.name())
    }
}

/// A monitor that does nothing on any event and never terminates the
/// search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoOperationMonitor;

impl NoOperationMonitor {
    /// Creates a new `NoOperationMonitor`.
    #[inline(always)]
    pub fn new() -> Self {
        Self
    }
}

impl TreeSearchMonitor for NoOperationMonitor {
    #[inline(always)]
    fn name(&self) -> &str {
        "NoOperationMonitor"
    }

    #[inline(always)]
    fn on_enter_search(&mut self, _network: &Network, _statistics: &SearchStatistics) {}

    #[inline(always)]
    fn on_exit_search(&mut self, _statistics: &SearchStatistics) {}

    #[inline(always)]
    fn on_step(&mut self, _depth: usize, _statistics: &SearchStatistics) {}

    #[inline(always)]
    fn on_descend(&mut self, _depth: usize, _actuation: u32, _statistics: &SearchStatistics) {}

    #[inline(always)]
    fn on_backtrack(&mut self, _depth: usize, _statistics: &SearchStatistics) {}

    #[inline(always)]
    fn on_prune(&mut self, _reason: PruneReason, _depth: usize, _statistics: &SearchStatistics) {}

    #[inline(always)]
    fn on_schedule_found(&mut self, _schedule: &Schedule, _statistics: &SearchStatistics) {}
}
