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
use crate::monitor::tree::TreeSearchMonitor;
use crate::stats::SearchStatistics;
use penstock_model::network::Network;
use penstock_model::schedule::Schedule;
use penstock_search::monitor::search_monitor::{SearchCommand, SearchMonitor};

/// Bridges a generic [`SearchMonitor`] (time limit, interrupt, composite)
/// into the tree-search monitor interface. Tree-level events the generic
/// monitor cannot express are dropped; steps, solutions and the command
/// channel pass through.
#[derive(Debug)]
pub struct WrapperMonitor<'a, M>
where
    M: SearchMonitor,
{
    inner: &'a mut M,
}

impl<'a, M> WrapperMonitor<'a, M>
where
    M: SearchMonitor,
{
    /// Creates a wrapper over the given generic monitor.
    #[inline]
    pub fn new(inner: &'a mut M) -> Self {
        Self { inner }
    }
}

impl<'a, M> TreeSearchMonitor for WrapperMonitor<'a, M>
where
    M: SearchMonitor,
{
    fn name(&self) -> &str {
        "WrapperMonitor"
    }

    fn on_enter_search(&mut self, network: &Network, _statistics: &SearchStatistics) {
        self.inner.on_enter_search(network);
    }

    fn on_exit_search(&mut self, _statistics: &SearchStatistics) {
        self.inner.on_exit_search();
    }

    fn search_command(&mut self, _statistics: &SearchStatistics) -> SearchCommand {
        self.inner.search_command()
    }

    #[inline(always)]
    fn on_step(&mut self, _depth: usize, _statistics: &SearchStatistics) {
        self.inner.on_step();
    }

    #[inline(always)]
    fn on_descend(&mut self, _depth: usize, _actuation: u32, _statistics: &SearchStatistics) {}

    #[inline(always)]
    fn on_backtrack(&mut self, _depth: usize, _statistics: &SearchStatistics) {}

    #[inline(always)]
    fn on_prune(&mut self, _reason: PruneReason, _depth: usize, _statistics: &SearchStatistics) {}

    fn on_schedule_found(&mut self, schedule: &Schedule, _statistics: &SearchStatistics) {
        self.inner.on_solution_found(schedule);
    }
}
