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
use penstock_search::monitor::search_monitor::SearchCommand;

/// A tree monitor that fans every event out to a list of child monitors.
/// The first child requesting termination wins.
#[derive(Default)]
pub struct CompositeTreeMonitor<'a> {
    monitors: Vec<Box<dyn TreeSearchMonitor + 'a>>,
}

impl<'a> CompositeTreeMonitor<'a> {
    /// Creates an empty composite.
    #[inline]
    pub fn new() -> Self {
        Self {
            monitors: Vec::new(),
        }
    }

    /// Adds a child monitor.
    #[inline]
    pub fn add_monitor<M>(&mut self, monitor: M)
    where
        M: TreeSearchMonitor + 'a,
    {
        self.monitors.push(Box::new(monitor));
    }

    /// Returns the number of child monitors.
    #[inline]
    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    /// Returns `true` if there are no child monitors.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

impl<'a> TreeSearchMonitor for CompositeTreeMonitor<'a> {
    fn name(&self) -> &str {
        "CompositeTreeMonitor"
    }

    fn on_enter_search(&mut self, network: &Network, statistics: &SearchStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_enter_search(network, statistics);
        }
    }

    fn on_exit_search(&mut self, statistics: &SearchStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_exit_search(statistics);
        }
    }

    fn search_command(&mut self, statistics: &SearchStatistics) -> SearchCommand {
        for monitor in &mut self.monitors {
            if let SearchCommand::Terminate(cause) = monitor.search_command(statistics) {
                return SearchCommand::Terminate(cause);
            }
        }
        SearchCommand::Continue
    }

    #[inline]
    fn on_step(&mut self, depth: usize, statistics: &SearchStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_step(depth, statistics);
        }
    }

    fn on_descend(&mut self, depth: usize, actuation: u32, statistics: &SearchStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_descend(depth, actuation, statistics);
        }
    }

    fn on_backtrack(&mut self, depth: usize, statistics: &SearchStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_backtrack(depth, statistics);
        }
    }

    fn on_prune(&mut self, reason: PruneReason, depth: usize, statistics: &SearchStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_prune(reason, depth, statistics);
        }
    }

    fn on_schedule_found(&mut self, schedule: &Schedule, statistics: &SearchStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_schedule_found(schedule, statistics);
        }
    }
}
