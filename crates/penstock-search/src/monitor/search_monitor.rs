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

use penstock_model::network::Network;
use penstock_model::schedule::Schedule;

/// A command returned by a monitor to steer the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCommand {
    /// Keep searching.
    Continue,
    /// Stop the search; the string names the cause.
    Terminate(String),
}

/// A generic observer/controller of a running search, independent of the
/// concrete search engine. Monitors see coarse events only; the
/// branch-and-bound engine has its own richer tree-level monitor.
pub trait SearchMonitor {
    /// Returns the name of the monitor.
    fn name(&self) -> &str;
    /// Called when the search starts.
    fn on_enter_search(&mut self, network: &Network);
    /// Called when the search ends.
    fn on_exit_search(&mut self);
    /// Called when a new feasible schedule is found.
    fn on_solution_found(&mut self, schedule: &Schedule);
    /// Called at each search step.
    fn on_step(&mut self);
    /// Called to determine whether the search should continue.
    fn search_command(&self) -> SearchCommand;
}

impl std::fmt::Debug for dyn SearchMonitor + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SearchMonitor({})", self.name())
    }
}

/// A monitor that observes nothing and never terminates the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DummyMonitor;

impl DummyMonitor {
    /// Creates a new `DummyMonitor`.
    #[inline(always)]
    pub fn new() -> Self {
        Self
    }
}

impl SearchMonitor for DummyMonitor {
    #[inline(always)]
    fn name(&self) -> &str {
        "DummyMonitor"
    }

    #[inline(always)]
    fn on_enter_search(&mut self, _network: &Network) {}

    #[inline(always)]
    fn on_exit_search(&mut self) {}

    #[inline(always)]
    fn on_solution_found(&mut self, _schedule: &Schedule) {}

    #[inline(always)]
    fn on_step(&mut self) {}

    #[inline(always)]
    fn search_command(&self) -> SearchCommand {
        SearchCommand::Continue
    }
}
