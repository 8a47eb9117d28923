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
use std::time::{Duration, Instant};

/// A tree monitor that reports search progress through `tracing`.
///
/// Progress lines are rate-limited the same way the time-limit monitor
/// samples its clock: a cheap bitmask on the step counter gates the
/// interval check.
#[derive(Debug, Clone)]
pub struct TraceMonitor {
    rank: usize,
    start_time: Instant,
    last_log_time: Instant,
    log_interval: Duration,
    clock_check_mask: u64,
    steps: u64,
    best_cost: Option<f64>,
}

impl TraceMonitor {
    /// Creates a trace monitor for a worker rank.
    pub fn new(rank: usize, log_interval: Duration, clock_check_mask: u64) -> Self {
        Self {
            rank,
            start_time: Instant::now(),
            last_log_time: Instant::now(),
            log_interval,
            clock_check_mask,
            steps: 0,
            best_cost: None,
        }
    }

    fn log_progress(&mut self, depth: usize, statistics: &SearchStatistics) {
        let elapsed = self.start_time.elapsed().as_secs_f32();
        let best = self
            .best_cost
            .map_or_else(|| "inf".to_string(), |cost| format!("{:.2}", cost));
        tracing::info!(
            rank = self.rank,
            elapsed_secs = elapsed,
            depth,
            evaluations = statistics.total_evaluations(),
            prunes = statistics.total_prunes(),
            best_cost = %best,
            "search progress"
        );
        self.last_log_time = Instant::now();
    }
}

impl Default for TraceMonitor {
    fn default() -> Self {
        Self::new(0, Duration::from_secs(1), 4095)
    }
}

impl TreeSearchMonitor for TraceMonitor {
    fn name(&self) -> &str {
        "TraceMonitor"
    }

    fn on_enter_search(&mut self, network: &Network, _statistics: &SearchStatistics) {
        self.start_time = Instant::now();
        self.last_log_time = self.start_time;
        self.best_cost = None;
        self.steps = 0;
        tracing::info!(
            rank = self.rank,
            pumps = network.num_pumps(),
            tanks = network.num_tanks(),
            monitors = network.num_monitors(),
            "search started"
        );
    }

    fn on_step(&mut self, _depth: usize, _statistics: &SearchStatistics) {
        self.steps = self.steps.wrapping_add(1);
    }

    fn on_descend(&mut self, depth: usize, _actuation: u32, statistics: &SearchStatistics) {
        if (self.steps & self.clock_check_mask) == 0
            && self.last_log_time.elapsed() >= self.log_interval
        {
            self.log_progress(depth, statistics);
        }
    }

    fn on_backtrack(&mut self, _depth: usize, _statistics: &SearchStatistics) {}

    fn on_prune(&mut self, reason: PruneReason, depth: usize, _statistics: &SearchStatistics) {
        tracing::trace!(rank = self.rank, %reason, depth, "branch pruned");
    }

    fn on_schedule_found(&mut self, schedule: &Schedule, _statistics: &SearchStatistics) {
        self.best_cost = Some(schedule.cost());
        tracing::info!(
            rank = self.rank,
            best_cost = schedule.cost(),
            "incumbent improved"
        );
    }

    fn on_exit_search(&mut self, statistics: &SearchStatistics) {
        tracing::info!(
            rank = self.rank,
            evaluations = statistics.total_evaluations(),
            prunes = statistics.total_prunes(),
            "search finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_tracks_best_cost() {
        let mut monitor = TraceMonitor::default();
        assert_eq!(monitor.best_cost, None);

        let schedule = Schedule::new(12.0, vec![1, 0, 1], vec![5]);
        monitor.on_schedule_found(&schedule, &SearchStatistics::new(1));
        assert_eq!(monitor.best_cost, Some(12.0));
    }

    #[test]
    fn test_step_counter_wraps() {
        let mut monitor = TraceMonitor::default();
        monitor.steps = u64::MAX;
        monitor.on_step(0, &SearchStatistics::new(1));
        assert_eq!(monitor.steps, 0);
    }
}
