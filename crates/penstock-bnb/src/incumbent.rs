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

use penstock_model::schedule::Schedule;
use penstock_search::incumbent::SharedIncumbent;

/// The engine's view of the incumbent bound. In a parallel run the backing
/// publishes local improvements to peers and folds the peers' global bound
/// into the local one; in an isolated run it is a no-op.
///
/// The `tighten` read is non-blocking and may observe a stale (higher)
/// global bound; pruning against a stale bound is conservative, so the
/// search stays correct.
pub trait IncumbentStore {
    /// Returns the bound the search starts from.
    fn initial_upper_bound(&self) -> f64;
    /// Folds the shared global bound into the worker's local best.
    fn tighten(&self, current_local_best: f64) -> f64;
    /// Publishes a newly found schedule.
    fn on_schedule_found(&self, schedule: &Schedule);
}

/// Backing for single-worker runs: nothing is shared.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSharedIncumbent;

impl NoSharedIncumbent {
    /// Creates a new `NoSharedIncumbent`.
    #[inline(always)]
    pub fn new() -> Self {
        Self
    }
}

impl IncumbentStore for NoSharedIncumbent {
    #[inline(always)]
    fn initial_upper_bound(&self) -> f64 {
        f64::INFINITY
    }

    #[inline(always)]
    fn tighten(&self, current_local_best: f64) -> f64 {
        current_local_best
    }

    #[inline(always)]
    fn on_schedule_found(&self, _schedule: &Schedule) {}
}

/// Backing that shares the incumbent between workers through a
/// [`SharedIncumbent`].
#[repr(transparent)]
#[derive(Debug, Clone)]
pub struct SharedIncumbentAdapter<'a> {
    inner: &'a SharedIncumbent,
}

impl<'a> SharedIncumbentAdapter<'a> {
    /// Creates an adapter over the given shared incumbent.
    #[inline(always)]
    pub fn new(inner: &'a SharedIncumbent) -> Self {
        Self { inner }
    }
}

impl<'a> IncumbentStore for SharedIncumbentAdapter<'a> {
    #[inline(always)]
    fn initial_upper_bound(&self) -> f64 {
        self.inner.upper_bound()
    }

    #[inline(always)]
    fn tighten(&self, current_local_best: f64) -> f64 {
        self.inner.upper_bound().min(current_local_best)
    }

    #[inline(always)]
    fn on_schedule_found(&self, schedule: &Schedule) {
        self.inner.try_install(schedule);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(cost: f64) -> Schedule {
        Schedule::new(cost, vec![1, 1, 1], vec![7])
    }

    #[test]
    fn test_no_shared_backing_is_inert() {
        let backing = NoSharedIncumbent::new();
        assert_eq!(backing.initial_upper_bound(), f64::INFINITY);
        assert_eq!(backing.tighten(42.0), 42.0);
        backing.on_schedule_found(&schedule(1.0));
    }

    #[test]
    fn test_shared_adapter_tightens_from_peers() {
        let shared = SharedIncumbent::new();
        let backing = SharedIncumbentAdapter::new(&shared);
        assert_eq!(backing.initial_upper_bound(), f64::INFINITY);

        // A peer publishes a schedule; our local bound tightens.
        shared.try_install(&schedule(30.0));
        assert_eq!(backing.tighten(100.0), 30.0);
        // A better local bound is kept.
        assert_eq!(backing.tighten(10.0), 10.0);
    }

    #[test]
    fn test_shared_adapter_publishes_improvements() {
        let shared = SharedIncumbent::new();
        let backing = SharedIncumbentAdapter::new(&shared);
        backing.on_schedule_found(&schedule(55.0));
        assert_eq!(shared.upper_bound(), 55.0);
        backing.on_schedule_found(&schedule(80.0));
        assert_eq!(shared.upper_bound(), 55.0);
    }
}
