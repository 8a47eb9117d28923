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

//! # Shared Incumbent (Best Schedule Holder)
//!
//! A concurrent container for the best feasible schedule discovered so far.
//! It exposes a fast, lock-free global cost bound via an atomic and stores
//! the actual [`Schedule`] behind a `Mutex` as the source of truth.
//!
//! ## Motivation
//!
//! Every constraint evaluation prunes against
//! `min(best_cost_local, best_cost_global)`. The global bound read sits on
//! the search's hottest path, so it must never lock; only installing an
//! improvement takes the mutex. A worker may transiently observe a stale,
//! higher bound than a peer has already published; pruning against a stale
//! bound is merely conservative, never incorrect.
//!
//! ## Concurrency
//!
//! - The cost bound is stored as the bit pattern of a non-negative `f64` in
//!   an `AtomicU64` with `Ordering::Relaxed`; for non-negative IEEE-754
//!   values the bit patterns order exactly like the numbers, and all
//!   correctness-sensitive state lives behind the mutex anyway.
//! - `f64::INFINITY` is the sentinel for "no incumbent yet", matching the
//!   unbounded initial cost of a worker that has not completed a schedule.

use penstock_model::schedule::Schedule;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// A concurrent holder for the best (incumbent) schedule found during
/// search.
#[derive(Debug)]
pub struct SharedIncumbent {
    /// Cost of the incumbent schedule stored as `f64` bits for atomic
    /// access. `f64::INFINITY` means no schedule has been installed yet.
    upper_bound_bits: AtomicU64,

    /// The incumbent schedule, protected by a mutex for safe concurrent
    /// access. The standard library mutex is entirely adequate here: it is
    /// only taken on improvements, which are rare compared to bound reads.
    schedule: Mutex<Option<Schedule>>,

    /// Number of successful installs; the run-level "schedules found"
    /// counter.
    installs: AtomicU64,
}

impl Default for SharedIncumbent {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedIncumbent {
    /// Creates a new shared incumbent with no schedule installed.
    #[inline]
    pub fn new() -> Self {
        Self {
            upper_bound_bits: AtomicU64::new(f64::INFINITY.to_bits()),
            schedule: Mutex::new(None),
            installs: AtomicU64::new(0),
        }
    }

    /// Creates a shared incumbent seeded with an initial cost bound but no
    /// schedule. Used to warm-start pruning.
    ///
    /// # Panics
    ///
    /// Panics if `bound` is negative or NaN.
    pub fn with_bound(bound: f64) -> Self {
        assert!(
            bound >= 0.0,
            "called `SharedIncumbent::with_bound` with invalid bound: {}",
            bound
        );
        Self {
            upper_bound_bits: AtomicU64::new(bound.to_bits()),
            schedule: Mutex::new(None),
            installs: AtomicU64::new(0),
        }
    }

    /// Returns the current global cost bound.
    #[inline]
    pub fn upper_bound(&self) -> f64 {
        f64::from_bits(self.upper_bound_bits.load(Ordering::Relaxed))
    }

    /// Returns a snapshot of the current incumbent schedule, if any.
    #[inline]
    pub fn snapshot(&self) -> Option<Schedule> {
        let guard = self
            .schedule
            .lock()
            .expect("incumbent mutex poisoned by a panicking worker");
        guard.clone()
    }

    /// Attempts to install the given candidate as the new incumbent.
    /// Returns `true` if the candidate was installed.
    ///
    /// # Panics
    ///
    /// Panics if the candidate cost is negative or NaN; schedule costs are
    /// sums of non-negative pump energy terms.
    pub fn try_install(&self, candidate: &Schedule) -> bool {
        let candidate_cost = candidate.cost();
        assert!(
            candidate_cost >= 0.0,
            "called `SharedIncumbent::try_install` with invalid cost: {}",
            candidate_cost
        );

        // Cheap pre-check against the atomic hint: obviously worse
        // candidates never touch the lock.
        if candidate_cost >= self.upper_bound() {
            return false;
        }

        let mut guard = self
            .schedule
            .lock()
            .expect("incumbent mutex poisoned by a panicking worker");
        // Another worker may have improved the incumbent while we were
        // waiting for the lock; compare against the actual schedule, not
        // the hint read earlier.
        if let Some(current) = guard.as_ref() {
            if candidate_cost >= current.cost() {
                return false;
            }
        }

        *guard = Some(candidate.clone());
        self.upper_bound_bits
            .store(candidate_cost.to_bits(), Ordering::Relaxed);
        self.installs.fetch_add(1, Ordering::Relaxed);

        true
    }

    /// Returns how many candidates have been installed over the run.
    #[inline]
    pub fn installs(&self) -> u64 {
        self.installs.load(Ordering::Relaxed)
    }
}

impl std::fmt::Display for SharedIncumbent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Incumbent(upper_bound: {})", self.upper_bound())
    }
}
