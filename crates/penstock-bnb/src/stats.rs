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

//! # Search Statistics
//!
//! Per-depth counters per prune reason. `add` is called exactly once per
//! evaluator invocation; the sum over all buckets therefore equals the
//! number of evaluations. Simulator-error branch abandonments are tallied
//! in a separate per-depth lane because they are not evaluator verdicts.
//!
//! Depths are 1-based hours: the evaluation of period `h` (0-based) lands
//! in bucket `h + 1`, so arrays have length `horizon + 1` and index 0 is
//! never used by the search itself.

use crate::eval::PruneReason;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Counters of one worker's search, mergeable across workers.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchStatistics {
    /// `counts[reason.index()][h]`, each of length `horizon + 1`.
    counts: Vec<Vec<u64>>,
    /// Simulator-error branch abandonments per depth.
    sim_errors: Vec<u64>,
    /// Wall-clock duration of the search.
    duration: std::time::Duration,
}

impl SearchStatistics {
    /// Creates zeroed statistics for a horizon.
    pub fn new(horizon: usize) -> Self {
        Self {
            counts: vec![vec![0; horizon + 1]; PruneReason::ALL.len()],
            sim_errors: vec![0; horizon + 1],
            duration: std::time::Duration::ZERO,
        }
    }

    /// Returns the horizon these statistics cover.
    #[inline]
    pub fn horizon(&self) -> usize {
        self.sim_errors.len() - 1
    }

    /// Records one evaluator verdict at a depth.
    ///
    /// # Panics
    ///
    /// Panics if `depth` exceeds the horizon.
    #[inline]
    pub fn add(&mut self, reason: PruneReason, depth: usize) {
        self.counts[reason.index()][depth] += 1;
    }

    /// Records one simulator-error branch abandonment at a depth.
    #[inline]
    pub fn add_sim_error(&mut self, depth: usize) {
        self.sim_errors[depth] += 1;
    }

    /// Returns the per-depth counters of one reason.
    #[inline]
    pub fn counts(&self, reason: PruneReason) -> &[u64] {
        &self.counts[reason.index()]
    }

    /// Returns the per-depth simulator-error counters.
    #[inline]
    pub fn sim_errors(&self) -> &[u64] {
        &self.sim_errors
    }

    /// Returns the total number of evaluator invocations.
    pub fn total_evaluations(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Returns the total number of pruned branches (every verdict except
    /// `NONE`).
    pub fn total_prunes(&self) -> u64 {
        self.counts
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != PruneReason::None.index())
            .flat_map(|(_, row)| row.iter())
            .sum()
    }

    /// Sets the wall-clock duration.
    #[inline]
    pub fn set_duration(&mut self, duration: std::time::Duration) {
        self.duration = duration;
    }

    /// Returns the wall-clock duration.
    #[inline]
    pub fn duration(&self) -> std::time::Duration {
        self.duration
    }

    /// Merges another worker's counters into this one by element-wise sum.
    /// Durations take the maximum: workers run concurrently.
    ///
    /// # Panics
    ///
    /// Panics if the horizons differ.
    pub fn merge(&mut self, other: &SearchStatistics) {
        assert_eq!(
            self.horizon(),
            other.horizon(),
            "called `SearchStatistics::merge` with mismatched horizons: {} vs {}",
            self.horizon(),
            other.horizon()
        );

        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            for (m, t) in mine.iter_mut().zip(theirs.iter()) {
                *m += t;
            }
        }
        for (m, t) in self.sim_errors.iter_mut().zip(other.sim_errors.iter()) {
            *m += t;
        }
        self.duration = self.duration.max(other.duration);
    }
}

impl Serialize for SearchStatistics {
    /// The `stats.json` shape: one array of length `horizon + 1` per
    /// reason label, a `SIM_ERROR` array, and the duration in seconds.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(PruneReason::ALL.len() + 2))?;
        for reason in PruneReason::ALL {
            map.serialize_entry(reason.label(), self.counts(reason))?;
        }
        map.serialize_entry("SIM_ERROR", &self.sim_errors)?;
        map.serialize_entry("duration", &self.duration.as_secs_f64())?;
        map.end()
    }
}

impl std::fmt::Display for SearchStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Search Statistics:")?;
        writeln!(f, "  Duration: {:.3} seconds", self.duration.as_secs_f64())?;
        for reason in PruneReason::ALL {
            writeln!(f, "  {:>10}: {:?}", reason.label(), self.counts(reason))?;
        }
        writeln!(f, "  {:>10}: {:?}", "SIM_ERROR", self.sim_errors)?;
        Ok(())
    }
}
