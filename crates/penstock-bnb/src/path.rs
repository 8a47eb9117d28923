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

//! # Decision Path
//!
//! The partial schedule of the current search branch. The path is the only
//! owner of the coupled decision views: pushing an actuation index appends
//! both the `y` entry and its decoded speed slice, popping removes both.
//! Callers never mutate one view without the other.

use penstock_model::encoding::{ActuationCoder, SpeedVector};
use penstock_model::schedule::Schedule;

/// The decision prefix of the branch currently being explored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionPath {
    coder: ActuationCoder,
    actuations: Vec<u32>,
    speeds: Vec<u8>,
}

impl DecisionPath {
    /// Creates an empty path for the given coder.
    pub fn new(coder: ActuationCoder) -> Self {
        Self {
            coder,
            actuations: Vec::new(),
            speeds: Vec::new(),
        }
    }

    /// Creates an empty path preallocated for a horizon.
    pub fn preallocated(coder: ActuationCoder, horizon: usize) -> Self {
        let num_pumps = coder.num_pumps();
        Self {
            coder,
            actuations: Vec::with_capacity(horizon),
            speeds: Vec::with_capacity(horizon * num_pumps),
        }
    }

    /// Returns the coder defining the decision space.
    #[inline]
    pub fn coder(&self) -> &ActuationCoder {
        &self.coder
    }

    /// Returns the number of decided periods.
    #[inline]
    pub fn depth(&self) -> usize {
        self.actuations.len()
    }

    /// Returns the number of pumps per period.
    #[inline]
    pub fn num_pumps(&self) -> usize {
        self.coder.num_pumps()
    }

    /// Returns `true` if no period has been decided.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.actuations.is_empty()
    }

    /// Appends the decision for the next period and returns its decoded
    /// speed vector.
    ///
    /// # Panics
    ///
    /// Panics if `actuation` is outside the coder's decision space.
    pub fn push(&mut self, actuation: u32) -> SpeedVector {
        let speeds = self.coder.decode(actuation);
        self.actuations.push(actuation);
        self.speeds.extend_from_slice(&speeds);
        speeds
    }

    /// Removes the most recent period decision.
    ///
    /// # Panics
    ///
    /// Panics if the path is empty.
    pub fn pop(&mut self) {
        assert!(
            !self.actuations.is_empty(),
            "called `DecisionPath::pop` on an empty path"
        );
        self.actuations.pop();
        self.speeds.truncate(self.speeds.len() - self.coder.num_pumps());
    }

    /// Returns the actuation indices of the decided prefix.
    #[inline]
    pub fn actuations(&self) -> &[u32] {
        &self.actuations
    }

    /// Returns the flat speed vector of the decided prefix.
    #[inline]
    pub fn speeds(&self) -> &[u8] {
        &self.speeds
    }

    /// Returns the speed slice of one decided period.
    ///
    /// # Panics
    ///
    /// Panics if `period` has not been decided.
    #[inline]
    pub fn speeds_for_period(&self, period: usize) -> &[u8] {
        let num_pumps = self.coder.num_pumps();
        &self.speeds[period * num_pumps..(period + 1) * num_pumps]
    }

    /// Counts the speed transitions of one pump across the decided prefix.
    /// Both switch directions count; a speed change between two running
    /// levels does not.
    pub fn transitions(&self, pump: usize) -> u32 {
        debug_assert!(
            pump < self.coder.num_pumps(),
            "called `DecisionPath::transitions` with pump index out of bounds: the len is {} but the index is {}",
            self.coder.num_pumps(),
            pump
        );

        let num_pumps = self.coder.num_pumps();
        let mut transitions = 0;
        for period in 1..self.depth() {
            let previous = self.speeds[(period - 1) * num_pumps + pump] > 0;
            let current = self.speeds[period * num_pumps + pump] > 0;
            if previous != current {
                transitions += 1;
            }
        }
        transitions
    }

    /// Snapshots the full path into a schedule with the given cost.
    pub fn to_schedule(&self, cost: f64) -> Schedule {
        Schedule::new(cost, self.speeds.clone(), self.actuations.clone())
    }

    /// Clears the path, keeping allocated capacity.
    #[inline]
    pub fn reset(&mut self) {
        self.actuations.clear();
        self.speeds.clear();
    }
}

impl std::fmt::Display for DecisionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DecisionPath(depth: {}, y: {:?})", self.depth(), self.actuations)
    }
}
