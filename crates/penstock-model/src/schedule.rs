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

use crate::encoding::ActuationCoder;
use serde::{Deserialize, Serialize};

/// A complete feasible pump schedule: the incumbent snapshot of the search.
///
/// Holds the total energy cost together with the two coupled views of the
/// decision sequence: the flat per-pump speed vector `x` (pump-major within
/// each period) and the per-period actuation indices `y`. The JSON shape is
/// the persisted `solution.json` format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// The total pump energy cost of this schedule.
    #[serde(rename = "best_cost")]
    cost: f64,

    /// The per-pump speed factors; `speeds[h * P + p]` is pump `p`'s speed
    /// in period `h`.
    #[serde(rename = "best_x")]
    speeds: Vec<u8>,

    /// The per-period actuation indices; `actuations[h]` encodes period
    /// `h`'s speed vector.
    #[serde(rename = "best_y")]
    actuations: Vec<u32>,
}

impl Schedule {
    /// Constructs a new `Schedule`.
    ///
    /// # Panics
    ///
    /// Panics if the speed vector length is not a multiple of the number of
    /// periods (the two views must describe the same horizon).
    pub fn new(cost: f64, speeds: Vec<u8>, actuations: Vec<u32>) -> Self {
        if actuations.is_empty() {
            assert!(
                speeds.is_empty(),
                "called Schedule::new with speeds for an empty horizon: speeds.len() = {}",
                speeds.len()
            );
        } else {
            assert!(
                speeds.len() % actuations.len() == 0,
                "called Schedule::new with inconsistent vector lengths: speeds.len() = {}, actuations.len() = {}",
                speeds.len(),
                actuations.len()
            );
        }

        Self {
            cost,
            speeds,
            actuations,
        }
    }

    /// The zero-period schedule with zero cost.
    #[inline]
    pub fn empty() -> Self {
        Self::new(0.0, Vec::new(), Vec::new())
    }

    /// Returns the total cost.
    #[inline]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Returns the flat per-pump speed vector.
    #[inline]
    pub fn speeds(&self) -> &[u8] {
        &self.speeds
    }

    /// Returns the per-period actuation indices.
    #[inline]
    pub fn actuations(&self) -> &[u32] {
        &self.actuations
    }

    /// Returns the number of periods covered.
    #[inline]
    pub fn num_periods(&self) -> usize {
        self.actuations.len()
    }

    /// Returns the number of pumps per period, or zero for the empty
    /// schedule.
    #[inline]
    pub fn num_pumps(&self) -> usize {
        if self.actuations.is_empty() {
            0
        } else {
            self.speeds.len() / self.actuations.len()
        }
    }

    /// Returns the speed vector of one period.
    ///
    /// # Panics
    ///
    /// Panics if `period` is out of bounds.
    #[inline]
    pub fn speeds_for_period(&self, period: usize) -> &[u8] {
        let num_pumps = self.num_pumps();
        &self.speeds[period * num_pumps..(period + 1) * num_pumps]
    }

    /// Checks that the two decision views agree under the given coder:
    /// decoding every `actuations[h]` must reproduce the corresponding
    /// speed slice.
    pub fn is_consistent(&self, coder: &ActuationCoder) -> bool {
        if self.num_pumps() != coder.num_pumps() && !self.actuations.is_empty() {
            return false;
        }
        self.actuations
            .iter()
            .enumerate()
            .all(|(h, &y)| coder.decode(y).as_slice() == self.speeds_for_period(h))
    }
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Schedule Summary")?;
        writeln!(f, "   Total Cost: {:.2}", self.cost)?;
        writeln!(f)?;

        if self.num_periods() == 0 {
            writeln!(f, "   (Empty horizon)")?;
            return Ok(());
        }

        writeln!(f, "   {:<8} | {:<10} | {:<16}", "Period", "Actuation", "Speeds")?;
        writeln!(f, "   {:-<8}-+-{:-<10}-+-{:-<16}", "", "", "")?;
        for h in 0..self.num_periods() {
            writeln!(
                f,
                "   {:<8} | {:<10} | {:<16}",
                h,
                self.actuations[h],
                format!("{:?}", self.speeds_for_period(h))
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_basic_accessors() {
        let schedule = Schedule::new(321.5, vec![1, 0, 1, 0, 1, 1], vec![5, 6]);
        assert_eq!(schedule.cost(), 321.5);
        assert_eq!(schedule.num_periods(), 2);
        assert_eq!(schedule.num_pumps(), 3);
        assert_eq!(schedule.speeds_for_period(0), &[1, 0, 1]);
        assert_eq!(schedule.speeds_for_period(1), &[0, 1, 1]);
        assert_eq!(schedule.actuations(), &[5, 6]);
    }

    #[test]
    #[should_panic(expected = "inconsistent vector lengths")]
    fn test_new_panics_on_length_mismatch() {
        let _ = Schedule::new(0.0, vec![1, 0, 1], vec![5, 6]);
    }

    #[test]
    #[should_panic(expected = "speeds for an empty horizon")]
    fn test_new_panics_on_speeds_without_periods() {
        let _ = Schedule::new(0.0, vec![1], Vec::new());
    }

    #[test]
    fn test_empty_schedule() {
        let schedule = Schedule::empty();
        assert_eq!(schedule.cost(), 0.0);
        assert_eq!(schedule.num_periods(), 0);
        assert_eq!(schedule.num_pumps(), 0);
        assert!(schedule.speeds().is_empty());
        assert!(schedule.actuations().is_empty());
    }

    #[test]
    fn test_consistency_against_coder() {
        let coder = ActuationCoder::binary(3);
        let good = Schedule::new(10.0, vec![1, 0, 1, 0, 1, 1], vec![5, 6]);
        assert!(good.is_consistent(&coder));

        let bad = Schedule::new(10.0, vec![1, 1, 1, 0, 1, 1], vec![5, 6]);
        assert!(!bad.is_consistent(&coder));

        assert!(Schedule::empty().is_consistent(&coder));
    }

    #[test]
    fn test_json_shape_matches_solution_format() {
        let schedule = Schedule::new(123.25, vec![1, 0, 1], vec![5]);
        let json = serde_json::to_value(&schedule).unwrap();
        assert_eq!(json["best_cost"], 123.25);
        assert_eq!(json["best_x"], serde_json::json!([1, 0, 1]));
        assert_eq!(json["best_y"], serde_json::json!([5]));
    }

    #[test]
    fn test_json_roundtrip_is_field_identical() {
        let schedule = Schedule::new(77.125, vec![0, 1, 1, 1, 0, 0], vec![6, 1]);
        let json = serde_json::to_string(&schedule).unwrap();
        let back: Schedule = serde_json::from_str(&json).unwrap();
        assert_eq!(schedule, back);
    }

    #[test]
    fn test_display_lists_periods() {
        let schedule = Schedule::new(1.0, vec![1, 0, 0, 0, 0, 1], vec![1, 4]);
        let shown = format!("{}", schedule);
        assert!(shown.contains("Total Cost: 1.00"));
        assert!(shown.contains("Period"));
    }
}
