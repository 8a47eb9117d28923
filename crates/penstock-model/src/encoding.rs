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

//! # Actuation Encoding
//!
//! The bidirectional mapping between the per-period actuation index `y` and
//! the per-pump speed vector `x`. A period's combined decision is a single
//! integer `y ∈ [0, |D|^P)` whose positional base-`|D|` digits select one
//! speed factor per pump, least-significant digit = pump 0. With the default
//! domain `{0, 1}` and three pumps this is a 3-bit on/off mask.
//!
//! The coder is total and injective over its domain: `decode(encode(x)) = x`
//! and `encode(decode(y)) = y`. All conversions between the two views go
//! through this module; callers never maintain `x` and `y` independently.

use smallvec::SmallVec;

/// A per-period speed vector, one entry per pump.
///
/// Sized for the common case of a handful of pumps without heap allocation.
pub type SpeedVector = SmallVec<[u8; 8]>;

/// Encoder/decoder between actuation indices and speed vectors for a fixed
/// pump count and discrete speed domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActuationCoder {
    num_pumps: usize,
    /// Sorted, duplicate-free speed factors. The digit value of a pump in
    /// `y` is an index into this table.
    domain: Vec<u8>,
}

impl ActuationCoder {
    /// Creates a new coder for `num_pumps` pumps drawing speeds from
    /// `domain`.
    ///
    /// The domain is sorted and deduplicated; its order defines the digit
    /// values of the encoding.
    ///
    /// # Panics
    ///
    /// Panics if `domain` is empty or if `|domain|^num_pumps` overflows
    /// `u32`.
    pub fn new(num_pumps: usize, mut domain: Vec<u8>) -> Self {
        assert!(
            !domain.is_empty(),
            "called `ActuationCoder::new` with an empty speed domain"
        );
        domain.sort_unstable();
        domain.dedup();

        let coder = Self { num_pumps, domain };
        assert!(
            coder.checked_num_actuations().is_some(),
            "called `ActuationCoder::new` with a decision space larger than u32: {}^{}",
            coder.domain.len(),
            num_pumps
        );
        coder
    }

    /// Creates the reference coder: three pumps, on/off speeds.
    #[inline]
    pub fn binary(num_pumps: usize) -> Self {
        Self::new(num_pumps, vec![0, 1])
    }

    /// Returns the number of pumps covered by one period decision.
    #[inline]
    pub fn num_pumps(&self) -> usize {
        self.num_pumps
    }

    /// Returns the sorted speed domain.
    #[inline]
    pub fn domain(&self) -> &[u8] {
        &self.domain
    }

    /// Returns the number of distinct period decisions, `|D|^P`.
    #[inline]
    pub fn num_actuations(&self) -> u32 {
        self.checked_num_actuations()
            .expect("decision space validated at construction")
    }

    #[inline]
    fn checked_num_actuations(&self) -> Option<u32> {
        let base = u32::try_from(self.domain.len()).ok()?;
        let exp = u32::try_from(self.num_pumps).ok()?;
        base.checked_pow(exp)
    }

    /// Decodes an actuation index into the per-pump speed vector.
    ///
    /// # Panics
    ///
    /// Panics if `y` is outside `[0, num_actuations())`.
    pub fn decode(&self, y: u32) -> SpeedVector {
        assert!(
            y < self.num_actuations(),
            "called `ActuationCoder::decode` with actuation out of range: the space is {} but the index is {}",
            self.num_actuations(),
            y
        );

        let base = self.domain.len() as u32;
        let mut digits = y;
        let mut speeds = SpeedVector::with_capacity(self.num_pumps);
        for _ in 0..self.num_pumps {
            speeds.push(self.domain[(digits % base) as usize]);
            digits /= base;
        }
        speeds
    }

    /// Encodes a per-pump speed vector into its actuation index, or `None`
    /// if the vector has the wrong length or contains a speed outside the
    /// domain.
    pub fn try_encode(&self, speeds: &[u8]) -> Option<u32> {
        if speeds.len() != self.num_pumps {
            return None;
        }

        let base = self.domain.len() as u32;
        let mut y = 0u32;
        for &speed in speeds.iter().rev() {
            let digit = self.domain.binary_search(&speed).ok()? as u32;
            y = y * base + digit;
        }
        Some(y)
    }

    /// Encodes a per-pump speed vector into its actuation index.
    ///
    /// # Panics
    ///
    /// Panics if the vector has the wrong length or contains a speed outside
    /// the domain.
    #[inline]
    pub fn encode(&self, speeds: &[u8]) -> u32 {
        self.try_encode(speeds).unwrap_or_else(|| {
            panic!(
                "called `ActuationCoder::encode` with a speed vector outside the domain: {:?}",
                speeds
            )
        })
    }

    /// Returns the canonical successor sequence `0, 1, …, |D|^P − 1`.
    ///
    /// This order is the reproducibility reference; branching heuristics may
    /// reorder it but must document the ordering they use.
    #[inline]
    pub fn canonical_actuations(&self) -> std::ops::Range<u32> {
        0..self.num_actuations()
    }

    /// Returns the number of pumps running (speed > 0) under actuation `y`.
    #[inline]
    pub fn pumps_running(&self, y: u32) -> usize {
        self.decode(y).iter().filter(|&&s| s > 0).count()
    }
}

impl std::fmt::Display for ActuationCoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ActuationCoder(pumps: {}, domain: {:?}, space: {})",
            self.num_pumps,
            self.domain,
            self.num_actuations()
        )
    }
}
