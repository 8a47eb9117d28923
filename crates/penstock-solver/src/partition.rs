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

//! # Work Partitioning
//!
//! Round-robin distribution of the top tree levels across ranks. With `b`
//! successors per level and `R` ranks, the partition spans the smallest
//! number of levels `L` with `b^L >= R`; the combined base-`b` index of the
//! first `L` decisions is assigned to rank `index mod R`. For the reference
//! configuration (`b = 8`) a single level suffices for up to eight ranks,
//! matching the `y_0 mod R` round-robin of the distributed reference.

use penstock_bnb::branching::{DecisionBuilder, DecisionSet};
use penstock_bnb::path::DecisionPath;
use penstock_model::encoding::ActuationCoder;

/// A rank's share of the top tree levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankPartition {
    rank: usize,
    num_ranks: usize,
    branching: u32,
    /// How many top levels the partition spans.
    levels: usize,
}

impl RankPartition {
    /// Creates the partition of `rank` among `num_ranks` peers over a tree
    /// with `branching` successors per level.
    ///
    /// # Panics
    ///
    /// Panics if `rank >= num_ranks`, `num_ranks` is zero, or `branching`
    /// is zero.
    pub fn new(rank: usize, num_ranks: usize, branching: u32) -> Self {
        assert!(num_ranks > 0, "called `RankPartition::new` with zero ranks");
        assert!(
            rank < num_ranks,
            "called `RankPartition::new` with rank out of range: the pool is {} but the rank is {}",
            num_ranks,
            rank
        );
        assert!(
            branching > 0,
            "called `RankPartition::new` with zero branching"
        );

        // Smallest L with branching^L >= num_ranks, at least one level.
        let mut levels = 1;
        let mut span = branching as u64;
        while span < num_ranks as u64 {
            levels += 1;
            span *= branching as u64;
        }

        Self {
            rank,
            num_ranks,
            branching,
            levels,
        }
    }

    /// Returns the number of top levels the partition spans.
    #[inline]
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Returns `true` if the subtree identified by the given top-level
    /// decision prefix contains any leaf assigned to this rank.
    ///
    /// A prefix shorter than the partition depth is admitted when any of
    /// its completions is; a prefix at (or beyond) the partition depth is
    /// decided by its combined index alone.
    pub fn admits(&self, prefix: &[u32]) -> bool {
        let depth = prefix.len().min(self.levels);
        let mut combined: u64 = 0;
        for &decision in &prefix[..depth] {
            combined = combined * self.branching as u64 + decision as u64;
        }

        if prefix.len() >= self.levels {
            return combined % self.num_ranks as u64 == self.rank as u64;
        }

        // The subtree spans a contiguous index range of length
        // branching^(levels - depth); check whether it hits the rank's
        // residue class.
        let span = (self.branching as u64).pow((self.levels - depth) as u32);
        if span >= self.num_ranks as u64 {
            return true;
        }
        let first = combined * span;
        let ranks = self.num_ranks as u64;
        let offset = (self.rank as u64 + ranks - first % ranks) % ranks;
        offset < span
    }
}

impl std::fmt::Display for RankPartition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RankPartition(rank: {}/{}, levels: {})",
            self.rank, self.num_ranks, self.levels
        )
    }
}

/// A decision builder that restricts another builder's top-level
/// successors to one rank's partition. Below the partition depth the inner
/// builder passes through untouched.
#[derive(Debug, Clone)]
pub struct PartitionedBuilder<B> {
    inner: B,
    partition: RankPartition,
}

impl<B> PartitionedBuilder<B>
where
    B: DecisionBuilder,
{
    /// Wraps a builder with a rank partition.
    pub fn new(inner: B, partition: RankPartition) -> Self {
        Self { inner, partition }
    }

    /// Returns the partition.
    #[inline]
    pub fn partition(&self) -> &RankPartition {
        &self.partition
    }
}

impl<B> DecisionBuilder for PartitionedBuilder<B>
where
    B: DecisionBuilder,
{
    fn name(&self) -> &str {
        "PartitionedBuilder"
    }

    fn decisions(
        &mut self,
        coder: &ActuationCoder,
        depth: usize,
        path: &DecisionPath,
    ) -> DecisionSet {
        let base = self.inner.decisions(coder, depth, path);
        if depth >= self.partition.levels() {
            return base;
        }

        let mut prefix: Vec<u32> = path.actuations().to_vec();
        prefix.push(0);
        base.into_iter()
            .filter(|&decision| {
                *prefix.last_mut().expect("prefix is never empty") = decision;
                self.partition.admits(&prefix)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use penstock_bnb::branching::CanonicalBuilder;

    #[test]
    fn test_single_rank_owns_everything() {
        let partition = RankPartition::new(0, 1, 8);
        assert_eq!(partition.levels(), 1);
        for decision in 0..8 {
            assert!(partition.admits(&[decision]));
        }
    }

    #[test]
    fn test_two_ranks_split_even_odd() {
        let rank0 = RankPartition::new(0, 2, 8);
        let rank1 = RankPartition::new(1, 2, 8);
        assert_eq!(rank0.levels(), 1);

        let owned0: Vec<u32> = (0..8).filter(|&y| rank0.admits(&[y])).collect();
        let owned1: Vec<u32> = (0..8).filter(|&y| rank1.admits(&[y])).collect();
        assert_eq!(owned0, vec![0, 2, 4, 6]);
        assert_eq!(owned1, vec![1, 3, 5, 7]);
    }

    #[test]
    fn test_every_leaf_has_exactly_one_owner() {
        for num_ranks in 1..=5 {
            let partitions: Vec<RankPartition> = (0..num_ranks)
                .map(|rank| RankPartition::new(rank, num_ranks, 8))
                .collect();
            for decision in 0..8 {
                let owners = partitions
                    .iter()
                    .filter(|p| p.admits(&[decision]))
                    .count();
                assert_eq!(owners, 1, "decision {} with {} ranks", decision, num_ranks);
            }
        }
    }

    #[test]
    fn test_partition_recurses_when_ranks_exceed_branching() {
        // Binary branching with three ranks needs two levels (2^2 = 4 >= 3).
        let partitions: Vec<RankPartition> =
            (0..3).map(|rank| RankPartition::new(rank, 3, 2)).collect();
        assert!(partitions.iter().all(|p| p.levels() == 2));

        // Every two-level prefix has exactly one owner.
        for first in 0..2 {
            for second in 0..2 {
                let owners = partitions
                    .iter()
                    .filter(|p| p.admits(&[first, second]))
                    .count();
                assert_eq!(owners, 1);
            }
        }

        // A one-level prefix is admitted by every rank that owns one of
        // its completions, and at least one rank admits each.
        for first in 0..2 {
            assert!(partitions.iter().any(|p| p.admits(&[first])));
        }
    }

    #[test]
    fn test_deep_prefixes_decided_by_top_levels() {
        let partition = RankPartition::new(1, 2, 8);
        assert!(partition.admits(&[3, 7, 0, 5]));
        assert!(!partition.admits(&[2, 7, 0, 5]));
    }

    #[test]
    fn test_partitioned_builder_filters_root_only() {
        let coder = ActuationCoder::binary(3);
        let path = DecisionPath::new(coder.clone());
        let mut builder =
            PartitionedBuilder::new(CanonicalBuilder, RankPartition::new(0, 2, 8));

        let root = builder.decisions(&coder, 0, &path);
        assert_eq!(root.as_slice(), &[0, 2, 4, 6]);

        // Below the partition depth the full space comes back; the path
        // holds the decided prefix.
        let mut deeper_path = DecisionPath::new(coder.clone());
        deeper_path.push(2);
        let below = builder.decisions(&coder, 1, &deeper_path);
        assert_eq!(below.len(), 8);
    }

    #[test]
    #[should_panic(expected = "rank out of range")]
    fn test_rank_out_of_range_panics() {
        let _ = RankPartition::new(2, 2, 8);
    }
}
