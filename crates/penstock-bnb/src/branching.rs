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

//! # Branching Strategies
//!
//! Successor ordering for the period decision tree. A builder produces the
//! actuation indices to try at a depth, in exploration order; the engine
//! enqueues them reversed so its LIFO frontier pops them in builder order.
//!
//! Canonical ascending order (`0, 1, …, |D|^P − 1`) is the reproducibility
//! reference. The least-energy heuristic reorders it by running-pump count
//! and is documented on the type.

use crate::path::DecisionPath;
use penstock_model::encoding::ActuationCoder;
use smallvec::SmallVec;

/// The successors a builder emits for one tree level, in exploration
/// order. Sized for the reference decision space (8 actuations) without
/// heap allocation.
pub type DecisionSet = SmallVec<[u32; 16]>;

/// A pluggable successor ordering strategy.
pub trait DecisionBuilder {
    /// Returns the name of the decision builder.
    fn name(&self) -> &str;

    /// Returns the actuation indices to explore at the given depth, in
    /// exploration order. `depth` is the period index the decisions are
    /// for; `path` is the decided prefix above it.
    fn decisions(&mut self, coder: &ActuationCoder, depth: usize, path: &DecisionPath)
        -> DecisionSet;
}

impl std::fmt::Debug for dyn DecisionBuilder + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DecisionBuilder({})", self.name())
    }
}

/// Canonical ascending enumeration of the full decision space. The
/// reference ordering: deterministic and exhaustive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CanonicalBuilder;

impl DecisionBuilder for CanonicalBuilder {
    fn name(&self) -> &str {
        "CanonicalBuilder"
    }

    #[inline]
    fn decisions(
        &mut self,
        coder: &ActuationCoder,
        _depth: usize,
        _path: &DecisionPath,
    ) -> DecisionSet {
        coder.canonical_actuations().collect()
    }
}

/// Exhaustive enumeration ordered by running-pump count: actuations with
/// fewer pumps on are explored first, ties broken by ascending index.
/// Cheap schedules tend to appear early, tightening the cost bound sooner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LeastEnergyBuilder;

impl DecisionBuilder for LeastEnergyBuilder {
    fn name(&self) -> &str {
        "LeastEnergyBuilder"
    }

    fn decisions(
        &mut self,
        coder: &ActuationCoder,
        _depth: usize,
        _path: &DecisionPath,
    ) -> DecisionSet {
        let mut decisions: DecisionSet = coder.canonical_actuations().collect();
        decisions.sort_by_key(|&actuation| (coder.pumps_running(actuation), actuation));
        decisions
    }
}
