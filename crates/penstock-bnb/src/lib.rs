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

//! # Penstock-BnB: branch-and-bound for pump scheduling
//!
//! The worker-local search engine. It enumerates per-period pump actuation
//! decisions depth-first, drives the hydraulic simulator one period per
//! tree level, and prunes on the constraint classes of the water network
//! (tank levels, timestep regularity, cost bound, node pressures,
//! end-of-horizon stability, actuation budget).
//!
//! Core flow
//! - Provide a resolved `penstock_model::network::Network` and a loaded
//!   `penstock_sim` engine.
//! - Choose a `branching::DecisionBuilder` (successor ordering).
//! - Run `bnb::PumpScheduleSolver`, optionally against a
//!   `penstock_search::incumbent::SharedIncumbent` for parallel bound
//!   sharing.
//!
//! Design highlights
//! - Separation of concerns: builders order successors, the evaluator
//!   classifies feasibility, monitors observe/control, outcomes carry
//!   per-depth statistics.
//! - The simulator is the single source of hydraulic truth; backtracking
//!   restores its state by replaying the decision prefix or reloading a
//!   per-depth checkpoint file, selected by configuration.
//! - Deterministic given a deterministic builder; canonical ascending
//!   order is the reproducibility reference.
//!
//! Module map
//! - `bnb`: the solver engine and session orchestration.
//! - `branching`: successor ordering strategies.
//! - `cursor`: period-wise simulator advance/retreat with both
//!   state-restoration strategies.
//! - `eval`: the constraint evaluator and prune classification.
//! - `frontier`: the frame-structured decision stack.
//! - `incumbent`: local/shared incumbent backing seam.
//! - `monitor`: tree-search monitors (no-op, tracing, wrappers).
//! - `path`: the coupled x/y decision prefix.
//! - `result`: worker outcomes with termination reasons.
//! - `stats`: per-depth, per-reason prune counters.

pub mod bnb;
pub mod branching;
pub mod cursor;
pub mod eval;
pub mod frontier;
pub mod incumbent;
pub mod monitor;
pub mod path;
pub mod result;
pub mod stats;
