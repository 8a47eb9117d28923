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

//! # Penstock Model
//!
//! **The Core Domain Model for the Penstock Pump Scheduling Solver.**
//!
//! This crate defines the data structures shared between the problem
//! definition (network elements, configuration) and the solving engine
//! (`penstock_bnb`).
//!
//! ## Architecture
//!
//! * **`index`**: Strongly-typed wrappers (`PumpIndex`, `TankIndex`,
//!   `MonitorIndex`) for the model's element slots, plus the opaque handles
//!   (`NodeHandle`, `LinkHandle`, `PatternHandle`) a hydraulic engine hands
//!   out for its own elements.
//! * **`network`**: The resolved network view the search operates on: pumps
//!   with their speed patterns, tanks with admissible level bands, monitor
//!   nodes with pressure thresholds, and the hydraulic timestep.
//! * **`config`**: The search configuration with reference-network defaults
//!   and builder-style overrides.
//! * **`encoding`**: The bidirectional mapping between the per-period
//!   actuation index `y` and the per-pump speed vector `x`. The coder is the
//!   single authority on this coupling; nothing else converts between the
//!   two views.
//! * **`schedule`**: The incumbent snapshot (`best_cost`, `best_x`,
//!   `best_y`) with its JSON persistence shape.
//!
//! ## Design Philosophy
//!
//! 1.  **Type Safety**: Model slots and engine handles are distinct types;
//!     a `PumpIndex` cannot be used where the engine expects a `LinkHandle`.
//! 2.  **Single Authority**: `x` and `y` are two views of one decision; the
//!     `encoding` module owns the invariant that they stay in sync.
//! 3.  **Fail-Fast**: Builders and constructors validate eagerly so the
//!     engine never sees an inconsistent network or schedule.

pub mod config;
pub mod encoding;
pub mod index;
pub mod network;
pub mod schedule;
