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

//! # Penstock Simulator Adapter
//!
//! The narrow contract between the scheduling search and a hydraulic
//! engine, plus a deterministic built-in backend.
//!
//! The search never links against a hydraulic library directly. It consumes
//! the [`engine::HydraulicEngine`] trait: open a project, write speed-pattern
//! entries, advance one hydraulic step, read tank heads / node pressures /
//! pump energy cost, save and restore hydraulics state. Any EPANET-style
//! backend that satisfies the capability set is admissible.
//!
//! Module map:
//! - `engine`: the `HydraulicEngine` trait, property/parameter enums, and
//!   the RAII [`engine::HydraulicsSession`] guard that pairs
//!   `open_hydraulics` with a guaranteed `close_hydraulics`.
//! - `err`: typed engine failures carrying the backend's integer code;
//!   codes above 100 are fatal.
//! - `demo`: a mass-balance tank model backend driven by a JSON network
//!   description. Used by the test-suite and the CLI.
//! - `resolve`: id → handle resolution of the configured network elements.
//! - `replay`: re-evaluation of a finished schedule against a fresh
//!   hydraulic run.

pub mod demo;
pub mod engine;
pub mod err;
pub mod replay;
pub mod resolve;
