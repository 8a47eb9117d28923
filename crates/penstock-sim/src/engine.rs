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

//! # Hydraulic Engine Contract
//!
//! The capability set the search requires from a hydraulic backend. The
//! trait mirrors the extended-period simulation loop of EPANET-style
//! toolkits: open a project once per run, set the horizon via time
//! parameters, then repeatedly solve one hydraulic step (`run_step`) and
//! advance the clock (`next_step`), reading node, link and pattern values in
//! between. The hydraulics solver's internal buffers are acquired with
//! `open_hydraulics` and must be released with `close_hydraulics` on every
//! exit path; [`HydraulicsSession`] enforces that pairing.

use crate::err::EngineResult;
use penstock_model::index::{LinkHandle, NodeHandle, PatternHandle};
use std::path::Path;

/// Project-level time parameters, set once per engine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeParameter {
    /// Simulation clock start in seconds.
    StartTime,
    /// Total simulation duration in seconds.
    Duration,
    /// Reporting start time in seconds.
    ReportStart,
}

impl std::fmt::Display for TimeParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeParameter::StartTime => write!(f, "StartTime"),
            TimeParameter::Duration => write!(f, "Duration"),
            TimeParameter::ReportStart => write!(f, "ReportStart"),
        }
    }
}

/// Hydraulics initialization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitMode {
    /// Initialize without saving results to the hydraulics file.
    NoSave,
    /// Initialize and save results to the hydraulics file.
    Save,
    /// Initialize flows and re-initialize the save file.
    SaveAndInit,
}

/// Node quantities the search reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeProperty {
    /// Gauge pressure at a junction.
    Pressure,
    /// Hydraulic head; for tanks this is the level check quantity.
    Head,
}

/// Link quantities the search reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkProperty {
    /// Instantaneous pump energy usage.
    Energy,
    /// The link's current setting (pump speed factor).
    Setting,
}

/// The narrow hydraulic backend contract the scheduling search consumes.
///
/// Implementations own the whole project state. One engine instance is
/// exclusively owned by one worker; nothing here is `Sync`.
///
/// Error convention: every call reports the backend's positive integer code
/// through [`EngineError`]; codes above 100 are fatal for the run
/// (see `err::FATAL_CODE_THRESHOLD`).
pub trait HydraulicEngine {
    /// Opens a project from an input file, writing the report (and optional
    /// binary output) files. Fails with a fatal code if the project is not
    /// valid.
    fn load(&mut self, inp_file: &Path, rpt_file: &Path, out_file: Option<&Path>)
        -> EngineResult<()>;

    /// Sets a project time parameter in seconds.
    fn set_time_parameter(&mut self, parameter: TimeParameter, seconds: i64) -> EngineResult<()>;

    /// Acquires the hydraulic solver's internal buffers.
    fn open_hydraulics(&mut self) -> EngineResult<()>;

    /// Resets the hydraulic state (clock, tank heads, accumulated energy)
    /// to the start of the simulation.
    fn init_hydraulics(&mut self, mode: InitMode) -> EngineResult<()>;

    /// Solves the network hydraulics at the current clock time and returns
    /// that time in seconds.
    fn run_step(&mut self) -> EngineResult<i64>;

    /// Advances the clock to the next hydraulic event and returns the step
    /// length `dt` in seconds; `dt == 0` signals the end of the horizon.
    fn next_step(&mut self) -> EngineResult<i64>;

    /// Writes one entry of a speed pattern (0-based period index).
    fn set_pattern_value(
        &mut self,
        pattern: PatternHandle,
        period: usize,
        value: f64,
    ) -> EngineResult<()>;

    /// Reads one entry of a pattern (0-based period index).
    fn get_pattern_value(&self, pattern: PatternHandle, period: usize) -> EngineResult<f64>;

    /// Reads a node quantity at the current hydraulic state.
    fn node_value(&self, node: NodeHandle, property: NodeProperty) -> EngineResult<f64>;

    /// Reads a link quantity at the current hydraulic state.
    fn link_value(&self, link: LinkHandle, property: LinkProperty) -> EngineResult<f64>;

    /// Returns the cumulative energy cost the backend has tracked for a
    /// pump link since the last hydraulics initialization.
    fn pump_total_cost(&self, link: LinkHandle) -> EngineResult<f64>;

    /// Saves the current hydraulic state to a file.
    fn save_hydraulics_file(&self, path: &Path) -> EngineResult<()>;

    /// Restores a hydraulic state previously written by
    /// [`HydraulicEngine::save_hydraulics_file`].
    fn use_hydraulics_file(&mut self, path: &Path) -> EngineResult<()>;

    /// Releases the hydraulic solver's internal buffers.
    fn close_hydraulics(&mut self) -> EngineResult<()>;

    /// Closes the project.
    fn close(&mut self) -> EngineResult<()>;

    /// Resolves a node id to its engine handle.
    fn node_index(&self, id: &str) -> EngineResult<NodeHandle>;

    /// Resolves a link id to its engine handle.
    fn link_index(&self, id: &str) -> EngineResult<LinkHandle>;

    /// Resolves a pattern id to its engine handle.
    fn pattern_index(&self, id: &str) -> EngineResult<PatternHandle>;

    /// Returns the project's hydraulic timestep option in seconds.
    fn hydraulic_timestep(&self) -> i64;
}

/// RAII guard pairing `open_hydraulics` with a guaranteed
/// `close_hydraulics`.
///
/// The guard borrows the engine exclusively for the lifetime of the
/// session and dereferences to it, so all trait calls go through the
/// session while it is alive. Dropping the guard closes the hydraulics;
/// a close failure during drop is logged and swallowed, while the explicit
/// [`HydraulicsSession::close`] surfaces it.
#[derive(Debug)]
pub struct HydraulicsSession<'a, E>
where
    E: HydraulicEngine,
{
    engine: &'a mut E,
    open: bool,
}

impl<'a, E> HydraulicsSession<'a, E>
where
    E: HydraulicEngine,
{
    /// Opens the hydraulics and initializes the solver state.
    pub fn open(engine: &'a mut E, mode: InitMode) -> EngineResult<Self> {
        engine.open_hydraulics()?;
        if let Err(error) = engine.init_hydraulics(mode) {
            // The buffers were acquired; release them before reporting.
            let _ = engine.close_hydraulics();
            return Err(error);
        }
        Ok(Self { engine, open: true })
    }

    /// Re-initializes the hydraulic state without re-opening the solver.
    #[inline]
    pub fn reinit(&mut self, mode: InitMode) -> EngineResult<()> {
        self.engine.init_hydraulics(mode)
    }

    /// Closes the session explicitly, surfacing any close failure.
    pub fn close(mut self) -> EngineResult<()> {
        self.open = false;
        self.engine.close_hydraulics()
    }
}

impl<'a, E> std::ops::Deref for HydraulicsSession<'a, E>
where
    E: HydraulicEngine,
{
    type Target = E;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.engine
    }
}

impl<'a, E> std::ops::DerefMut for HydraulicsSession<'a, E>
where
    E: HydraulicEngine,
{
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.engine
    }
}

impl<'a, E> Drop for HydraulicsSession<'a, E>
where
    E: HydraulicEngine,
{
    fn drop(&mut self) {
        if self.open {
            if let Err(error) = self.engine.close_hydraulics() {
                tracing::warn!("close_hydraulics failed during session drop: {}", error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{DemoEngine, DemoNetwork};

    fn demo_engine() -> DemoEngine {
        DemoEngine::from_network(DemoNetwork::reference())
    }

    #[test]
    fn test_session_closes_on_drop() {
        let mut engine = demo_engine();
        {
            let session = HydraulicsSession::open(&mut engine, InitMode::NoSave).unwrap();
            assert!(session.hydraulics_open());
        }
        assert!(!engine.hydraulics_open());
    }

    #[test]
    fn test_session_explicit_close() {
        let mut engine = demo_engine();
        let session = HydraulicsSession::open(&mut engine, InitMode::NoSave).unwrap();
        session.close().unwrap();
        assert!(!engine.hydraulics_open());
    }

    #[test]
    fn test_session_derefs_to_engine() {
        let mut engine = demo_engine();
        let mut session = HydraulicsSession::open(&mut engine, InitMode::NoSave).unwrap();
        let t = session.run_step().unwrap();
        assert_eq!(t, 0);
        let dt = session.next_step().unwrap();
        assert_eq!(dt, session.hydraulic_timestep());
    }

    #[test]
    fn test_session_reinit_resets_clock() {
        let mut engine = demo_engine();
        let mut session = HydraulicsSession::open(&mut engine, InitMode::NoSave).unwrap();
        session.run_step().unwrap();
        session.next_step().unwrap();
        session.reinit(InitMode::NoSave).unwrap();
        assert_eq!(session.run_step().unwrap(), 0);
    }
}
