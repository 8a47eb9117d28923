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

//! # Simulator Cursor
//!
//! Period-wise movement through the hydraulic simulation. `advance` writes
//! the period's speed-pattern entries and takes one `run_step`/`next_step`
//! pair; `retreat` rewinds one period using the configured restoration
//! strategy:
//!
//! - **Replay**: re-initialize the hydraulics and re-run the decision
//!   prefix from period zero. The pattern entries of the prefix are still
//!   in the engine's buffers, so nothing is rewritten.
//! - **File**: reload the `hour{N}.hyd` snapshot saved when depth `N` was
//!   reached.
//!
//! Invariant: on entry to period `h`'s evaluation the simulator clock is
//! exactly `h · hyd_timestep`. After any `advance` error the caller must
//! call [`SimulatorCursor::resync`] before continuing; the failed step may
//! have left the backend clock mid-period.

use penstock_model::config::CheckpointMode;
use penstock_model::network::{MonitorNode, Network, Tank};
use penstock_sim::engine::{HydraulicEngine, HydraulicsSession, InitMode, TimeParameter};
use penstock_sim::err::EngineResult;
use std::path::{Path, PathBuf};

/// The result of advancing one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    /// The simulator clock at the start of the step, seconds.
    pub time: i64,
    /// The hydraulic step length taken, seconds. Anything other than the
    /// hydraulic timestep (or 0 at the very end) marks a mid-period event.
    pub dt: i64,
}

/// A depth-tracked cursor over the hydraulic simulation.
#[derive(Debug)]
pub struct SimulatorCursor<'a, E>
where
    E: HydraulicEngine,
{
    session: HydraulicsSession<'a, E>,
    mode: CheckpointMode,
    scratch_dir: PathBuf,
    hyd_timestep: i64,
    horizon: usize,
    depth: usize,
}

impl<'a, E> SimulatorCursor<'a, E>
where
    E: HydraulicEngine,
{
    /// Sets the horizon time parameters, opens the hydraulics and places
    /// the cursor at depth zero. In `File` mode the depth-zero snapshot is
    /// written immediately.
    pub fn new(
        engine: &'a mut E,
        network: &Network,
        horizon: usize,
        mode: CheckpointMode,
        scratch_dir: impl Into<PathBuf>,
    ) -> EngineResult<Self> {
        let hyd_timestep = network.hyd_timestep();
        engine.set_time_parameter(TimeParameter::StartTime, 0)?;
        engine.set_time_parameter(TimeParameter::Duration, horizon as i64 * hyd_timestep)?;
        engine.set_time_parameter(TimeParameter::ReportStart, 0)?;

        let session = HydraulicsSession::open(engine, InitMode::NoSave)?;
        let cursor = Self {
            session,
            mode,
            scratch_dir: scratch_dir.into(),
            hyd_timestep,
            horizon,
            depth: 0,
        };

        if cursor.mode == CheckpointMode::File {
            cursor.save_checkpoint(0)?;
        }
        Ok(cursor)
    }

    /// Returns the number of periods the cursor has advanced through.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the horizon length in periods.
    #[inline]
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Returns the hydraulic timestep in seconds.
    #[inline]
    pub fn hyd_timestep(&self) -> i64 {
        self.hyd_timestep
    }

    /// Writes the period's speed-pattern entries and advances one
    /// hydraulic step.
    ///
    /// On error the period is not counted as advanced, but the backend may
    /// have moved its clock; call [`SimulatorCursor::resync`] before
    /// continuing with a sibling decision.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if the cursor is already at the horizon or
    /// the speed slice does not match the network's pump count.
    pub fn advance(&mut self, network: &Network, speeds: &[u8]) -> EngineResult<StepOutcome> {
        debug_assert!(
            self.depth < self.horizon,
            "called `SimulatorCursor::advance` past the horizon: depth is {} of {}",
            self.depth,
            self.horizon
        );
        debug_assert_eq!(
            speeds.len(),
            network.num_pumps(),
            "called `SimulatorCursor::advance` with a wrong-sized speed vector"
        );

        let period = self.depth;
        for (pump, &speed) in network.pumps().iter().zip(speeds.iter()) {
            self.session
                .set_pattern_value(pump.pattern(), period, f64::from(speed))?;
        }

        let time = self.session.run_step()?;
        let dt = self.session.next_step()?;

        if self.mode == CheckpointMode::File {
            self.save_checkpoint(self.depth + 1)?;
        }
        self.depth += 1;

        Ok(StepOutcome { time, dt })
    }

    /// Rewinds the cursor one period.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is at depth zero.
    pub fn retreat(&mut self) -> EngineResult<()> {
        assert!(
            self.depth > 0,
            "called `SimulatorCursor::retreat` at depth zero"
        );
        self.depth -= 1;
        self.restore()
    }

    /// Restores the hydraulic state of the current depth without moving
    /// the cursor. Used after a failed `advance` left the backend in an
    /// undefined position.
    #[inline]
    pub fn resync(&mut self) -> EngineResult<()> {
        self.restore()
    }

    /// Reads a tank's head at the current hydraulic state.
    #[inline]
    pub fn tank_head(&self, tank: &Tank) -> EngineResult<f64> {
        self.session
            .node_value(tank.node(), penstock_sim::engine::NodeProperty::Head)
    }

    /// Reads a monitored node's pressure at the current hydraulic state.
    #[inline]
    pub fn node_pressure(&self, monitor: &MonitorNode) -> EngineResult<f64> {
        self.session
            .node_value(monitor.node(), penstock_sim::engine::NodeProperty::Pressure)
    }

    /// Returns the accumulated energy cost over all pumps since period
    /// zero.
    pub fn total_cost(&self, network: &Network) -> EngineResult<f64> {
        let mut cost = 0.0;
        for pump in network.pumps() {
            cost += self.session.pump_total_cost(pump.link())?;
        }
        Ok(cost)
    }

    /// Closes the underlying hydraulics session, surfacing close errors.
    #[inline]
    pub fn close(self) -> EngineResult<()> {
        self.session.close()
    }

    fn restore(&mut self) -> EngineResult<()> {
        match self.mode {
            CheckpointMode::File => {
                let path = self.checkpoint_path(self.depth);
                self.session.use_hydraulics_file(&path)
            }
            CheckpointMode::Replay => {
                self.session.reinit(InitMode::NoSave)?;
                for _ in 0..self.depth {
                    self.session.run_step()?;
                    self.session.next_step()?;
                }
                Ok(())
            }
        }
    }

    fn save_checkpoint(&self, depth: usize) -> EngineResult<()> {
        let path = self.checkpoint_path(depth);
        self.session.save_hydraulics_file(&path)
    }

    fn checkpoint_path(&self, depth: usize) -> PathBuf {
        checkpoint_file(&self.scratch_dir, depth)
    }
}

/// The checkpoint file for a depth inside a scratch directory.
#[inline]
pub fn checkpoint_file(scratch_dir: &Path, depth: usize) -> PathBuf {
    scratch_dir.join(format!("hour{}.hyd", depth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use penstock_model::config::SearchConfig;
    use penstock_sim::demo::{DemoEngine, DemoNetwork};
    use penstock_sim::resolve::resolve_network;

    fn tiny_setup(horizon: usize) -> (DemoEngine, Network) {
        let engine = DemoEngine::from_network(DemoNetwork::tiny(horizon));
        let mut config = SearchConfig::new("net.json", "net.rpt");
        config.pump_ids = vec!["P1".to_string()];
        config.tank_ids = vec!["T1".to_string()];
        config.node_ids = vec!["J1".to_string()];
        config.pressure_thresholds.insert("J1".to_string(), 35.0);
        config.level_min = 40.0;
        config.level_max = 60.0;
        config.initial_level = 50.0;
        let network = resolve_network(&config, &engine).unwrap();
        (engine, network)
    }

    #[test]
    fn test_advance_tracks_clock_and_depth() {
        let (mut engine, network) = tiny_setup(3);
        let mut cursor =
            SimulatorCursor::new(&mut engine, &network, 3, CheckpointMode::Replay, "unused")
                .unwrap();

        assert_eq!(cursor.depth(), 0);
        let step = cursor.advance(&network, &[1]).unwrap();
        assert_eq!(step.time, 0);
        assert_eq!(step.dt, 3600);
        assert_eq!(cursor.depth(), 1);

        let step = cursor.advance(&network, &[0]).unwrap();
        assert_eq!(step.time, 3600);
        assert_eq!(cursor.depth(), 2);
    }

    #[test]
    fn test_cost_accumulates_and_replay_retreat_rewinds_it() {
        let (mut engine, network) = tiny_setup(3);
        let mut cursor =
            SimulatorCursor::new(&mut engine, &network, 3, CheckpointMode::Replay, "unused")
                .unwrap();

        cursor.advance(&network, &[1]).unwrap();
        let cost_one = cursor.total_cost(&network).unwrap();
        assert!((cost_one - 10.0).abs() < 1e-9);

        cursor.advance(&network, &[1]).unwrap();
        let cost_two = cursor.total_cost(&network).unwrap();
        assert!((cost_two - 20.0).abs() < 1e-9);

        cursor.retreat().unwrap();
        assert_eq!(cursor.depth(), 1);
        let rewound = cursor.total_cost(&network).unwrap();
        assert!((rewound - cost_one).abs() < 1e-9);
    }

    #[test]
    fn test_retreat_restores_tank_heads() {
        for mode in [CheckpointMode::Replay, CheckpointMode::File] {
            let scratch = tempfile::tempdir().unwrap();
            let (mut engine, network) = tiny_setup(3);
            let mut cursor =
                SimulatorCursor::new(&mut engine, &network, 3, mode, scratch.path()).unwrap();
            let tank = &network.tanks()[0];

            cursor.advance(&network, &[1]).unwrap();
            let head_after_one = cursor.tank_head(tank).unwrap();

            cursor.advance(&network, &[1]).unwrap();
            assert_ne!(cursor.tank_head(tank).unwrap(), head_after_one);

            cursor.retreat().unwrap();
            let restored = cursor.tank_head(tank).unwrap();
            assert!(
                (restored - head_after_one).abs() < 1e-9,
                "mode {:?}: expected {} got {}",
                mode,
                head_after_one,
                restored
            );
        }
    }

    #[test]
    fn test_sibling_replacement_after_retreat() {
        // Try pump-on at period 1, rewind, try pump-off instead; the state
        // must follow the new decision.
        let (mut engine, network) = tiny_setup(2);
        let mut cursor =
            SimulatorCursor::new(&mut engine, &network, 2, CheckpointMode::Replay, "unused")
                .unwrap();
        let tank = &network.tanks()[0];

        cursor.advance(&network, &[0]).unwrap();
        cursor.advance(&network, &[1]).unwrap();
        let head_on = cursor.tank_head(tank).unwrap();

        cursor.retreat().unwrap();
        cursor.advance(&network, &[0]).unwrap();
        let head_off = cursor.tank_head(tank).unwrap();

        // On: +0.5 over the period; off: -0.5.
        assert!((head_on - head_off - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_file_mode_writes_checkpoints() {
        let scratch = tempfile::tempdir().unwrap();
        let (mut engine, network) = tiny_setup(2);
        let mut cursor =
            SimulatorCursor::new(&mut engine, &network, 2, CheckpointMode::File, scratch.path())
                .unwrap();

        assert!(checkpoint_file(scratch.path(), 0).exists());
        cursor.advance(&network, &[1]).unwrap();
        assert!(checkpoint_file(scratch.path(), 1).exists());
    }

    #[test]
    fn test_resync_recovers_current_depth() {
        let (mut engine, network) = tiny_setup(3);
        let mut cursor =
            SimulatorCursor::new(&mut engine, &network, 3, CheckpointMode::Replay, "unused")
                .unwrap();

        cursor.advance(&network, &[1]).unwrap();
        let cost = cursor.total_cost(&network).unwrap();

        cursor.resync().unwrap();
        assert_eq!(cursor.depth(), 1);
        assert!((cursor.total_cost(&network).unwrap() - cost).abs() < 1e-9);
    }

    #[test]
    fn test_close_releases_hydraulics() {
        let (mut engine, network) = tiny_setup(2);
        let cursor =
            SimulatorCursor::new(&mut engine, &network, 2, CheckpointMode::Replay, "unused")
                .unwrap();
        cursor.close().unwrap();
        assert!(!engine.hydraulics_open());
    }
}
