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

//! # Demo Backend
//!
//! A deterministic mass-balance tank model implementing the full
//! [`HydraulicEngine`] contract. Tank heads integrate pump inflow minus
//! network demand over each hydraulic step, junction pressures are affine in
//! the pump speeds and the mean tank head, and pump energy cost accrues as
//! `power · speed · tariff · hours`. The network description is plain serde
//! data, loadable from a JSON file.
//!
//! The backend exists so the search engine, evaluator, coordinator and CLI
//! can be driven end-to-end without an external hydraulic library. It also
//! supports injecting mid-period hydraulic events (fractional `dt`), which
//! the discrete decision model must prune.

use crate::engine::{HydraulicEngine, InitMode, LinkProperty, NodeProperty, TimeParameter};
use crate::err::{EngineError, EngineResult};
use penstock_model::index::{LinkHandle, NodeHandle, PatternHandle};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A pump: contributes `flow` to the tanks and draws `power` kilowatts when
/// running at speed factor 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoPump {
    pub id: String,
    /// Id of the speed pattern driving this pump.
    pub pattern: String,
    /// Delivered flow at full speed, volume units per hour.
    pub flow: f64,
    /// Electrical power draw at full speed, kW.
    pub power: f64,
}

/// A storage tank integrating the network mass balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoTank {
    pub id: String,
    /// Head at the start of the simulation.
    pub initial_head: f64,
    /// Equivalent free-surface area; larger tanks move slower.
    pub area: f64,
}

/// A monitored junction whose pressure responds to pump operation and tank
/// storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoJunction {
    pub id: String,
    /// Pressure with all pumps off and tanks at their initial heads.
    pub base_pressure: f64,
    /// Pressure gain per unit speed of each pump.
    pub pump_gain: Vec<f64>,
    /// Pressure response to the mean tank head deviating from its initial
    /// value.
    pub head_coupling: f64,
}

/// The serde network description consumed by [`DemoEngine::load`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoNetwork {
    /// Hydraulic integration interval in seconds.
    pub hyd_timestep: i64,
    /// Default simulation duration in seconds; overridden per run via
    /// [`TimeParameter::Duration`].
    pub duration: i64,
    /// Energy price per period; cycled when the horizon is longer.
    pub tariff: Vec<f64>,
    /// Total network demand per period, volume units per hour; cycled.
    pub demand: Vec<f64>,
    pub pumps: Vec<DemoPump>,
    pub tanks: Vec<DemoTank>,
    pub junctions: Vec<DemoJunction>,
    /// Absolute clock times (seconds) at which a hydraulic event splits the
    /// enclosing period, producing a fractional step.
    #[serde(default)]
    pub mid_period_events: Vec<i64>,
}

impl DemoNetwork {
    /// The three-pump, three-tank, three-junction fixture mirroring the
    /// reference test network's shape and bounds.
    pub fn reference() -> Self {
        let tariff = vec![
            0.8, 0.8, 0.8, 0.8, 0.8, 0.8, // night
            1.5, 1.5, 1.5, 1.5, 2.0, 2.0, // morning into midday peak
            2.0, 2.0, 1.5, 1.5, 1.5, 1.5, // afternoon
            1.2, 1.2, 1.0, 1.0, 0.8, 0.8, // evening
        ];
        let demand = vec![
            90.0, 85.0, 80.0, 80.0, 90.0, 110.0, //
            150.0, 180.0, 190.0, 185.0, 180.0, 175.0, //
            170.0, 170.0, 165.0, 165.0, 170.0, 185.0, //
            195.0, 185.0, 160.0, 130.0, 110.0, 95.0, //
        ];

        Self {
            hyd_timestep: 3600,
            duration: 24 * 3600,
            tariff,
            demand,
            pumps: vec![
                DemoPump {
                    id: "111".to_string(),
                    pattern: "PMP111".to_string(),
                    flow: 110.0,
                    power: 40.0,
                },
                DemoPump {
                    id: "222".to_string(),
                    pattern: "PMP222".to_string(),
                    flow: 120.0,
                    power: 45.0,
                },
                DemoPump {
                    id: "333".to_string(),
                    pattern: "PMP333".to_string(),
                    flow: 130.0,
                    power: 50.0,
                },
            ],
            tanks: vec![
                DemoTank {
                    id: "65".to_string(),
                    initial_head: 66.93,
                    area: 600.0,
                },
                DemoTank {
                    id: "165".to_string(),
                    initial_head: 66.93,
                    area: 600.0,
                },
                DemoTank {
                    id: "265".to_string(),
                    initial_head: 66.93,
                    area: 600.0,
                },
            ],
            junctions: vec![
                DemoJunction {
                    id: "55".to_string(),
                    base_pressure: 42.4,
                    pump_gain: vec![1.2, 0.8, 0.5],
                    head_coupling: 2.0,
                },
                DemoJunction {
                    id: "90".to_string(),
                    base_pressure: 51.6,
                    pump_gain: vec![0.6, 1.1, 0.7],
                    head_coupling: 2.0,
                },
                DemoJunction {
                    id: "170".to_string(),
                    base_pressure: 30.9,
                    pump_gain: vec![0.4, 0.6, 1.0],
                    head_coupling: 1.5,
                },
            ],
            mid_period_events: Vec::new(),
        }
    }

    /// A minimal single-pump, single-tank fixture with wide bounds, sized
    /// for short-horizon unit tests.
    pub fn tiny(horizon_periods: usize) -> Self {
        Self {
            hyd_timestep: 3600,
            duration: horizon_periods as i64 * 3600,
            tariff: vec![1.0],
            demand: vec![50.0],
            pumps: vec![DemoPump {
                id: "P1".to_string(),
                pattern: "PMPP1".to_string(),
                flow: 100.0,
                power: 10.0,
            }],
            tanks: vec![DemoTank {
                id: "T1".to_string(),
                initial_head: 50.0,
                area: 100.0,
            }],
            junctions: vec![DemoJunction {
                id: "J1".to_string(),
                base_pressure: 40.0,
                pump_gain: vec![2.0],
                head_coupling: 1.0,
            }],
            mid_period_events: Vec::new(),
        }
    }

    #[inline]
    fn initial_mean_head(&self) -> f64 {
        if self.tanks.is_empty() {
            0.0
        } else {
            self.tanks.iter().map(|t| t.initial_head).sum::<f64>() / self.tanks.len() as f64
        }
    }
}

/// Persisted hydraulic state, the payload of `save_hydraulics_file`.
///
/// Pattern entries are project data, not hydraulic state, and are
/// intentionally not part of the snapshot (matching the toolkit convention
/// the search relies on when it rewinds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DemoState {
    clock: i64,
    tank_heads: Vec<f64>,
    pump_costs: Vec<f64>,
}

/// Hydraulic quantities valid for the interval solved by the last
/// `run_step`.
#[derive(Debug, Clone, Default)]
struct CurrentHydraulics {
    speeds: Vec<f64>,
    pressures: Vec<f64>,
}

/// The demo hydraulic engine. One instance per worker; never shared.
#[derive(Debug)]
pub struct DemoEngine {
    network: Option<DemoNetwork>,
    /// Node handle space: tanks first, then junctions.
    node_ids: Vec<String>,
    /// Link handle space: pumps.
    link_ids: Vec<String>,
    /// Pattern handle space: one speed pattern per pump, then the tariff
    /// pattern `PRICES`.
    pattern_ids: Vec<String>,
    speed_patterns: Vec<Vec<f64>>,
    start_time: i64,
    duration: i64,
    report_start: i64,
    hydraulics_open: bool,
    initialized: bool,
    state: DemoState,
    current: CurrentHydraulics,
}

impl Default for DemoEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoEngine {
    /// Creates an engine with no project loaded.
    pub fn new() -> Self {
        Self {
            network: None,
            node_ids: Vec::new(),
            link_ids: Vec::new(),
            pattern_ids: Vec::new(),
            speed_patterns: Vec::new(),
            start_time: 0,
            duration: 0,
            report_start: 0,
            hydraulics_open: false,
            initialized: false,
            state: DemoState {
                clock: 0,
                tank_heads: Vec::new(),
                pump_costs: Vec::new(),
            },
            current: CurrentHydraulics::default(),
        }
    }

    /// Creates an engine with the given network installed, bypassing file
    /// I/O. Test convenience.
    pub fn from_network(network: DemoNetwork) -> Self {
        let mut engine = Self::new();
        engine.install(network);
        engine
    }

    /// Returns `true` while the hydraulics solver buffers are acquired.
    #[inline]
    pub fn hydraulics_open(&self) -> bool {
        self.hydraulics_open
    }

    fn install(&mut self, network: DemoNetwork) {
        self.node_ids = network
            .tanks
            .iter()
            .map(|t| t.id.clone())
            .chain(network.junctions.iter().map(|j| j.id.clone()))
            .collect();
        self.link_ids = network.pumps.iter().map(|p| p.id.clone()).collect();
        self.pattern_ids = network
            .pumps
            .iter()
            .map(|p| p.pattern.clone())
            .chain(std::iter::once("PRICES".to_string()))
            .collect();
        self.speed_patterns = vec![Vec::new(); network.pumps.len()];
        self.duration = network.duration;
        self.start_time = 0;
        self.report_start = 0;
        self.hydraulics_open = false;
        self.initialized = false;
        self.state = DemoState {
            clock: 0,
            tank_heads: network.tanks.iter().map(|t| t.initial_head).collect(),
            pump_costs: vec![0.0; network.pumps.len()],
        };
        self.current = CurrentHydraulics::default();
        self.network = Some(network);
    }

    fn network(&self) -> EngineResult<&DemoNetwork> {
        self.network
            .as_ref()
            .ok_or_else(|| EngineError::new(102, "project", "no network data loaded"))
    }

    fn require_open(&self, operation: &'static str) -> EngineResult<()> {
        if !self.hydraulics_open {
            return Err(EngineError::new(103, operation, "hydraulics not opened"));
        }
        Ok(())
    }

    /// The period owning clock time `t`.
    #[inline]
    fn period_at(&self, t: i64, timestep: i64) -> usize {
        (t / timestep).max(0) as usize
    }

    fn speed_of(&self, pump: usize, period: usize) -> f64 {
        self.speed_patterns[pump]
            .get(period)
            .copied()
            .unwrap_or(0.0)
    }

    /// Solves the affine pressure model for the current clock period.
    fn solve_current(&mut self) -> EngineResult<()> {
        let network = self.network()?;
        let timestep = network.hyd_timestep;
        let period = self.period_at(self.state.clock, timestep);

        let speeds: Vec<f64> = (0..network.pumps.len())
            .map(|p| self.speed_of(p, period))
            .collect();

        let mean_head = if network.tanks.is_empty() {
            0.0
        } else {
            self.state.tank_heads.iter().sum::<f64>() / self.state.tank_heads.len() as f64
        };
        let head_offset = mean_head - network.initial_mean_head();

        let pressures: Vec<f64> = network
            .junctions
            .iter()
            .map(|junction| {
                let pump_lift: f64 = junction
                    .pump_gain
                    .iter()
                    .zip(speeds.iter())
                    .map(|(gain, speed)| gain * speed)
                    .sum();
                junction.base_pressure + pump_lift + junction.head_coupling * head_offset
            })
            .collect();

        self.current = CurrentHydraulics { speeds, pressures };
        Ok(())
    }
}

impl HydraulicEngine for DemoEngine {
    fn load(
        &mut self,
        inp_file: &Path,
        rpt_file: &Path,
        out_file: Option<&Path>,
    ) -> EngineResult<()> {
        let raw = std::fs::read_to_string(inp_file).map_err(|error| {
            EngineError::new(
                101,
                "load",
                format!("cannot open input file {}: {}", inp_file.display(), error),
            )
        })?;
        let network: DemoNetwork = serde_json::from_str(&raw).map_err(|error| {
            EngineError::new(
                102,
                "load",
                format!("invalid network description: {}", error),
            )
        })?;

        // The report file is created eagerly like the toolkit does; a write
        // failure is a fatal project error.
        if !rpt_file.as_os_str().is_empty() {
            std::fs::write(rpt_file, "penstock demo engine report\n").map_err(|error| {
                EngineError::new(
                    103,
                    "load",
                    format!("cannot create report file {}: {}", rpt_file.display(), error),
                )
            })?;
        }
        if let Some(out) = out_file {
            if !out.as_os_str().is_empty() {
                std::fs::write(out, []).map_err(|error| {
                    EngineError::new(
                        104,
                        "load",
                        format!("cannot create output file {}: {}", out.display(), error),
                    )
                })?;
            }
        }

        tracing::debug!(
            inp = %inp_file.display(),
            pumps = network.pumps.len(),
            tanks = network.tanks.len(),
            "demo network loaded"
        );
        self.install(network);
        Ok(())
    }

    fn set_time_parameter(&mut self, parameter: TimeParameter, seconds: i64) -> EngineResult<()> {
        if seconds < 0 {
            return Err(EngineError::new(
                20,
                "set_time_parameter",
                format!("negative time value: {}", seconds),
            ));
        }
        match parameter {
            TimeParameter::StartTime => self.start_time = seconds,
            TimeParameter::Duration => self.duration = seconds,
            TimeParameter::ReportStart => self.report_start = seconds,
        }
        Ok(())
    }

    fn open_hydraulics(&mut self) -> EngineResult<()> {
        self.network()?;
        if self.hydraulics_open {
            return Err(EngineError::new(
                30,
                "open_hydraulics",
                "hydraulics already opened",
            ));
        }
        self.hydraulics_open = true;
        self.initialized = false;
        Ok(())
    }

    fn init_hydraulics(&mut self, _mode: InitMode) -> EngineResult<()> {
        self.require_open("init_hydraulics")?;
        let network = self.network()?;
        self.state = DemoState {
            clock: self.start_time,
            tank_heads: network.tanks.iter().map(|t| t.initial_head).collect(),
            pump_costs: vec![0.0; network.pumps.len()],
        };
        self.initialized = true;
        self.solve_current()
    }

    fn run_step(&mut self) -> EngineResult<i64> {
        self.require_open("run_step")?;
        if !self.initialized {
            return Err(EngineError::new(
                103,
                "run_step",
                "hydraulics not initialized",
            ));
        }
        if self.state.clock > self.duration {
            return Err(EngineError::new(
                40,
                "run_step",
                format!(
                    "clock {} past duration {}",
                    self.state.clock, self.duration
                ),
            ));
        }
        self.solve_current()?;
        Ok(self.state.clock)
    }

    fn next_step(&mut self) -> EngineResult<i64> {
        self.require_open("next_step")?;
        let network = self
            .network
            .as_ref()
            .ok_or_else(|| EngineError::new(102, "next_step", "no network data loaded"))?;
        let timestep = network.hyd_timestep;

        if self.state.clock >= self.duration {
            return Ok(0);
        }

        // Natural step: to the next period boundary, capped by the horizon.
        let into_period = self.state.clock.rem_euclid(timestep);
        let mut dt = (timestep - into_period).min(self.duration - self.state.clock);

        // An injected hydraulic event inside the step shortens it.
        for &event in &network.mid_period_events {
            if event > self.state.clock && event < self.state.clock + dt {
                dt = event - self.state.clock;
            }
        }

        let period = (self.state.clock / timestep).max(0) as usize;
        let hours = dt as f64 / 3600.0;
        let tariff = network.tariff[period % network.tariff.len()];
        let demand = network.demand[period % network.demand.len()];

        let inflow: f64 = network
            .pumps
            .iter()
            .enumerate()
            .map(|(p, pump)| pump.flow * self.current.speeds.get(p).copied().unwrap_or(0.0))
            .sum();

        let head_deltas: Vec<f64> = if network.tanks.is_empty() {
            Vec::new()
        } else {
            let net_per_tank = (inflow - demand) / network.tanks.len() as f64;
            network
                .tanks
                .iter()
                .map(|tank| net_per_tank * hours / tank.area)
                .collect()
        };
        let cost_deltas: Vec<f64> = network
            .pumps
            .iter()
            .enumerate()
            .map(|(p, pump)| {
                pump.power * self.current.speeds.get(p).copied().unwrap_or(0.0) * tariff * hours
            })
            .collect();

        for (head, delta) in self.state.tank_heads.iter_mut().zip(head_deltas) {
            *head += delta;
        }
        for (cost, delta) in self.state.pump_costs.iter_mut().zip(cost_deltas) {
            *cost += delta;
        }
        self.state.clock += dt;
        Ok(dt)
    }

    fn set_pattern_value(
        &mut self,
        pattern: PatternHandle,
        period: usize,
        value: f64,
    ) -> EngineResult<()> {
        let index = pattern.get();
        if index >= self.speed_patterns.len() {
            if index < self.pattern_ids.len() {
                // The tariff pattern is project data the search must not touch.
                return Err(EngineError::new(
                    12,
                    "set_pattern_value",
                    format!("pattern '{}' is read-only", self.pattern_ids[index]),
                ));
            }
            return Err(EngineError::new(
                11,
                "set_pattern_value",
                format!("unknown pattern handle {}", index),
            ));
        }

        let entries = &mut self.speed_patterns[index];
        if entries.len() <= period {
            entries.resize(period + 1, 0.0);
        }
        entries[period] = value;
        Ok(())
    }

    fn get_pattern_value(&self, pattern: PatternHandle, period: usize) -> EngineResult<f64> {
        let index = pattern.get();
        if index < self.speed_patterns.len() {
            return Ok(self.speed_patterns[index].get(period).copied().unwrap_or(0.0));
        }
        if index < self.pattern_ids.len() {
            let network = self.network()?;
            return Ok(network.tariff[period % network.tariff.len()]);
        }
        Err(EngineError::new(
            11,
            "get_pattern_value",
            format!("unknown pattern handle {}", index),
        ))
    }

    fn node_value(&self, node: NodeHandle, property: NodeProperty) -> EngineResult<f64> {
        let network = self.network()?;
        let index = node.get();
        let num_tanks = network.tanks.len();

        if index < num_tanks {
            // Tanks sit at datum elevation in this model, so head and
            // pressure coincide.
            return Ok(self.state.tank_heads[index]);
        }

        let junction = index - num_tanks;
        match self.current.pressures.get(junction) {
            Some(&pressure) => match property {
                NodeProperty::Pressure | NodeProperty::Head => Ok(pressure),
            },
            None => Err(EngineError::new(
                10,
                "node_value",
                format!("unknown node handle {}", index),
            )),
        }
    }

    fn link_value(&self, link: LinkHandle, property: LinkProperty) -> EngineResult<f64> {
        let network = self.network()?;
        let index = link.get();
        let pump = network.pumps.get(index).ok_or_else(|| {
            EngineError::new(
                11,
                "link_value",
                format!("unknown link handle {}", index),
            )
        })?;
        let speed = self.current.speeds.get(index).copied().unwrap_or(0.0);
        match property {
            LinkProperty::Energy => Ok(pump.power * speed),
            LinkProperty::Setting => Ok(speed),
        }
    }

    fn pump_total_cost(&self, link: LinkHandle) -> EngineResult<f64> {
        let index = link.get();
        self.state.pump_costs.get(index).copied().ok_or_else(|| {
            EngineError::new(
                11,
                "pump_total_cost",
                format!("unknown link handle {}", index),
            )
        })
    }

    fn save_hydraulics_file(&self, path: &Path) -> EngineResult<()> {
        let payload = serde_json::to_vec(&self.state).map_err(|error| {
            EngineError::new(50, "save_hydraulics_file", error.to_string())
        })?;
        std::fs::write(path, payload).map_err(|error| {
            EngineError::new(
                50,
                "save_hydraulics_file",
                format!("cannot write {}: {}", path.display(), error),
            )
        })
    }

    fn use_hydraulics_file(&mut self, path: &Path) -> EngineResult<()> {
        let raw = std::fs::read(path).map_err(|error| {
            EngineError::new(
                51,
                "use_hydraulics_file",
                format!("cannot read {}: {}", path.display(), error),
            )
        })?;
        let state: DemoState = serde_json::from_slice(&raw).map_err(|error| {
            EngineError::new(52, "use_hydraulics_file", error.to_string())
        })?;
        self.state = state;
        self.initialized = true;
        self.solve_current()
    }

    fn close_hydraulics(&mut self) -> EngineResult<()> {
        if !self.hydraulics_open {
            return Err(EngineError::new(
                32,
                "close_hydraulics",
                "hydraulics not opened",
            ));
        }
        self.hydraulics_open = false;
        self.initialized = false;
        Ok(())
    }

    fn close(&mut self) -> EngineResult<()> {
        *self = Self::new();
        Ok(())
    }

    fn node_index(&self, id: &str) -> EngineResult<NodeHandle> {
        self.node_ids
            .iter()
            .position(|node| node == id)
            .map(NodeHandle::new)
            .ok_or_else(|| EngineError::new(105, "node_index", format!("undefined node '{}'", id)))
    }

    fn link_index(&self, id: &str) -> EngineResult<LinkHandle> {
        self.link_ids
            .iter()
            .position(|link| link == id)
            .map(LinkHandle::new)
            .ok_or_else(|| EngineError::new(105, "link_index", format!("undefined link '{}'", id)))
    }

    fn pattern_index(&self, id: &str) -> EngineResult<PatternHandle> {
        self.pattern_ids
            .iter()
            .position(|pattern| pattern == id)
            .map(PatternHandle::new)
            .ok_or_else(|| {
                EngineError::new(105, "pattern_index", format!("undefined pattern '{}'", id))
            })
    }

    fn hydraulic_timestep(&self) -> i64 {
        self.network.as_ref().map_or(3600, |n| n.hyd_timestep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened(network: DemoNetwork) -> DemoEngine {
        let mut engine = DemoEngine::from_network(network);
        engine.open_hydraulics().unwrap();
        engine.init_hydraulics(InitMode::NoSave).unwrap();
        engine
    }

    fn pattern_of(engine: &DemoEngine, id: &str) -> PatternHandle {
        engine.pattern_index(id).unwrap()
    }

    #[test]
    fn test_index_resolution() {
        let engine = DemoEngine::from_network(DemoNetwork::reference());
        assert_eq!(engine.node_index("65").unwrap().get(), 0);
        assert_eq!(engine.node_index("55").unwrap().get(), 3);
        assert_eq!(engine.link_index("222").unwrap().get(), 1);
        assert_eq!(engine.pattern_index("PMP333").unwrap().get(), 2);
        assert_eq!(engine.pattern_index("PRICES").unwrap().get(), 3);

        let missing = engine.node_index("999").unwrap_err();
        assert_eq!(missing.code(), 105);
        assert!(missing.is_fatal());
    }

    #[test]
    fn test_run_requires_open_hydraulics() {
        let mut engine = DemoEngine::from_network(DemoNetwork::tiny(4));
        let error = engine.run_step().unwrap_err();
        assert_eq!(error.code(), 103);
    }

    #[test]
    fn test_step_sequence_advances_by_timestep() {
        let mut engine = opened(DemoNetwork::tiny(3));
        for expected_t in [0i64, 3600, 7200] {
            assert_eq!(engine.run_step().unwrap(), expected_t);
            assert_eq!(engine.next_step().unwrap(), 3600);
        }
        // Past the configured duration the step length collapses to zero.
        assert_eq!(engine.next_step().unwrap(), 0);
    }

    #[test]
    fn test_tank_drains_with_pumps_off() {
        let mut engine = opened(DemoNetwork::tiny(2));
        let tank = engine.node_index("T1").unwrap();
        let initial = engine.node_value(tank, NodeProperty::Head).unwrap();

        engine.run_step().unwrap();
        engine.next_step().unwrap();

        // demand 50 over one hour on a 100 area tank: head falls by 0.5.
        let after = engine.node_value(tank, NodeProperty::Head).unwrap();
        assert!((initial - after - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_tank_fills_with_pump_on() {
        let mut engine = opened(DemoNetwork::tiny(2));
        let pattern = pattern_of(&engine, "PMPP1");
        engine.set_pattern_value(pattern, 0, 1.0).unwrap();
        let tank = engine.node_index("T1").unwrap();
        let initial = engine.node_value(tank, NodeProperty::Head).unwrap();

        engine.run_step().unwrap();
        engine.next_step().unwrap();

        // Net inflow 100 - 50 = 50 over one hour on area 100: +0.5.
        let after = engine.node_value(tank, NodeProperty::Head).unwrap();
        assert!((after - initial - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_pump_cost_accrues_with_tariff() {
        let mut engine = opened(DemoNetwork::tiny(2));
        let pattern = pattern_of(&engine, "PMPP1");
        let link = engine.link_index("P1").unwrap();
        engine.set_pattern_value(pattern, 0, 1.0).unwrap();
        engine.set_pattern_value(pattern, 1, 0.0).unwrap();

        engine.run_step().unwrap();
        assert_eq!(engine.link_value(link, LinkProperty::Setting).unwrap(), 1.0);
        assert_eq!(engine.link_value(link, LinkProperty::Energy).unwrap(), 10.0);
        engine.next_step().unwrap();
        // power 10 * speed 1 * tariff 1 * 1h = 10.
        assert!((engine.pump_total_cost(link).unwrap() - 10.0).abs() < 1e-9);

        engine.run_step().unwrap();
        engine.next_step().unwrap();
        // Pump off in the second period; no further cost.
        assert!((engine.pump_total_cost(link).unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_init_resets_state() {
        let mut engine = opened(DemoNetwork::tiny(2));
        let pattern = pattern_of(&engine, "PMPP1");
        let link = engine.link_index("P1").unwrap();
        engine.set_pattern_value(pattern, 0, 1.0).unwrap();
        engine.run_step().unwrap();
        engine.next_step().unwrap();
        assert!(engine.pump_total_cost(link).unwrap() > 0.0);

        engine.init_hydraulics(InitMode::NoSave).unwrap();
        assert_eq!(engine.pump_total_cost(link).unwrap(), 0.0);
        assert_eq!(engine.run_step().unwrap(), 0);
    }

    #[test]
    fn test_pattern_entries_survive_reinit() {
        // Pattern data is project state, not hydraulic state.
        let mut engine = opened(DemoNetwork::tiny(2));
        let pattern = pattern_of(&engine, "PMPP1");
        engine.set_pattern_value(pattern, 1, 1.0).unwrap();
        engine.init_hydraulics(InitMode::NoSave).unwrap();
        assert_eq!(engine.get_pattern_value(pattern, 1).unwrap(), 1.0);
        assert_eq!(engine.get_pattern_value(pattern, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_mid_period_event_produces_fractional_step() {
        let mut network = DemoNetwork::tiny(3);
        network.mid_period_events = vec![3600 + 1800]; // middle of period 1
        let mut engine = opened(network);

        engine.run_step().unwrap();
        assert_eq!(engine.next_step().unwrap(), 3600);

        engine.run_step().unwrap();
        assert_eq!(engine.next_step().unwrap(), 1800);

        // The remainder of the split period follows.
        engine.run_step().unwrap();
        assert_eq!(engine.next_step().unwrap(), 1800);
    }

    #[test]
    fn test_pressures_respond_to_pump_and_head() {
        let mut engine = opened(DemoNetwork::tiny(2));
        let node = engine.node_index("J1").unwrap();
        engine.run_step().unwrap();
        let off = engine.node_value(node, NodeProperty::Pressure).unwrap();
        assert!((off - 40.0).abs() < 1e-9);

        let pattern = pattern_of(&engine, "PMPP1");
        engine.set_pattern_value(pattern, 0, 1.0).unwrap();
        engine.run_step().unwrap();
        let on = engine.node_value(node, NodeProperty::Pressure).unwrap();
        assert!((on - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_tariff_pattern_is_read_only() {
        let mut engine = opened(DemoNetwork::reference());
        let prices = engine.pattern_index("PRICES").unwrap();
        assert_eq!(engine.get_pattern_value(prices, 0).unwrap(), 0.8);
        let error = engine.set_pattern_value(prices, 0, 9.9).unwrap_err();
        assert_eq!(error.code(), 12);
    }

    #[test]
    fn test_save_and_restore_hydraulics_file() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = dir.path().join("hour1.hyd");

        let mut engine = opened(DemoNetwork::tiny(3));
        let pattern = pattern_of(&engine, "PMPP1");
        let tank = engine.node_index("T1").unwrap();
        engine.set_pattern_value(pattern, 0, 1.0).unwrap();
        engine.run_step().unwrap();
        engine.next_step().unwrap();

        let head_at_save = engine.node_value(tank, NodeProperty::Head).unwrap();
        engine.save_hydraulics_file(&checkpoint).unwrap();

        // Advance further, then rewind.
        engine.run_step().unwrap();
        engine.next_step().unwrap();
        assert_ne!(
            engine.node_value(tank, NodeProperty::Head).unwrap(),
            head_at_save
        );

        engine.use_hydraulics_file(&checkpoint).unwrap();
        assert_eq!(
            engine.node_value(tank, NodeProperty::Head).unwrap(),
            head_at_save
        );
        assert_eq!(engine.run_step().unwrap(), 3600);
    }

    #[test]
    fn test_load_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let inp = dir.path().join("net.json");
        let rpt = dir.path().join("net.rpt");
        std::fs::write(
            &inp,
            serde_json::to_string(&DemoNetwork::reference()).unwrap(),
        )
        .unwrap();

        let mut engine = DemoEngine::new();
        engine.load(&inp, &rpt, None).unwrap();
        assert_eq!(engine.hydraulic_timestep(), 3600);
        assert!(rpt.exists());
        assert!(engine.link_index("111").is_ok());
    }

    #[test]
    fn test_load_rejects_missing_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let rpt = dir.path().join("net.rpt");

        let mut engine = DemoEngine::new();
        let missing = engine
            .load(&dir.path().join("absent.json"), &rpt, None)
            .unwrap_err();
        assert_eq!(missing.code(), 101);
        assert!(missing.is_fatal());

        let invalid = dir.path().join("bad.json");
        std::fs::write(&invalid, "not json").unwrap();
        let parse = engine.load(&invalid, &rpt, None).unwrap_err();
        assert_eq!(parse.code(), 102);
        assert!(parse.is_fatal());
    }

    #[test]
    fn test_start_time_offsets_clock() {
        let mut engine = DemoEngine::from_network(DemoNetwork::tiny(4));
        engine
            .set_time_parameter(TimeParameter::StartTime, 7200)
            .unwrap();
        engine.open_hydraulics().unwrap();
        engine.init_hydraulics(InitMode::NoSave).unwrap();
        assert_eq!(engine.run_step().unwrap(), 7200);
    }
}
