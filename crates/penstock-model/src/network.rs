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

//! # Resolved Network View
//!
//! The static element collections the search operates on, resolved once
//! against a hydraulic engine at startup: pumps with their speed patterns,
//! tanks with admissible level bands, and monitor nodes with minimum
//! pressure thresholds. The reference test network has exactly three of
//! each, but the collections are variable-length by design.

use crate::index::{LinkHandle, MonitorIndex, NodeHandle, PatternHandle, PumpIndex, TankIndex};
use penstock_core::math::interval::ClosedInterval;

/// A pump together with the engine handles needed to drive it: its link and
/// the speed pattern whose entries hold the per-period speed factors.
#[derive(Debug, Clone, PartialEq)]
pub struct PumpUnit {
    id: String,
    link: LinkHandle,
    pattern: PatternHandle,
}

impl PumpUnit {
    /// Creates a new pump record.
    #[inline]
    pub fn new(id: impl Into<String>, link: LinkHandle, pattern: PatternHandle) -> Self {
        Self {
            id: id.into(),
            link,
            pattern,
        }
    }

    /// Returns the external id of the pump.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the engine handle of the pump link.
    #[inline]
    pub fn link(&self) -> LinkHandle {
        self.link
    }

    /// Returns the engine handle of the pump's speed pattern.
    #[inline]
    pub fn pattern(&self) -> PatternHandle {
        self.pattern
    }
}

impl std::fmt::Display for PumpUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pump[{}](link: {}, pattern: {})",
            self.id, self.link, self.pattern
        )
    }
}

/// A storage tank with its admissible head band and initial head.
#[derive(Debug, Clone, PartialEq)]
pub struct Tank {
    id: String,
    node: NodeHandle,
    levels: ClosedInterval,
    initial_level: f64,
}

impl Tank {
    /// Creates a new tank record.
    #[inline]
    pub fn new(
        id: impl Into<String>,
        node: NodeHandle,
        levels: ClosedInterval,
        initial_level: f64,
    ) -> Self {
        Self {
            id: id.into(),
            node,
            levels,
            initial_level,
        }
    }

    /// Returns the external id of the tank.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the engine handle of the tank node.
    #[inline]
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    /// Returns the admissible head band.
    #[inline]
    pub fn levels(&self) -> ClosedInterval {
        self.levels
    }

    /// Returns the head the tank starts the horizon with. End-of-horizon
    /// stability requires the final head to be at least this value.
    #[inline]
    pub fn initial_level(&self) -> f64 {
        self.initial_level
    }
}

impl std::fmt::Display for Tank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tank[{}](node: {}, levels: {}, initial: {})",
            self.id, self.node, self.levels, self.initial_level
        )
    }
}

/// A monitored junction node with its minimum admissible pressure.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorNode {
    id: String,
    node: NodeHandle,
    min_pressure: f64,
}

impl MonitorNode {
    /// Creates a new monitor-node record.
    #[inline]
    pub fn new(id: impl Into<String>, node: NodeHandle, min_pressure: f64) -> Self {
        Self {
            id: id.into(),
            node,
            min_pressure,
        }
    }

    /// Returns the external id of the node.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the engine handle of the node.
    #[inline]
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    /// Returns the minimum admissible pressure at this node.
    #[inline]
    pub fn min_pressure(&self) -> f64 {
        self.min_pressure
    }
}

impl std::fmt::Display for MonitorNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Monitor[{}](node: {}, min_pressure: {})",
            self.id, self.node, self.min_pressure
        )
    }
}

/// The immutable network view consumed by the search engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    pumps: Vec<PumpUnit>,
    tanks: Vec<Tank>,
    monitors: Vec<MonitorNode>,
    /// The engine's hydraulic integration interval in seconds; one decision
    /// period spans exactly one such interval.
    hyd_timestep: i64,
}

impl Network {
    /// Returns the number of pumps.
    #[inline]
    pub fn num_pumps(&self) -> usize {
        self.pumps.len()
    }

    /// Returns the number of tanks.
    #[inline]
    pub fn num_tanks(&self) -> usize {
        self.tanks.len()
    }

    /// Returns the number of monitor nodes.
    #[inline]
    pub fn num_monitors(&self) -> usize {
        self.monitors.len()
    }

    /// Returns the pump at the given slot.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn pump(&self, index: PumpIndex) -> &PumpUnit {
        &self.pumps[index.get()]
    }

    /// Returns the tank at the given slot.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn tank(&self, index: TankIndex) -> &Tank {
        &self.tanks[index.get()]
    }

    /// Returns the monitor node at the given slot.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn monitor(&self, index: MonitorIndex) -> &MonitorNode {
        &self.monitors[index.get()]
    }

    /// Returns a slice of all pumps.
    #[inline]
    pub fn pumps(&self) -> &[PumpUnit] {
        &self.pumps
    }

    /// Returns a slice of all tanks.
    #[inline]
    pub fn tanks(&self) -> &[Tank] {
        &self.tanks
    }

    /// Returns a slice of all monitor nodes.
    #[inline]
    pub fn monitors(&self) -> &[MonitorNode] {
        &self.monitors
    }

    /// Returns the hydraulic timestep in seconds.
    #[inline]
    pub fn hyd_timestep(&self) -> i64 {
        self.hyd_timestep
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Network (hydraulic timestep: {}s)", self.hyd_timestep)?;
        for pump in &self.pumps {
            writeln!(f, "  {}", pump)?;
        }
        for tank in &self.tanks {
            writeln!(f, "  {}", tank)?;
        }
        for monitor in &self.monitors {
            writeln!(f, "  {}", monitor)?;
        }
        Ok(())
    }
}

/// Mutable builder for [`Network`].
///
/// Element resolution against a live engine happens in `penstock_sim`; the
/// builder itself only collects records and validates the final shape.
#[derive(Debug, Clone, Default)]
pub struct NetworkBuilder {
    pumps: Vec<PumpUnit>,
    tanks: Vec<Tank>,
    monitors: Vec<MonitorNode>,
    hyd_timestep: i64,
}

impl NetworkBuilder {
    /// Creates an empty builder.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hydraulic timestep in seconds.
    #[inline]
    pub fn hyd_timestep(mut self, seconds: i64) -> Self {
        self.hyd_timestep = seconds;
        self
    }

    /// Adds a pump record.
    #[inline]
    pub fn pump(mut self, pump: PumpUnit) -> Self {
        self.pumps.push(pump);
        self
    }

    /// Adds a tank record.
    #[inline]
    pub fn tank(mut self, tank: Tank) -> Self {
        self.tanks.push(tank);
        self
    }

    /// Adds a monitor-node record.
    #[inline]
    pub fn monitor(mut self, monitor: MonitorNode) -> Self {
        self.monitors.push(monitor);
        self
    }

    /// Finalizes the network.
    ///
    /// # Panics
    ///
    /// Panics if no pump was added or the hydraulic timestep is not
    /// positive. Tanks and monitors may legitimately be empty in reduced
    /// test fixtures.
    pub fn build(self) -> Network {
        assert!(
            !self.pumps.is_empty(),
            "called `NetworkBuilder::build` without any pumps"
        );
        assert!(
            self.hyd_timestep > 0,
            "called `NetworkBuilder::build` with non-positive hydraulic timestep: {}",
            self.hyd_timestep
        );

        Network {
            pumps: self.pumps,
            tanks: self.tanks,
            monitors: self.monitors,
            hyd_timestep: self.hyd_timestep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_network() -> Network {
        let levels = ClosedInterval::new(66.531, 71.529);
        NetworkBuilder::new()
            .hyd_timestep(3600)
            .pump(PumpUnit::new(
                "111",
                LinkHandle::new(10),
                PatternHandle::new(1),
            ))
            .pump(PumpUnit::new(
                "222",
                LinkHandle::new(11),
                PatternHandle::new(2),
            ))
            .pump(PumpUnit::new(
                "333",
                LinkHandle::new(12),
                PatternHandle::new(3),
            ))
            .tank(Tank::new("65", NodeHandle::new(20), levels, 66.93))
            .tank(Tank::new("165", NodeHandle::new(21), levels, 66.93))
            .tank(Tank::new("265", NodeHandle::new(22), levels, 66.93))
            .monitor(MonitorNode::new("55", NodeHandle::new(30), 42.0))
            .monitor(MonitorNode::new("90", NodeHandle::new(31), 51.0))
            .monitor(MonitorNode::new("170", NodeHandle::new(32), 30.0))
            .build()
    }

    #[test]
    fn test_builder_produces_reference_shape() {
        let network = reference_network();
        assert_eq!(network.num_pumps(), 3);
        assert_eq!(network.num_tanks(), 3);
        assert_eq!(network.num_monitors(), 3);
        assert_eq!(network.hyd_timestep(), 3600);
    }

    #[test]
    fn test_typed_slot_accessors() {
        let network = reference_network();
        assert_eq!(network.pump(PumpIndex::new(0)).id(), "111");
        assert_eq!(network.pump(PumpIndex::new(2)).pattern().get(), 3);
        assert_eq!(network.tank(TankIndex::new(1)).id(), "165");
        assert_eq!(network.monitor(MonitorIndex::new(2)).min_pressure(), 30.0);
    }

    #[test]
    fn test_tank_level_band_is_inclusive() {
        let network = reference_network();
        let tank = network.tank(TankIndex::new(0));
        assert!(tank.levels().contains(66.531));
        assert!(tank.levels().contains(71.529));
        assert!(!tank.levels().contains(66.5));
        assert_eq!(tank.initial_level(), 66.93);
    }

    #[test]
    #[should_panic(expected = "without any pumps")]
    fn test_build_panics_without_pumps() {
        let _ = NetworkBuilder::new().hyd_timestep(3600).build();
    }

    #[test]
    #[should_panic(expected = "non-positive hydraulic timestep")]
    fn test_build_panics_on_zero_timestep() {
        let _ = NetworkBuilder::new()
            .pump(PumpUnit::new(
                "111",
                LinkHandle::new(0),
                PatternHandle::new(0),
            ))
            .build();
    }

    #[test]
    fn test_display_lists_all_elements() {
        let network = reference_network();
        let shown = format!("{}", network);
        assert!(shown.contains("Pump[111]"));
        assert!(shown.contains("Tank[265]"));
        assert!(shown.contains("Monitor[170]"));
    }
}
