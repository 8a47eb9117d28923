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

//! # Search Configuration
//!
//! All knobs of the scheduling search with defaults matching the reference
//! test network. The configuration is plain data: it can be assembled with
//! builder-style `with_*` calls, serialized, or overlaid from a JSON file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The state-restoration strategy used when the search backtracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointMode {
    /// Re-initialize the hydraulics and re-run the decision prefix from
    /// period zero. Reference semantics; no scratch files.
    #[default]
    Replay,
    /// Save the hydraulics state per depth (`hour{N}.hyd` in the worker's
    /// scratch directory) and reload it on backtrack. Performance path.
    File,
}

impl std::fmt::Display for CheckpointMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckpointMode::Replay => write!(f, "replay"),
            CheckpointMode::File => write!(f, "file"),
        }
    }
}

impl std::str::FromStr for CheckpointMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "replay" => Ok(CheckpointMode::Replay),
            "file" => Ok(CheckpointMode::File),
            other => Err(format!(
                "unknown checkpoint mode '{}', expected 'replay' or 'file'",
                other
            )),
        }
    }
}

/// The complete configuration of one engine run.
///
/// Defaults reproduce the reference network: three pumps `{111, 222, 333}`
/// with speed patterns `PMP<id>`, tanks `{65, 165, 265}` with head band
/// `[66.531, 71.529]` and initial head `66.93`, monitor nodes
/// `{55, 90, 170}` with minimum pressures `{42, 51, 30}`, a 24-period
/// horizon and the on/off speed domain.
///
/// `max_actuations` bounds the number of speed transitions **per pump**
/// across the horizon, counting both off→on and on→off switches. It is
/// disabled when `None` (the default).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Path to the network input file.
    pub inp_file: PathBuf,
    /// Path to the report file handed to the hydraulic engine.
    pub rpt_file: PathBuf,
    /// Optional binary output file handed to the hydraulic engine.
    pub out_file: Option<PathBuf>,
    /// Horizon length in periods.
    pub horizon: usize,
    /// External ids of the scheduled pumps, in decision-vector order.
    pub pump_ids: Vec<String>,
    /// Prefix of the speed-pattern id belonging to each pump
    /// (pattern id = prefix + pump id).
    pub pattern_prefix: String,
    /// External ids of the tanks subject to level and stability checks.
    pub tank_ids: Vec<String>,
    /// External ids of the pressure-monitored nodes.
    pub node_ids: Vec<String>,
    /// Discrete per-pump speed factors.
    pub speed_domain: Vec<u8>,
    /// Minimum admissible pressure per monitored node id.
    pub pressure_thresholds: BTreeMap<String, f64>,
    /// Lower bound of the admissible tank head band.
    pub level_min: f64,
    /// Upper bound of the admissible tank head band.
    pub level_max: f64,
    /// Tank head at the start of the horizon; the end-of-horizon stability
    /// check requires final heads to be at least this value.
    pub initial_level: f64,
    /// Optional per-pump ceiling on speed transitions across the horizon.
    pub max_actuations: Option<u32>,
    /// Backtracking strategy.
    pub checkpoint_mode: CheckpointMode,
    /// Number of parallel rank workers.
    pub num_workers: usize,
    /// Optional wall-clock budget in seconds; the incumbent at expiry is
    /// reported.
    pub time_limit_secs: Option<u64>,
    /// Scratch directory for checkpoint files; a per-run temporary
    /// directory is used when unset.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let mut pressure_thresholds = BTreeMap::new();
        pressure_thresholds.insert("55".to_string(), 42.0);
        pressure_thresholds.insert("90".to_string(), 51.0);
        pressure_thresholds.insert("170".to_string(), 30.0);

        Self {
            inp_file: PathBuf::new(),
            rpt_file: PathBuf::new(),
            out_file: None,
            horizon: 24,
            pump_ids: vec!["111".to_string(), "222".to_string(), "333".to_string()],
            pattern_prefix: "PMP".to_string(),
            tank_ids: vec!["65".to_string(), "165".to_string(), "265".to_string()],
            node_ids: vec!["55".to_string(), "90".to_string(), "170".to_string()],
            speed_domain: vec![0, 1],
            pressure_thresholds,
            level_min: 66.531,
            level_max: 71.529,
            initial_level: 66.93,
            max_actuations: None,
            checkpoint_mode: CheckpointMode::Replay,
            num_workers: 1,
            time_limit_secs: None,
            scratch_dir: None,
        }
    }
}

impl SearchConfig {
    /// Creates a configuration for the given input and report files with
    /// reference defaults for everything else.
    pub fn new(inp_file: impl Into<PathBuf>, rpt_file: impl Into<PathBuf>) -> Self {
        Self {
            inp_file: inp_file.into(),
            rpt_file: rpt_file.into(),
            ..Self::default()
        }
    }

    /// Sets the horizon length in periods.
    #[inline]
    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    /// Sets the discrete speed domain.
    #[inline]
    pub fn with_speed_domain(mut self, domain: Vec<u8>) -> Self {
        self.speed_domain = domain;
        self
    }

    /// Sets the per-pump actuation ceiling.
    #[inline]
    pub fn with_max_actuations(mut self, ceiling: u32) -> Self {
        self.max_actuations = Some(ceiling);
        self
    }

    /// Sets the backtracking strategy.
    #[inline]
    pub fn with_checkpoint_mode(mut self, mode: CheckpointMode) -> Self {
        self.checkpoint_mode = mode;
        self
    }

    /// Sets the number of parallel rank workers.
    #[inline]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.num_workers = workers;
        self
    }

    /// Sets the wall-clock budget in seconds.
    #[inline]
    pub fn with_time_limit_secs(mut self, secs: u64) -> Self {
        self.time_limit_secs = Some(secs);
        self
    }

    /// Sets the scratch directory for checkpoint files.
    #[inline]
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Returns the minimum pressure for a monitored node id, if configured.
    #[inline]
    pub fn pressure_threshold(&self, node_id: &str) -> Option<f64> {
        self.pressure_thresholds.get(node_id).copied()
    }

    /// Returns the speed-pattern id for a pump id.
    #[inline]
    pub fn pattern_id(&self, pump_id: &str) -> String {
        format!("{}{}", self.pattern_prefix, pump_id)
    }

    /// Returns the number of pumps in the decision vector.
    #[inline]
    pub fn num_pumps(&self) -> usize {
        self.pump_ids.len()
    }
}

impl std::fmt::Display for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SearchConfig(horizon: {}, pumps: {:?}, domain: {:?}, workers: {}, checkpoint: {})",
            self.horizon, self.pump_ids, self.speed_domain, self.num_workers, self.checkpoint_mode
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_network() {
        let config = SearchConfig::default();
        assert_eq!(config.horizon, 24);
        assert_eq!(config.pump_ids, vec!["111", "222", "333"]);
        assert_eq!(config.tank_ids, vec!["65", "165", "265"]);
        assert_eq!(config.node_ids, vec!["55", "90", "170"]);
        assert_eq!(config.speed_domain, vec![0, 1]);
        assert_eq!(config.level_min, 66.531);
        assert_eq!(config.level_max, 71.529);
        assert_eq!(config.initial_level, 66.93);
        assert_eq!(config.max_actuations, None);
        assert_eq!(config.checkpoint_mode, CheckpointMode::Replay);
        assert_eq!(config.pressure_threshold("55"), Some(42.0));
        assert_eq!(config.pressure_threshold("90"), Some(51.0));
        assert_eq!(config.pressure_threshold("170"), Some(30.0));
        assert_eq!(config.pressure_threshold("999"), None);
    }

    #[test]
    fn test_pattern_id_uses_prefix() {
        let config = SearchConfig::default();
        assert_eq!(config.pattern_id("111"), "PMP111");
    }

    #[test]
    fn test_builder_style_overrides() {
        let config = SearchConfig::new("net.inp", "net.rpt")
            .with_horizon(6)
            .with_speed_domain(vec![0, 1, 2])
            .with_max_actuations(4)
            .with_checkpoint_mode(CheckpointMode::File)
            .with_workers(2)
            .with_time_limit_secs(30);
        assert_eq!(config.horizon, 6);
        assert_eq!(config.speed_domain, vec![0, 1, 2]);
        assert_eq!(config.max_actuations, Some(4));
        assert_eq!(config.checkpoint_mode, CheckpointMode::File);
        assert_eq!(config.num_workers, 2);
        assert_eq!(config.time_limit_secs, Some(30));
    }

    #[test]
    fn test_checkpoint_mode_parsing() {
        assert_eq!("replay".parse::<CheckpointMode>(), Ok(CheckpointMode::Replay));
        assert_eq!("FILE".parse::<CheckpointMode>(), Ok(CheckpointMode::File));
        assert!("disk".parse::<CheckpointMode>().is_err());
    }

    #[test]
    fn test_json_overlay_keeps_defaults_for_missing_fields() {
        let overlay = r#"{ "horizon": 4, "max_actuations": 2 }"#;
        let config: SearchConfig = serde_json::from_str(overlay).unwrap();
        assert_eq!(config.horizon, 4);
        assert_eq!(config.max_actuations, Some(2));
        // Everything else stays at reference defaults.
        assert_eq!(config.pump_ids, vec!["111", "222", "333"]);
        assert_eq!(config.checkpoint_mode, CheckpointMode::Replay);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = SearchConfig::new("a.inp", "a.rpt").with_workers(4);
        let json = serde_json::to_string(&config).unwrap();
        let back: SearchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
