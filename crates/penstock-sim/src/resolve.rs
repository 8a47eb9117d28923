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

//! Resolution of the configured network elements against a loaded engine:
//! external ids become engine handles, configured bounds become the typed
//! records the evaluator reads. Performed once per engine run.

use crate::engine::HydraulicEngine;
use crate::err::{EngineError, EngineResult};
use penstock_core::math::interval::ClosedInterval;
use penstock_model::config::SearchConfig;
use penstock_model::network::{MonitorNode, Network, NetworkBuilder, PumpUnit, Tank};

/// Resolves the configured pump, tank and monitor-node ids into a
/// [`Network`] using the engine's id lookups.
///
/// Fails with the engine's fatal undefined-element code when an id does not
/// exist in the loaded project, or when a monitored node has no configured
/// pressure threshold.
pub fn resolve_network<E>(config: &SearchConfig, engine: &E) -> EngineResult<Network>
where
    E: HydraulicEngine,
{
    let mut builder = NetworkBuilder::new().hyd_timestep(engine.hydraulic_timestep());

    for id in &config.pump_ids {
        let link = engine.link_index(id)?;
        let pattern = engine.pattern_index(&config.pattern_id(id))?;
        builder = builder.pump(PumpUnit::new(id.clone(), link, pattern));
    }

    let levels = ClosedInterval::new(config.level_min, config.level_max);
    for id in &config.tank_ids {
        let node = engine.node_index(id)?;
        builder = builder.tank(Tank::new(id.clone(), node, levels, config.initial_level));
    }

    for id in &config.node_ids {
        let threshold = config.pressure_threshold(id).ok_or_else(|| {
            EngineError::new(
                105,
                "resolve_network",
                format!("no pressure threshold configured for node '{}'", id),
            )
        })?;
        let node = engine.node_index(id)?;
        builder = builder.monitor(MonitorNode::new(id.clone(), node, threshold));
    }

    Ok(builder.build())
}
