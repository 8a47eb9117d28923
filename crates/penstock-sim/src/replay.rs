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

//! Re-evaluation of a finished schedule against a fresh hydraulic run.
//! The returned cost must reproduce the incumbent's recorded cost; this is
//! the consistency check between the search's bookkeeping and the
//! simulator's own energy accounting.

use crate::engine::{HydraulicEngine, HydraulicsSession, InitMode, TimeParameter};
use crate::err::EngineResult;
use penstock_model::network::Network;
use penstock_model::schedule::Schedule;

/// Drives `engine` through the full horizon of `schedule` from a clean
/// hydraulic state and returns the total pump energy cost.
///
/// # Panics
///
/// Panics if the schedule's pump count does not match the network.
pub fn replay_schedule<E>(
    engine: &mut E,
    network: &Network,
    schedule: &Schedule,
) -> EngineResult<f64>
where
    E: HydraulicEngine,
{
    let horizon = schedule.num_periods();
    if horizon == 0 {
        return Ok(0.0);
    }

    assert_eq!(
        schedule.num_pumps(),
        network.num_pumps(),
        "called `replay_schedule` with a schedule for {} pumps against a network with {}",
        schedule.num_pumps(),
        network.num_pumps()
    );

    engine.set_time_parameter(TimeParameter::StartTime, 0)?;
    engine.set_time_parameter(
        TimeParameter::Duration,
        horizon as i64 * network.hyd_timestep(),
    )?;
    engine.set_time_parameter(TimeParameter::ReportStart, 0)?;

    for period in 0..horizon {
        let speeds = schedule.speeds_for_period(period);
        for (pump, &speed) in network.pumps().iter().zip(speeds.iter()) {
            engine.set_pattern_value(pump.pattern(), period, f64::from(speed))?;
        }
    }

    let mut session = HydraulicsSession::open(engine, InitMode::NoSave)?;
    for _ in 0..horizon {
        session.run_step()?;
        session.next_step()?;
    }

    let mut total_cost = 0.0;
    for pump in network.pumps() {
        total_cost += session.pump_total_cost(pump.link())?;
    }
    session.close()?;

    Ok(total_cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{DemoEngine, DemoNetwork};
    use crate::resolve::resolve_network;
    use penstock_model::config::SearchConfig;

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
        config.horizon = horizon;
        let network = resolve_network(&config, &engine).unwrap();
        (engine, network)
    }

    #[test]
    fn test_empty_schedule_costs_nothing() {
        let (mut engine, network) = tiny_setup(4);
        let cost = replay_schedule(&mut engine, &network, &Schedule::empty()).unwrap();
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn test_replay_matches_manual_accounting() {
        let (mut engine, network) = tiny_setup(3);
        // Pump on in periods 0 and 2: power 10, tariff 1.0, one hour each.
        let schedule = Schedule::new(20.0, vec![1, 0, 1], vec![1, 0, 1]);
        let cost = replay_schedule(&mut engine, &network, &schedule).unwrap();
        assert!((cost - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_replay_is_repeatable() {
        let (mut engine, network) = tiny_setup(3);
        let schedule = Schedule::new(10.0, vec![0, 1, 0], vec![0, 1, 0]);
        let first = replay_schedule(&mut engine, &network, &schedule).unwrap();
        let second = replay_schedule(&mut engine, &network, &schedule).unwrap();
        assert_eq!(first, second);
        assert!(!engine.hydraulics_open());
    }
}
