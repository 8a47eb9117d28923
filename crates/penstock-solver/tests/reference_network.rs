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

//! End-to-end runs against the reference-shaped demo network: three pumps
//! with `PMP<id>` speed patterns, three tanks, three monitored nodes.

use penstock_bnb::eval::PruneReason;
use penstock_model::config::SearchConfig;
use penstock_model::schedule::Schedule;
use penstock_sim::demo::{DemoEngine, DemoNetwork};
use penstock_sim::err::EngineResult;
use penstock_sim::replay::replay_schedule;
use penstock_sim::resolve::resolve_network;
use penstock_solver::output;
use penstock_solver::solver::ParallelSolver;

fn reference_config(horizon: usize, workers: usize) -> SearchConfig {
    SearchConfig::new("net.json", "net.rpt")
        .with_horizon(horizon)
        .with_workers(workers)
}

fn reference_factory() -> impl Fn(usize) -> EngineResult<DemoEngine> + Sync {
    |_rank| Ok(DemoEngine::from_network(DemoNetwork::reference()))
}

#[test]
fn test_one_period_run_evaluates_at_most_eight_leaves() {
    let solver = ParallelSolver::new(reference_config(1, 1));
    let report = solver.solve(reference_factory()).unwrap();

    // Three binary pumps: the root has exactly eight successors.
    let depth_one: u64 = PruneReason::ALL
        .iter()
        .map(|&reason| report.statistics().counts(reason)[1])
        .sum();
    assert_eq!(depth_one, 8);
    assert_eq!(report.statistics().total_evaluations(), 8);

    // All-off drains the tanks below their initial head; the cheapest
    // single pump (111 at the night tariff) wins.
    let outcome = report.outcome();
    assert!(outcome.is_optimal());
    let schedule = outcome.result().schedule().unwrap();
    assert!((schedule.cost() - 32.0).abs() < 1e-6);
    assert_eq!(schedule.actuations(), &[1]);
    assert_eq!(schedule.speeds(), &[1, 0, 0]);
    assert_eq!(report.statistics().counts(PruneReason::Stability)[1], 1);
    assert_eq!(report.statistics().counts(PruneReason::None)[1], 1);
    assert_eq!(report.statistics().counts(PruneReason::Cost)[1], 6);
}

#[test]
fn test_two_ranks_partition_the_root_and_agree_on_cost() {
    let single = ParallelSolver::new(reference_config(1, 1))
        .solve(reference_factory())
        .unwrap();
    let dual = ParallelSolver::new(reference_config(1, 2))
        .solve(reference_factory())
        .unwrap();

    assert_eq!(
        single.outcome().result().cost(),
        dual.outcome().result().cost()
    );

    // Rank 0 explores the even root decisions, rank 1 the odd ones; the
    // merged depth-1 totals still cover all eight.
    let dual_depth_one: u64 = PruneReason::ALL
        .iter()
        .map(|&reason| dual.statistics().counts(reason)[1])
        .sum();
    assert_eq!(dual_depth_one, 8);
}

#[test]
fn test_three_period_run_is_consistent_across_worker_counts() {
    let single = ParallelSolver::new(reference_config(3, 1))
        .solve(reference_factory())
        .unwrap();
    assert!(single.outcome().is_optimal());
    let single_cost = single.outcome().result().cost().unwrap();

    for workers in [2, 4] {
        let multi = ParallelSolver::new(reference_config(3, workers))
            .solve(reference_factory())
            .unwrap();
        assert!(multi.outcome().is_optimal());
        let multi_cost = multi.outcome().result().cost().unwrap();
        assert!(
            (single_cost - multi_cost).abs() < 1e-9,
            "workers {}: {} vs {}",
            workers,
            single_cost,
            multi_cost
        );
    }
}

#[test]
fn test_incumbent_replays_to_its_recorded_cost() {
    let report = ParallelSolver::new(reference_config(2, 1))
        .solve(reference_factory())
        .unwrap();
    let schedule = report.outcome().result().schedule().unwrap().clone();
    assert!(schedule.is_consistent(&penstock_model::encoding::ActuationCoder::binary(3)));

    let mut engine = DemoEngine::from_network(DemoNetwork::reference());
    let network = resolve_network(&reference_config(2, 1), &engine).unwrap();
    let replayed = replay_schedule(&mut engine, &network, &schedule).unwrap();
    assert!((replayed - schedule.cost()).abs() < 1e-6);
}

#[test]
fn test_artifacts_roundtrip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let solution_path = dir.path().join("solution.json");
    let stats_path = dir.path().join("stats.json");

    let report = ParallelSolver::new(reference_config(1, 1))
        .solve(reference_factory())
        .unwrap();
    let schedule = report.outcome().result().schedule().unwrap();

    output::write_solution(schedule, &solution_path).unwrap();
    output::write_stats(report.statistics(), &stats_path).unwrap();

    let back: Schedule = output::read_solution(&solution_path).unwrap();
    assert_eq!(&back, schedule);

    let stats_json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&stats_path).unwrap()).unwrap();
    assert_eq!(stats_json["STABILITY"][1], 1);
}
