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

use crate::partition::{PartitionedBuilder, RankPartition};
use penstock_bnb::bnb::{EngineOptions, PumpScheduleSolver};
use penstock_bnb::branching::CanonicalBuilder;
use penstock_bnb::monitor::composite::CompositeTreeMonitor;
use penstock_bnb::monitor::trace::TraceMonitor;
use penstock_bnb::monitor::wrapper::WrapperMonitor;
use penstock_bnb::result::WorkerOutcome;
use penstock_bnb::stats::SearchStatistics;
use penstock_model::config::{CheckpointMode, SearchConfig};
use penstock_model::encoding::ActuationCoder;
use penstock_model::schedule::Schedule;
use penstock_search::incumbent::SharedIncumbent;
use penstock_search::monitor::composite::CompositeMonitor;
use penstock_search::monitor::interrupt::InterruptMonitor;
use penstock_search::monitor::time_limit::TimeLimitMonitor;
use penstock_search::result::{SolveOutcome, TerminationReason};
use penstock_search::stats::RunStatisticsBuilder;
use penstock_sim::engine::HydraulicEngine;
use penstock_sim::err::{EngineError, EngineResult};
use penstock_sim::resolve::resolve_network;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// The result of a parallel run: the aggregated outcome plus the merged
/// per-depth search statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    outcome: SolveOutcome,
    statistics: SearchStatistics,
}

impl SolveReport {
    /// Returns the aggregated outcome.
    #[inline]
    pub fn outcome(&self) -> &SolveOutcome {
        &self.outcome
    }

    /// Returns the merged per-depth statistics.
    #[inline]
    pub fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    /// Splits the report into its parts.
    #[inline]
    pub fn into_parts(self) -> (SolveOutcome, SearchStatistics) {
        (self.outcome, self.statistics)
    }
}

/// The parallel coordinator: one worker per rank, each owning a private
/// hydraulic engine built by the factory, all sharing one incumbent bound.
///
/// The top tree levels are partitioned round-robin across ranks
/// (recursing while the rank count exceeds the cumulative branching
/// factor); subtrees below are explored entirely locally. A worker may
/// transiently prune against a stale shared bound, which is conservative.
/// The run ends when every worker has exhausted its partition; the final
/// aggregation over worker results and the shared incumbent is the
/// closing reduction.
#[derive(Debug, Clone)]
pub struct ParallelSolver {
    config: SearchConfig,
}

impl ParallelSolver {
    /// Creates a solver for the given configuration.
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[inline]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Runs the parallel search. The factory is invoked once per rank on
    /// that rank's thread and must yield a freshly loaded engine; engines
    /// are never shared between ranks.
    ///
    /// Returns the aggregated report, or the first fatal engine error.
    pub fn solve<E, F>(&self, factory: F) -> EngineResult<SolveReport>
    where
        E: HydraulicEngine,
        F: Fn(usize) -> EngineResult<E> + Sync,
    {
        let num_workers = self.config.num_workers.max(1);
        let start = std::time::Instant::now();

        let incumbent = SharedIncumbent::new();
        let stop = AtomicBool::new(false);
        let scratch_base = self.scratch_base();

        let mut results: Vec<EngineResult<WorkerOutcome>> = Vec::with_capacity(num_workers);
        std::thread::scope(|scope| {
            let mut handles = Vec::with_capacity(num_workers);
            for rank in 0..num_workers {
                let config = &self.config;
                let factory = &factory;
                let incumbent = &incumbent;
                let stop = &stop;
                let scratch_base = &scratch_base;

                handles.push(scope.spawn(move || {
                    let result = run_worker(
                        rank,
                        num_workers,
                        config,
                        factory,
                        incumbent,
                        stop,
                        scratch_base,
                    );
                    if let Err(error) = &result {
                        if error.is_fatal() {
                            tracing::error!(rank, %error, "worker failed fatally");
                            // Peers stop at their next command poll instead
                            // of exhausting a doomed run.
                            stop.store(true, Ordering::Relaxed);
                        }
                    }
                    result
                }));
            }
            for handle in handles {
                results.push(handle.join().expect("worker thread panicked"));
            }
        });

        self.aggregate(results, &incumbent, num_workers, start.elapsed())
    }

    fn scratch_base(&self) -> PathBuf {
        self.config.scratch_dir.clone().unwrap_or_else(|| {
            std::env::temp_dir().join(format!("penstock-{}", std::process::id()))
        })
    }

    /// Folds the worker results and the shared incumbent into the final
    /// outcome: the closing reduction of the run.
    fn aggregate(
        &self,
        results: Vec<EngineResult<WorkerOutcome>>,
        incumbent: &SharedIncumbent,
        num_workers: usize,
        elapsed: Duration,
    ) -> EngineResult<SolveReport> {
        let mut first_fatal: Option<EngineError> = None;
        let mut outcomes: Vec<WorkerOutcome> = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(error) => {
                    if first_fatal.is_none() {
                        first_fatal = Some(error);
                    }
                }
            }
        }
        if let Some(error) = first_fatal {
            return Err(error);
        }

        let mut statistics = SearchStatistics::new(self.config.horizon);
        for outcome in &outcomes {
            statistics.merge(outcome.statistics());
        }
        statistics.set_duration(elapsed);

        let snapshot = incumbent.snapshot();
        let best: Option<Schedule> = outcomes
            .iter()
            .filter_map(|outcome| outcome.schedule())
            .chain(snapshot.as_ref())
            .min_by(|a, b| {
                a.cost()
                    .partial_cmp(&b.cost())
                    .expect("schedule costs are never NaN")
            })
            .cloned();

        let run_statistics = RunStatisticsBuilder::new()
            .schedules_found(incumbent.installs())
            .used_workers(num_workers)
            .solve_duration(elapsed)
            .build();

        let all_exhausted = outcomes.iter().all(|outcome| outcome.is_exhausted());
        let outcome = if all_exhausted {
            match best {
                Some(schedule) => SolveOutcome::optimal(schedule, run_statistics),
                None => SolveOutcome::infeasible(run_statistics),
            }
        } else {
            let cause = outcomes
                .iter()
                .find_map(|outcome| match outcome.termination() {
                    TerminationReason::Aborted(cause) => Some(cause.clone()),
                    _ => None,
                })
                .unwrap_or_else(|| "search aborted".to_string());
            match best {
                Some(schedule) => SolveOutcome::feasible(schedule, cause, run_statistics),
                None => SolveOutcome::unknown(cause, run_statistics),
            }
        };

        Ok(SolveReport {
            outcome,
            statistics,
        })
    }
}

/// One rank's run: build the engine, resolve the network, wire monitors
/// and partition, and search to exhaustion.
fn run_worker<E, F>(
    rank: usize,
    num_ranks: usize,
    config: &SearchConfig,
    factory: &F,
    incumbent: &SharedIncumbent,
    stop: &AtomicBool,
    scratch_base: &PathBuf,
) -> EngineResult<WorkerOutcome>
where
    E: HydraulicEngine,
    F: Fn(usize) -> EngineResult<E> + Sync,
{
    let mut engine = factory(rank)?;
    let network = resolve_network(config, &engine)?;
    let coder = ActuationCoder::new(network.num_pumps(), config.speed_domain.clone());
    let branching = coder.num_actuations();

    let scratch_dir = scratch_base.join(format!("rank{}", rank));
    if config.checkpoint_mode == CheckpointMode::File {
        std::fs::create_dir_all(&scratch_dir).map_err(|error| {
            EngineError::new(
                103,
                "solve",
                format!(
                    "cannot create scratch directory {}: {}",
                    scratch_dir.display(),
                    error
                ),
            )
        })?;
    }
    let options = EngineOptions::from_config(config, scratch_dir);

    let partition = RankPartition::new(rank, num_ranks, branching);
    tracing::debug!(rank, %partition, "worker starting");
    let mut builder = PartitionedBuilder::new(CanonicalBuilder, partition);

    let mut limits = CompositeMonitor::new();
    limits.add_monitor(InterruptMonitor::new(stop));
    if let Some(secs) = config.time_limit_secs {
        limits.add_monitor(TimeLimitMonitor::new(Duration::from_secs(secs)));
    }

    let mut monitor = CompositeTreeMonitor::new();
    monitor.add_monitor(TraceMonitor::new(rank, Duration::from_secs(5), 0x3FFF));
    monitor.add_monitor(WrapperMonitor::new(&mut limits));

    let mut solver = PumpScheduleSolver::preallocated(coder, options.horizon);
    let result =
        solver.solve_with_incumbent(&mut engine, &network, &options, &mut builder, monitor, incumbent);

    // The project is owned by this worker alone; release it regardless of
    // how the search ended.
    if let Err(error) = engine.close() {
        tracing::warn!(rank, %error, "closing the engine failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use penstock_sim::demo::{DemoEngine, DemoNetwork};
    use penstock_sim::replay::replay_schedule;

    /// Single pump / tank / junction configuration matching
    /// `DemoNetwork::tiny`.
    fn tiny_config(horizon: usize, workers: usize) -> SearchConfig {
        let mut config = SearchConfig::new("net.json", "net.rpt")
            .with_horizon(horizon)
            .with_workers(workers);
        config.pump_ids = vec!["P1".to_string()];
        config.tank_ids = vec!["T1".to_string()];
        config.node_ids = vec!["J1".to_string()];
        config.pressure_thresholds.clear();
        config.pressure_thresholds.insert("J1".to_string(), 35.0);
        config.level_min = 40.0;
        config.level_max = 60.0;
        config.initial_level = 50.0;
        config
    }

    fn tiny_factory(horizon: usize) -> impl Fn(usize) -> EngineResult<DemoEngine> + Sync {
        move |_rank| Ok(DemoEngine::from_network(DemoNetwork::tiny(horizon)))
    }

    #[test]
    fn test_single_worker_finds_optimum() {
        let solver = ParallelSolver::new(tiny_config(2, 1));
        let report = solver.solve(tiny_factory(2)).unwrap();

        assert!(report.outcome().is_optimal());
        assert!((report.outcome().result().cost().unwrap() - 10.0).abs() < 1e-6);
        assert_eq!(report.statistics().horizon(), 2);
        assert!(report.statistics().total_evaluations() > 0);
    }

    #[test]
    fn test_multi_worker_matches_single_worker_cost() {
        let single = ParallelSolver::new(tiny_config(3, 1))
            .solve(tiny_factory(3))
            .unwrap();

        for workers in [2, 3] {
            let multi = ParallelSolver::new(tiny_config(3, workers))
                .solve(tiny_factory(3))
                .unwrap();
            assert!(multi.outcome().is_optimal());
            assert_eq!(
                single.outcome().result().cost(),
                multi.outcome().result().cost(),
                "worker count {}",
                workers
            );
        }
    }

    #[test]
    fn test_workers_cover_disjoint_partitions() {
        // With two ranks and binary branching the per-worker evaluation
        // totals must sum to the single-worker total or less (bound
        // sharing can only remove work, never duplicate it). The NONE
        // bucket at depth 1 is partition-exact: each root decision is
        // evaluated by exactly one rank.
        let single = ParallelSolver::new(tiny_config(2, 1))
            .solve(tiny_factory(2))
            .unwrap();
        let dual = ParallelSolver::new(tiny_config(2, 2))
            .solve(tiny_factory(2))
            .unwrap();

        let single_root: u64 = penstock_bnb::eval::PruneReason::ALL
            .iter()
            .map(|&r| single.statistics().counts(r)[1])
            .sum();
        let dual_root: u64 = penstock_bnb::eval::PruneReason::ALL
            .iter()
            .map(|&r| dual.statistics().counts(r)[1])
            .sum();
        assert_eq!(single_root, dual_root);
    }

    #[test]
    fn test_best_schedule_replays_to_its_cost() {
        let solver = ParallelSolver::new(tiny_config(3, 2));
        let report = solver.solve(tiny_factory(3)).unwrap();
        let schedule = report.outcome().result().schedule().unwrap().clone();

        let mut engine = DemoEngine::from_network(DemoNetwork::tiny(3));
        let network = resolve_network(&tiny_config(3, 1), &engine).unwrap();
        let replayed = replay_schedule(&mut engine, &network, &schedule).unwrap();
        assert!((replayed - schedule.cost()).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible_network_is_proven_infeasible() {
        // The pump cannot keep up with demand: every branch dies on
        // levels or stability.
        let mut demo = DemoNetwork::tiny(2);
        demo.demand = vec![500.0];
        let factory =
            move |_rank: usize| -> EngineResult<DemoEngine> {
                Ok(DemoEngine::from_network(demo.clone()))
            };

        let solver = ParallelSolver::new(tiny_config(2, 2));
        let report = solver.solve(factory).unwrap();
        assert!(report.outcome().is_infeasible());
        assert!(report.statistics().total_prunes() > 0);
    }

    #[test]
    fn test_fatal_factory_error_propagates() {
        let factory = |_rank: usize| -> EngineResult<DemoEngine> {
            Err(EngineError::new(101, "load", "project file is not valid"))
        };
        let solver = ParallelSolver::new(tiny_config(2, 2));
        let error = solver.solve(factory).unwrap_err();
        assert_eq!(error.code(), 101);
        assert!(error.is_fatal());
    }

    #[test]
    fn test_file_checkpoint_mode_end_to_end() {
        let scratch = tempfile::tempdir().unwrap();
        let mut config = tiny_config(3, 2).with_scratch_dir(scratch.path());
        config.checkpoint_mode = CheckpointMode::File;

        let report = ParallelSolver::new(config).solve(tiny_factory(3)).unwrap();
        assert!(report.outcome().is_optimal());

        let replay = ParallelSolver::new(tiny_config(3, 2))
            .solve(tiny_factory(3))
            .unwrap();
        assert_eq!(
            report.outcome().result().cost(),
            replay.outcome().result().cost()
        );
    }

    #[test]
    fn test_reruns_produce_identical_artifacts() {
        // A single worker is fully deterministic: schedule and every
        // counter must match between runs. Across multiple workers only
        // the best cost is deterministic; the timing of bound propagation
        // may shift which equal-cost twin survives and where prunes land.
        let first = ParallelSolver::new(tiny_config(3, 1))
            .solve(tiny_factory(3))
            .unwrap();
        let second = ParallelSolver::new(tiny_config(3, 1))
            .solve(tiny_factory(3))
            .unwrap();

        assert_eq!(
            first.outcome().result().schedule(),
            second.outcome().result().schedule()
        );
        for reason in penstock_bnb::eval::PruneReason::ALL {
            assert_eq!(
                first.statistics().counts(reason),
                second.statistics().counts(reason)
            );
        }

        let dual_a = ParallelSolver::new(tiny_config(3, 2))
            .solve(tiny_factory(3))
            .unwrap();
        let dual_b = ParallelSolver::new(tiny_config(3, 2))
            .solve(tiny_factory(3))
            .unwrap();
        assert_eq!(
            dual_a.outcome().result().cost(),
            dual_b.outcome().result().cost()
        );
    }
}
