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

use crate::branching::DecisionBuilder;
use crate::cursor::SimulatorCursor;
use crate::eval::{ConstraintEvaluator, PruneReason};
use crate::frontier::DecisionStack;
use crate::incumbent::{IncumbentStore, NoSharedIncumbent, SharedIncumbentAdapter};
use crate::monitor::tree::TreeSearchMonitor;
use crate::path::DecisionPath;
use crate::result::WorkerOutcome;
use crate::stats::SearchStatistics;
use penstock_model::config::{CheckpointMode, SearchConfig};
use penstock_model::encoding::ActuationCoder;
use penstock_model::network::Network;
use penstock_model::schedule::Schedule;
use penstock_search::incumbent::SharedIncumbent;
use penstock_search::monitor::search_monitor::SearchCommand;
use penstock_search::result::TerminationReason;
use penstock_sim::engine::HydraulicEngine;
use penstock_sim::err::EngineResult;
use std::path::PathBuf;

/// Engine-level options of one worker run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Horizon length in periods.
    pub horizon: usize,
    /// State restoration strategy on backtrack.
    pub checkpoint_mode: CheckpointMode,
    /// Directory for `hour{N}.hyd` snapshots in `File` mode.
    pub scratch_dir: PathBuf,
    /// Optional per-pump transition budget.
    pub max_actuations: Option<u32>,
    /// How many consecutive simulator failures at one depth terminate the
    /// worker.
    pub max_sim_errors_per_depth: u32,
}

impl EngineOptions {
    /// Creates options with a horizon and defaults for everything else.
    pub fn new(horizon: usize) -> Self {
        Self {
            horizon,
            checkpoint_mode: CheckpointMode::Replay,
            scratch_dir: PathBuf::from("."),
            max_actuations: None,
            max_sim_errors_per_depth: 8,
        }
    }

    /// Derives engine options from a search configuration and a concrete
    /// scratch directory.
    pub fn from_config(config: &SearchConfig, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            horizon: config.horizon,
            checkpoint_mode: config.checkpoint_mode,
            scratch_dir: scratch_dir.into(),
            max_actuations: config.max_actuations,
            max_sim_errors_per_depth: 8,
        }
    }
}

/// A branch-and-bound solver for the pump scheduling problem: depth-first
/// enumeration of per-period actuation decisions, evaluated by driving a
/// hydraulic simulator one period per tree level.
///
/// This is the execution engine only: successor ordering comes from a
/// [`DecisionBuilder`], feasibility classification from the
/// [`ConstraintEvaluator`], and incumbent sharing from an
/// [`IncumbentStore`] backing.
#[derive(Debug, Clone)]
pub struct PumpScheduleSolver {
    stack: DecisionStack,
    path: DecisionPath,
}

impl PumpScheduleSolver {
    /// Creates a new solver for the given decision space.
    pub fn new(coder: ActuationCoder) -> Self {
        Self {
            stack: DecisionStack::new(),
            path: DecisionPath::new(coder),
        }
    }

    /// Creates a new solver with storage preallocated for a horizon.
    ///
    /// # Note
    ///
    /// The solver ensures sufficient capacity when a solve starts; this
    /// constructor only moves the allocation cost to construction time.
    pub fn preallocated(coder: ActuationCoder, horizon: usize) -> Self {
        let branching = coder.num_actuations() as usize;
        Self {
            stack: DecisionStack::preallocated(horizon, branching),
            path: DecisionPath::preallocated(coder, horizon),
        }
    }

    /// Returns the decision space coder.
    #[inline]
    pub fn coder(&self) -> &ActuationCoder {
        self.path.coder()
    }

    /// Runs the search in isolation (no bound sharing).
    #[inline]
    pub fn solve<E, B, M>(
        &mut self,
        engine: &mut E,
        network: &Network,
        options: &EngineOptions,
        builder: &mut B,
        monitor: M,
    ) -> EngineResult<WorkerOutcome>
    where
        E: HydraulicEngine,
        B: DecisionBuilder,
        M: TreeSearchMonitor,
    {
        self.solve_internal(engine, network, options, builder, monitor, NoSharedIncumbent)
    }

    /// Runs the search against a shared incumbent: local improvements are
    /// published and the peers' bound tightens local pruning.
    #[inline]
    pub fn solve_with_incumbent<E, B, M>(
        &mut self,
        engine: &mut E,
        network: &Network,
        options: &EngineOptions,
        builder: &mut B,
        monitor: M,
        incumbent: &SharedIncumbent,
    ) -> EngineResult<WorkerOutcome>
    where
        E: HydraulicEngine,
        B: DecisionBuilder,
        M: TreeSearchMonitor,
    {
        let backing = SharedIncumbentAdapter::new(incumbent);
        self.solve_internal(engine, network, options, builder, monitor, backing)
    }

    fn solve_internal<E, B, M, I>(
        &mut self,
        engine: &mut E,
        network: &Network,
        options: &EngineOptions,
        builder: &mut B,
        mut monitor: M,
        backing: I,
    ) -> EngineResult<WorkerOutcome>
    where
        E: HydraulicEngine,
        B: DecisionBuilder,
        M: TreeSearchMonitor,
        I: IncumbentStore,
    {
        assert_eq!(
            network.num_pumps(),
            self.path.coder().num_pumps(),
            "called `PumpScheduleSolver::solve` with a coder for {} pumps against a network with {}",
            self.path.coder().num_pumps(),
            network.num_pumps()
        );

        let result = {
            let cursor = SimulatorCursor::new(
                engine,
                network,
                options.horizon,
                options.checkpoint_mode,
                options.scratch_dir.clone(),
            )?;
            let session = SearchSession::new(
                &mut self.stack,
                &mut self.path,
                cursor,
                network,
                options,
                builder,
                &mut monitor,
                backing,
            );
            session.run()
        };

        self.reset();
        result
    }

    /// Resets the reusable search storage, keeping allocated capacity.
    #[inline]
    fn reset(&mut self) {
        self.stack.reset();
        self.path.reset();
    }
}

/// The result of a single search step.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SearchStep {
    /// The search should continue.
    Continue,
    /// The worker's partition is exhausted.
    Finished,
    /// The search must stop for the given cause.
    Aborted(String),
}

/// One search run: owns the cursor and all mutable search state for the
/// duration of the solve.
struct SearchSession<'a, E, B, M, I>
where
    E: HydraulicEngine,
{
    stack: &'a mut DecisionStack,
    path: &'a mut DecisionPath,
    cursor: SimulatorCursor<'a, E>,
    network: &'a Network,
    options: &'a EngineOptions,
    builder: &'a mut B,
    monitor: &'a mut M,
    backing: I,
    evaluator: ConstraintEvaluator,
    /// The pruning bound: the worker's best cost folded with the shared
    /// global bound. Monotone non-increasing.
    bound: f64,
    best_schedule: Option<Schedule>,
    stats: SearchStatistics,
    error_streak_depth: usize,
    error_streak: u32,
    start_time: std::time::Instant,
}

impl<'a, E, B, M, I> SearchSession<'a, E, B, M, I>
where
    E: HydraulicEngine,
    B: DecisionBuilder,
    M: TreeSearchMonitor,
    I: IncumbentStore,
{
    #[allow(clippy::too_many_arguments)]
    fn new(
        stack: &'a mut DecisionStack,
        path: &'a mut DecisionPath,
        cursor: SimulatorCursor<'a, E>,
        network: &'a Network,
        options: &'a EngineOptions,
        builder: &'a mut B,
        monitor: &'a mut M,
        backing: I,
    ) -> Self {
        let bound = backing.initial_upper_bound();
        let horizon = options.horizon;

        Self {
            stack,
            path,
            cursor,
            network,
            options,
            builder,
            monitor,
            backing,
            evaluator: ConstraintEvaluator::with_max_actuations(options.max_actuations),
            bound,
            best_schedule: None,
            stats: SearchStatistics::new(horizon),
            error_streak_depth: 0,
            error_streak: 0,
            start_time: std::time::Instant::now(),
        }
    }

    fn run(mut self) -> EngineResult<WorkerOutcome> {
        self.monitor.on_enter_search(self.network, &self.stats);

        // A zero-period horizon has exactly one (empty) schedule with zero
        // cost and nothing to simulate.
        if self.options.horizon == 0 {
            let empty = Schedule::empty();
            if empty.cost() < self.bound {
                self.install_schedule(empty);
            }
            let has_best = self.best_schedule.is_some();
            return Ok(self.finish(if has_best {
                TerminationReason::OptimalityProven
            } else {
                TerminationReason::InfeasibilityProven
            }));
        }

        self.initialize();

        let termination = loop {
            self.bound = self.backing.tighten(self.bound);
            self.monitor.on_step(self.path.depth(), &self.stats);

            if let SearchCommand::Terminate(cause) = self.monitor.search_command(&self.stats) {
                break TerminationReason::Aborted(cause);
            }

            match self.step() {
                Ok(SearchStep::Continue) => {}
                Ok(SearchStep::Aborted(cause)) => break TerminationReason::Aborted(cause),
                Ok(SearchStep::Finished) => {
                    break if self.best_schedule.is_some() {
                        TerminationReason::OptimalityProven
                    } else {
                        TerminationReason::InfeasibilityProven
                    };
                }
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    // The hydraulic state could not be restored; the
                    // incumbent so far is still valid.
                    break TerminationReason::Aborted(format!(
                        "state restoration failed: {}",
                        error
                    ));
                }
            }
        };

        Ok(self.finish(termination))
    }

    /// Sets up the root frame and enqueues the depth-zero successors.
    fn initialize(&mut self) {
        let branching = self.path.coder().num_actuations() as usize;
        self.stack.ensure_capacity(self.options.horizon, branching);

        self.stack.push_frame();
        let decisions = self.builder.decisions(self.path.coder(), 0, self.path);
        // The frontier pops LIFO; enqueue reversed so exploration follows
        // the builder's order.
        self.stack.extend(decisions.iter().rev().copied());
    }

    /// Performs a single search step.
    fn step(&mut self) -> EngineResult<SearchStep> {
        if self.stack.is_current_level_empty() {
            if self.stack.depth() <= 1 {
                return Ok(SearchStep::Finished);
            }
            self.backtrack()?;
            return Ok(SearchStep::Continue);
        }

        let actuation = self
            .stack
            .pop()
            .expect("current level verified non-empty above");
        self.try_decision(actuation)
    }

    /// Abandons the current depth and returns to its parent.
    fn backtrack(&mut self) -> EngineResult<()> {
        self.stack.pop_frame();
        self.path.pop();
        self.cursor.retreat()?;
        self.monitor.on_backtrack(self.path.depth(), &self.stats);
        Ok(())
    }

    /// Applies one period decision: write the pump patterns, advance the
    /// simulator, evaluate, then descend, record, or prune.
    fn try_decision(&mut self, actuation: u32) -> EngineResult<SearchStep> {
        let speeds = self.path.push(actuation);

        let step = match self.cursor.advance(self.network, &speeds) {
            Ok(step) => step,
            Err(error) => {
                self.path.pop();
                if error.is_fatal() {
                    return Err(error);
                }
                let depth = self.path.depth() + 1;
                tracing::debug!(%error, depth, "simulator failed, abandoning branch");
                self.stats.add_sim_error(depth);
                self.cursor.resync()?;
                return Ok(self.note_sim_error(depth));
            }
        };

        // 1-based hour of the period just simulated.
        let depth = self.path.depth();
        let at_horizon = depth == self.options.horizon;

        let evaluation = match self.evaluator.evaluate(
            &self.cursor,
            self.network,
            self.path,
            step.dt,
            self.bound,
            at_horizon,
        ) {
            Ok(evaluation) => evaluation,
            Err(error) => {
                if error.is_fatal() {
                    return Err(error);
                }
                tracing::debug!(%error, depth, "evaluation failed, abandoning branch");
                self.stats.add_sim_error(depth);
                self.path.pop();
                self.cursor.retreat()?;
                return Ok(self.note_sim_error(depth));
            }
        };

        self.error_streak = 0;
        self.stats.add(evaluation.reason, depth);

        if evaluation.is_feasible() {
            if at_horizon {
                let cost = evaluation
                    .cost
                    .expect("a feasible evaluation always carries the accumulated cost");
                self.record_leaf(cost);
                self.path.pop();
                self.cursor.retreat()?;
                return Ok(SearchStep::Continue);
            }
            self.descend(depth, actuation);
            return Ok(SearchStep::Continue);
        }

        self.monitor.on_prune(evaluation.reason, depth, &self.stats);
        self.path.pop();
        self.cursor.retreat()?;
        Ok(SearchStep::Continue)
    }

    /// Opens the next tree level under the decision just applied.
    fn descend(&mut self, depth: usize, actuation: u32) {
        self.stack.push_frame();
        let decisions = self.builder.decisions(self.path.coder(), depth, self.path);
        self.stack.extend(decisions.iter().rev().copied());
        self.monitor.on_descend(depth, actuation, &self.stats);
    }

    /// Records a complete feasible schedule as the new incumbent.
    fn record_leaf(&mut self, cost: f64) {
        // A cost bound that went negative means the simulator's energy
        // accounting regressed; continuing would corrupt the incumbent.
        assert!(
            cost >= 0.0,
            "incumbent invariant violated: schedule completed with negative cost {}",
            cost
        );

        // The evaluator's bound check already admitted this leaf, but the
        // bound may have tightened concurrently; re-check before
        // installing.
        if cost < self.bound {
            self.install_schedule(self.path.to_schedule(cost));
        }
    }

    fn install_schedule(&mut self, schedule: Schedule) {
        self.bound = schedule.cost();
        self.backing.on_schedule_found(&schedule);
        self.monitor.on_schedule_found(&schedule, &self.stats);
        self.best_schedule = Some(schedule);
    }

    /// Tracks consecutive simulator failures per depth; persistent failure
    /// at one depth aborts the worker.
    fn note_sim_error(&mut self, depth: usize) -> SearchStep {
        if self.error_streak_depth == depth {
            self.error_streak += 1;
        } else {
            self.error_streak_depth = depth;
            self.error_streak = 1;
        }

        if self.error_streak >= self.options.max_sim_errors_per_depth {
            return SearchStep::Aborted(format!(
                "repeated simulator errors at depth {}",
                depth
            ));
        }
        SearchStep::Continue
    }

    /// Seals the statistics and converts the session into its outcome.
    /// The hydraulics session closes when the cursor drops.
    fn finish(mut self, termination: TerminationReason) -> WorkerOutcome {
        self.stats.set_duration(self.start_time.elapsed());
        self.monitor.on_exit_search(&self.stats);

        match termination {
            TerminationReason::OptimalityProven => WorkerOutcome::exhausted_with(
                self.best_schedule
                    .expect("optimality requires an incumbent schedule"),
                self.stats,
            ),
            TerminationReason::InfeasibilityProven => WorkerOutcome::exhausted_empty(self.stats),
            TerminationReason::Aborted(cause) => {
                WorkerOutcome::aborted(self.best_schedule, cause, self.stats)
            }
        }
    }
}

/// Convenience wrapper: resolves nothing, shares nothing; used by tests
/// and single-worker runs that already hold a resolved network.
pub fn solve_isolated<E, B>(
    engine: &mut E,
    network: &Network,
    options: &EngineOptions,
    builder: &mut B,
) -> EngineResult<WorkerOutcome>
where
    E: HydraulicEngine,
    B: DecisionBuilder,
{
    let coder = ActuationCoder::binary(network.num_pumps());
    let mut solver = PumpScheduleSolver::preallocated(coder, options.horizon);
    solver.solve(
        engine,
        network,
        options,
        builder,
        crate::monitor::tree::NoOperationMonitor::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branching::{CanonicalBuilder, LeastEnergyBuilder};
    use crate::monitor::tree::NoOperationMonitor;
    use crate::monitor::wrapper::WrapperMonitor;
    use penstock_search::monitor::interrupt::InterruptMonitor;
    use penstock_sim::demo::{DemoEngine, DemoNetwork};
    use penstock_sim::resolve::resolve_network;
    use std::sync::atomic::AtomicBool;

    /// Single pump, single tank, single junction; head moves by
    /// `speed - 0.5` per period, pump costs 10 per running period.
    fn tiny_config(horizon: usize) -> SearchConfig {
        let mut config = SearchConfig::new("net.json", "net.rpt").with_horizon(horizon);
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

    fn tiny_setup(horizon: usize) -> (DemoEngine, Network, SearchConfig) {
        let engine = DemoEngine::from_network(DemoNetwork::tiny(horizon));
        let config = tiny_config(horizon);
        let network = resolve_network(&config, &engine).unwrap();
        (engine, network, config)
    }

    fn binary_solver(network: &Network) -> PumpScheduleSolver {
        PumpScheduleSolver::new(ActuationCoder::binary(network.num_pumps()))
    }

    #[test]
    fn test_two_period_single_pump_finds_optimum() {
        let (mut engine, network, _) = tiny_setup(2);
        let options = EngineOptions::new(2);
        let mut solver = binary_solver(&network);

        let outcome = solver
            .solve(
                &mut engine,
                &network,
                &options,
                &mut CanonicalBuilder,
                NoOperationMonitor::new(),
            )
            .unwrap();

        assert!(outcome.is_exhausted());
        let schedule = outcome.schedule().expect("a feasible schedule exists");
        assert!((schedule.cost() - 10.0).abs() < 1e-6);
        // Canonical order finds (off, on) before (on, off) and the later
        // equal-cost twin is pruned by the bound.
        assert_eq!(schedule.actuations(), &[0, 1]);
        assert!(schedule.is_consistent(solver.coder()));

        let stats = outcome.statistics();
        assert_eq!(stats.counts(PruneReason::None), &[0, 1, 1]);
        assert_eq!(stats.counts(PruneReason::Stability), &[0, 0, 1]);
        assert_eq!(stats.counts(PruneReason::Cost), &[0, 1, 0]);
        assert_eq!(stats.total_evaluations(), 4);
    }

    #[test]
    fn test_statistics_count_every_evaluation() {
        let (mut engine, network, _) = tiny_setup(3);
        let options = EngineOptions::new(3);
        let mut solver = binary_solver(&network);

        let outcome = solver
            .solve(
                &mut engine,
                &network,
                &options,
                &mut CanonicalBuilder,
                NoOperationMonitor::new(),
            )
            .unwrap();

        let stats = outcome.statistics();
        // Every evaluator verdict lands in exactly one bucket.
        let by_reason: u64 = PruneReason::ALL
            .iter()
            .map(|&reason| stats.counts(reason).iter().sum::<u64>())
            .sum();
        assert_eq!(by_reason, stats.total_evaluations());
        assert!(stats.total_evaluations() > 0);
        assert_eq!(stats.sim_errors().iter().sum::<u64>(), 0);
    }

    #[test]
    fn test_seeded_bound_forces_cost_prunes() {
        let (mut engine, network, _) = tiny_setup(2);
        let options = EngineOptions::new(2);
        let mut solver = binary_solver(&network);
        let incumbent = SharedIncumbent::with_bound(5.0);

        let outcome = solver
            .solve_with_incumbent(
                &mut engine,
                &network,
                &options,
                &mut CanonicalBuilder,
                NoOperationMonitor::new(),
                &incumbent,
            )
            .unwrap();

        // Every feasible completion costs at least 10, so nothing beats
        // the seeded bound.
        assert!(outcome.schedule().is_none());
        let stats = outcome.statistics();
        assert_eq!(stats.counts(PruneReason::Cost)[1], 1);
        assert_eq!(stats.counts(PruneReason::Cost)[2], 1);
    }

    #[test]
    fn test_mid_period_event_prunes_timestep() {
        let horizon = 2;
        let mut demo = DemoNetwork::tiny(horizon);
        // An event halfway through period 1 (1-based hour 2).
        demo.mid_period_events = vec![3600 + 1800];
        let mut engine = DemoEngine::from_network(demo);
        let config = tiny_config(horizon);
        let network = resolve_network(&config, &engine).unwrap();
        let options = EngineOptions::new(horizon);
        let mut solver = binary_solver(&network);

        let outcome = solver
            .solve(
                &mut engine,
                &network,
                &options,
                &mut CanonicalBuilder,
                NoOperationMonitor::new(),
            )
            .unwrap();

        // Both subtrees reach hour 2 and die there, for each of the two
        // sibling decisions.
        let stats = outcome.statistics();
        assert!(stats.counts(PruneReason::Timestep)[2] >= 1);
        assert_eq!(stats.counts(PruneReason::Timestep).iter().sum::<u64>(), 4);
        assert!(outcome.schedule().is_none());
    }

    #[test]
    fn test_actuation_budget_prunes_switchy_schedules() {
        let (mut engine, network, _) = tiny_setup(3);
        let mut options = EngineOptions::new(3);
        options.max_actuations = Some(0);
        let mut solver = binary_solver(&network);

        let outcome = solver
            .solve(
                &mut engine,
                &network,
                &options,
                &mut CanonicalBuilder,
                NoOperationMonitor::new(),
            )
            .unwrap();

        // With zero allowed transitions only constant schedules survive;
        // all-off fails stability, so always-on wins.
        let schedule = outcome.schedule().expect("always-on is feasible");
        assert!((schedule.cost() - 30.0).abs() < 1e-6);
        assert_eq!(schedule.actuations(), &[1, 1, 1]);
        assert!(
            outcome
                .statistics()
                .counts(PruneReason::Actuations)
                .iter()
                .sum::<u64>()
                > 0
        );
    }

    #[test]
    fn test_zero_horizon_returns_empty_schedule() {
        let (mut engine, network, _) = tiny_setup(1);
        let options = EngineOptions::new(0);
        let mut solver = binary_solver(&network);

        let outcome = solver
            .solve(
                &mut engine,
                &network,
                &options,
                &mut CanonicalBuilder,
                NoOperationMonitor::new(),
            )
            .unwrap();

        assert!(outcome.is_exhausted());
        let schedule = outcome.schedule().unwrap();
        assert_eq!(schedule.cost(), 0.0);
        assert!(schedule.speeds().is_empty());
        assert!(schedule.actuations().is_empty());
    }

    #[test]
    fn test_singleton_speed_domain_evaluates_one_schedule() {
        let (mut engine, network, _) = tiny_setup(2);
        let options = EngineOptions::new(2);
        let mut solver = PumpScheduleSolver::new(ActuationCoder::new(1, vec![0]));

        let outcome = solver
            .solve(
                &mut engine,
                &network,
                &options,
                &mut CanonicalBuilder,
                NoOperationMonitor::new(),
            )
            .unwrap();

        // The all-off schedule drains the tank below its initial head.
        assert!(outcome.schedule().is_none());
        assert!(outcome.is_exhausted());
        // One branch: hour 1 feasible, hour 2 stability.
        assert_eq!(outcome.statistics().total_evaluations(), 2);
        assert_eq!(outcome.statistics().counts(PruneReason::Stability)[2], 1);
    }

    #[test]
    fn test_checkpoint_file_mode_matches_replay() {
        let scratch = tempfile::tempdir().unwrap();
        let mut results = Vec::new();

        for mode in [CheckpointMode::Replay, CheckpointMode::File] {
            let (mut engine, network, _) = tiny_setup(3);
            let mut options = EngineOptions::new(3);
            options.checkpoint_mode = mode;
            options.scratch_dir = scratch.path().to_path_buf();
            let mut solver = binary_solver(&network);

            let outcome = solver
                .solve(
                    &mut engine,
                    &network,
                    &options,
                    &mut CanonicalBuilder,
                    NoOperationMonitor::new(),
                )
                .unwrap();
            results.push(outcome);
        }

        let replay = &results[0];
        let file = &results[1];
        assert_eq!(
            replay.schedule().map(|s| s.actuations().to_vec()),
            file.schedule().map(|s| s.actuations().to_vec())
        );
        assert!(
            (replay.schedule().unwrap().cost() - file.schedule().unwrap().cost()).abs() < 1e-9
        );
        for reason in PruneReason::ALL {
            assert_eq!(
                replay.statistics().counts(reason),
                file.statistics().counts(reason),
                "mismatch for {}",
                reason
            );
        }
    }

    #[test]
    fn test_heuristic_builder_finds_same_optimum() {
        let (mut engine, network, _) = tiny_setup(3);
        let options = EngineOptions::new(3);
        let mut solver = binary_solver(&network);
        let canonical = solver
            .solve(
                &mut engine,
                &network,
                &options,
                &mut CanonicalBuilder,
                NoOperationMonitor::new(),
            )
            .unwrap();

        let (mut engine, network, _) = tiny_setup(3);
        let mut solver = binary_solver(&network);
        let heuristic = solver
            .solve(
                &mut engine,
                &network,
                &options,
                &mut LeastEnergyBuilder,
                NoOperationMonitor::new(),
            )
            .unwrap();

        assert_eq!(
            canonical.schedule().map(|s| s.cost()),
            heuristic.schedule().map(|s| s.cost())
        );
    }

    #[test]
    fn test_interrupt_aborts_with_incumbent_kept() {
        let (mut engine, network, _) = tiny_setup(2);
        let options = EngineOptions::new(2);
        let mut solver = binary_solver(&network);

        let flag = AtomicBool::new(true);
        let mut inner = InterruptMonitor::new(&flag);
        let monitor = WrapperMonitor::new(&mut inner);

        let outcome = solver
            .solve(&mut engine, &network, &options, &mut CanonicalBuilder, monitor)
            .unwrap();

        assert!(!outcome.is_exhausted());
        match outcome.termination() {
            TerminationReason::Aborted(cause) => assert!(cause.contains("interrupt")),
            other => panic!("expected Aborted, got {:?}", other),
        }
    }

    #[test]
    fn test_hydraulics_released_after_solve() {
        let (mut engine, network, _) = tiny_setup(2);
        let options = EngineOptions::new(2);
        let mut solver = binary_solver(&network);
        solver
            .solve(
                &mut engine,
                &network,
                &options,
                &mut CanonicalBuilder,
                NoOperationMonitor::new(),
            )
            .unwrap();
        assert!(!engine.hydraulics_open());
    }

    #[test]
    fn test_solve_isolated_convenience() {
        let (mut engine, network, _) = tiny_setup(2);
        let options = EngineOptions::new(2);
        let outcome =
            solve_isolated(&mut engine, &network, &options, &mut CanonicalBuilder).unwrap();
        assert!(outcome.is_exhausted());
        assert!((outcome.schedule().unwrap().cost() - 10.0).abs() < 1e-6);
    }
}
