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

use clap::Parser;
use penstock_model::config::{CheckpointMode, SearchConfig};
use penstock_search::result::SearchResult;
use penstock_sim::demo::DemoEngine;
use penstock_sim::engine::HydraulicEngine;
use penstock_sim::err::EngineResult;
use penstock_solver::output;
use penstock_solver::solver::ParallelSolver;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Minimum-cost pump scheduling for water distribution networks via
/// parallel branch-and-bound over a hydraulic simulation.
#[derive(Debug, Parser)]
#[command(name = "penstock", version, about)]
struct Cli {
    /// Path to the network input file.
    inp_file: PathBuf,
    /// Path to the report file.
    rpt_file: PathBuf,
    /// Optional binary output file.
    out_file: Option<PathBuf>,

    /// Horizon length in periods.
    #[arg(long)]
    horizon: Option<usize>,

    /// Scheduled pump ids (comma separated).
    #[arg(long, value_delimiter = ',')]
    pumps: Option<Vec<String>>,

    /// Level-checked tank ids (comma separated).
    #[arg(long, value_delimiter = ',')]
    tanks: Option<Vec<String>>,

    /// Pressure-monitored node ids (comma separated).
    #[arg(long, value_delimiter = ',')]
    nodes: Option<Vec<String>>,

    /// Discrete per-pump speed factors (comma separated).
    #[arg(long, value_delimiter = ',')]
    speed_domain: Option<Vec<u8>>,

    /// Lower bound of the admissible tank head band.
    #[arg(long)]
    level_min: Option<f64>,

    /// Upper bound of the admissible tank head band.
    #[arg(long)]
    level_max: Option<f64>,

    /// Tank head at the start of the horizon.
    #[arg(long)]
    initial_level: Option<f64>,

    /// Per-pump ceiling on speed transitions across the horizon.
    #[arg(long)]
    max_actuations: Option<u32>,

    /// Backtracking strategy: replay | file.
    #[arg(long)]
    checkpoint_mode: Option<CheckpointMode>,

    /// Number of parallel rank workers.
    #[arg(long)]
    workers: Option<usize>,

    /// Wall-clock budget in seconds.
    #[arg(long)]
    time_limit: Option<u64>,

    /// Scratch directory for checkpoint files.
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// JSON file with configuration overrides, applied before the
    /// command-line flags.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the best schedule.
    #[arg(long, default_value = "solution.json")]
    solution_out: PathBuf,

    /// Where to write the merged statistics.
    #[arg(long, default_value = "stats.json")]
    stats_out: PathBuf,
}

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Builds the effective configuration: JSON overlay first, command-line
/// flags on top.
fn build_config(cli: &Cli) -> Result<SearchConfig, String> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|error| format!("cannot read config file {}: {}", path.display(), error))?;
            serde_json::from_str(&raw)
                .map_err(|error| format!("invalid config file {}: {}", path.display(), error))?
        }
        None => SearchConfig::default(),
    };

    config.inp_file = cli.inp_file.clone();
    config.rpt_file = cli.rpt_file.clone();
    config.out_file = cli.out_file.clone();

    if let Some(horizon) = cli.horizon {
        config.horizon = horizon;
    }
    if let Some(pumps) = &cli.pumps {
        config.pump_ids = pumps.clone();
    }
    if let Some(tanks) = &cli.tanks {
        config.tank_ids = tanks.clone();
    }
    if let Some(nodes) = &cli.nodes {
        config.node_ids = nodes.clone();
    }
    if let Some(domain) = &cli.speed_domain {
        config.speed_domain = domain.clone();
    }
    if let Some(level_min) = cli.level_min {
        config.level_min = level_min;
    }
    if let Some(level_max) = cli.level_max {
        config.level_max = level_max;
    }
    if let Some(initial_level) = cli.initial_level {
        config.initial_level = initial_level;
    }
    if let Some(max_actuations) = cli.max_actuations {
        config.max_actuations = Some(max_actuations);
    }
    if let Some(mode) = cli.checkpoint_mode {
        config.checkpoint_mode = mode;
    }
    if let Some(workers) = cli.workers {
        config.num_workers = workers;
    }
    if let Some(time_limit) = cli.time_limit {
        config.time_limit_secs = Some(time_limit);
    }
    if let Some(scratch_dir) = &cli.scratch_dir {
        config.scratch_dir = Some(scratch_dir.clone());
    }

    Ok(config)
}

fn run(cli: Cli) -> ExitCode {
    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("penstock: {}", message);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(%config, "starting search");

    let solver = ParallelSolver::new(config.clone());
    let factory = |rank: usize| -> EngineResult<DemoEngine> {
        let mut engine = DemoEngine::new();
        engine.load(
            &config.inp_file,
            &config.rpt_file,
            config.out_file.as_deref(),
        )?;
        tracing::debug!(rank, "engine loaded");
        Ok(engine)
    };

    let report = match solver.solve(factory) {
        Ok(report) => report,
        Err(error) => {
            eprintln!("penstock: {}", error);
            let code = error.code().clamp(1, 255) as u8;
            return ExitCode::from(code);
        }
    };

    let mut exit = ExitCode::SUCCESS;
    match report.outcome().result() {
        SearchResult::Optimal(schedule) | SearchResult::Feasible(schedule) => {
            println!(
                "best cost {:.2} ({}); schedule in {}, statistics in {}",
                schedule.cost(),
                report.outcome().reason(),
                cli.solution_out.display(),
                cli.stats_out.display()
            );
            if let Err(error) = output::write_solution(schedule, &cli.solution_out) {
                tracing::error!(%error, "failed to write solution");
                exit = ExitCode::FAILURE;
            }
        }
        SearchResult::Infeasible => {
            println!(
                "no feasible schedule exists; statistics in {}",
                cli.stats_out.display()
            );
        }
        SearchResult::Unknown => {
            println!(
                "search stopped without a schedule ({}); statistics in {}",
                report.outcome().reason(),
                cli.stats_out.display()
            );
        }
    }

    if let Err(error) = output::write_stats(report.statistics(), &cli.stats_out) {
        tracing::error!(%error, "failed to write statistics");
        exit = ExitCode::FAILURE;
    }

    exit
}

fn main() -> ExitCode {
    enable_tracing();
    let cli = Cli::parse();
    run(cli)
}
