//! `pitstop` - plans race-strategy problems with time-bounded tree search.
//!
//! ```bash
//! pitstop run problems/sprint.json out/sprint.json
//! pitstop run problems/sprint.json out/batch.json --trials 20 --time-ms 500
//! pitstop actions problems/sprint.json
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use pitstop_autoplay::{
    run_episode, run_trials, write_json, write_text, ActionSpace, AutoplayConfig, EpisodeStatus,
};
use pitstop_core::{ProblemSpec, WorldModel};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "pitstop")]
#[command(version, about = "Time-bounded MCTS planner for pit-stop racing problems", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log filter used when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a problem and write the trace
    Run(RunArgs),

    /// List the discretised actions the planner chooses from
    Actions(ActionsArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Problem description (JSON)
    problem: PathBuf,

    /// Trace output path; a text report is written next to it with a .txt
    /// extension (.report.txt when the trace itself ends in .txt)
    output: PathBuf,

    /// Planner and timing settings (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Wall time per decision in milliseconds
    #[arg(long)]
    time_ms: Option<u64>,

    /// Number of episodes to play
    #[arg(long)]
    trials: Option<u32>,

    /// Planner seed
    #[arg(long)]
    seed: Option<u64>,

    /// Stop each search after this many iterations even if time remains
    #[arg(long)]
    iterations: Option<u32>,
}

#[derive(Args, Debug)]
struct ActionsArgs {
    /// Problem description (JSON)
    problem: PathBuf,

    /// Planner settings (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the action table as JSON instead of one stable key per line
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .format_timestamp_millis()
        .init();

    match cli.command {
        Command::Run(args) => run(args),
        Command::Actions(args) => list_actions(args),
    }
}

fn load_problem(path: &Path) -> Result<ProblemSpec> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading problem {}", path.display()))?;
    ProblemSpec::from_json(&text).with_context(|| format!("loading problem {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<AutoplayConfig> {
    let Some(path) = path else {
        return Ok(AutoplayConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    AutoplayConfig::from_json(&text).with_context(|| format!("loading config {}", path.display()))
}

fn report_path(output: &Path) -> PathBuf {
    // never write the report over the trace itself
    if output.extension().is_some_and(|ext| ext == "txt") {
        output.with_extension("report.txt")
    } else {
        output.with_extension("txt")
    }
}

fn run(args: RunArgs) -> Result<()> {
    let problem = load_problem(&args.problem)?;
    let mut config = load_config(args.config.as_deref())?;
    if let Some(time_ms) = args.time_ms {
        config.step_time_ms = time_ms;
    }
    if let Some(trials) = args.trials {
        config.trials = trials;
    }
    if let Some(seed) = args.seed {
        config.planner.seed = seed;
    }
    if args.iterations.is_some() {
        config.planner.max_iterations = args.iterations;
    }
    if config.search_budget().is_zero() {
        warn!(
            "step time {}ms leaves no search budget after the {}ms buffer; one iteration per decision",
            config.step_time_ms, config.step_time_buffer_ms
        );
    }
    info!(
        "problem {}: level {}, {} cells, {} steps, {} ms per decision",
        args.problem.display(),
        problem.level,
        problem.goal_distance(),
        problem.max_steps,
        config.step_time_ms
    );

    let report = report_path(&args.output);
    if config.trials <= 1 {
        let result = run_episode(&problem, &config, config.planner.seed)?;
        println!(
            "{}",
            match result.status {
                EpisodeStatus::Won => "Simulation successful.",
                EpisodeStatus::Lost => "Simulation failed.",
            }
        );
        write_json(&args.output, &result)?;
        write_text(&report, &result.to_text_report())?;
    } else {
        let summary = run_trials(&problem, &config, |result, running| {
            println!(
                "trial {} (seed {}): {:?} after {} steps",
                running.trials, result.seed, result.status, result.summary.steps_used
            );
            println!("{}", running.to_text_report());
        })?;
        write_json(&args.output, &summary)?;
        write_text(&report, &summary.to_text_report())?;
    }
    info!("wrote {} and {}", args.output.display(), report.display());
    Ok(())
}

fn list_actions(args: ActionsArgs) -> Result<()> {
    let problem = load_problem(&args.problem)?;
    let config = load_config(args.config.as_deref())?;
    let space = ActionSpace::new(&problem, &config.planner)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(space.all_actions())?);
        return Ok(());
    }
    let kinds: Vec<&str> = space.kinds().map(|kind| kind.keyword()).collect();
    println!("{} actions over kinds: {}", space.len(), kinds.join(", "));
    for (id, action) in space.all_actions().iter().enumerate() {
        println!("{id:>4}  {}", action.stable_key());
    }
    Ok(())
}
