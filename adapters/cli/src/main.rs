#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Hexwalk levels headlessly and reports run history.

mod level;
mod script;
mod session;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hexwalk_storage::{Clock, Run, RunStore, SystemClock, DEFAULT_LOG_FILE};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{level::Level, script::Action, session::Session};

#[derive(Parser, Debug)]
#[command(name = "hexwalk", version, about = "Walk a hex grid and keep a log of every run")]
struct Cli {
    /// Run log to read from and append to.
    #[arg(long, global = true, default_value = DEFAULT_LOG_FILE)]
    runs: PathBuf,

    /// Log debug output, including every movement state change.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Play a level by executing scripted actions in order.
    Play {
        /// TOML level file.
        level: PathBuf,
        /// Action such as move:1,0, decoy:0,1, click:1.5,0.8, wait:500 or giveup.
        #[arg(long = "action", short = 'a')]
        actions: Vec<Action>,
    },
    /// Print the fewest steps of any finished run.
    Best,
    /// List the most recent runs, newest first.
    History {
        /// Number of runs to list.
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
    /// Delete every recorded run.
    Clear,
}

/// Entry point for the Hexwalk command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut store = RunStore::open(&cli.runs);
    match cli.command {
        CliCommand::Play { level, actions } => play(&mut store, &level, &actions)?,
        CliCommand::Best => match store.best_finished_steps() {
            Some(steps) => println!("best finished run: {steps} steps"),
            None => println!("no finished runs yet"),
        },
        CliCommand::History { count } => {
            let runs = store.load_recent_runs(count);
            if runs.is_empty() {
                println!("no runs recorded in {}", cli.runs.display());
            }
            for run in runs {
                println!("{}", describe(run));
            }
        }
        CliCommand::Clear => {
            store.clear_all();
            println!("cleared {}", cli.runs.display());
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn play(store: &mut RunStore, path: &std::path::Path, actions: &[Action]) -> Result<()> {
    let level = Level::load(path)?;
    info!(
        level = %path.display(),
        tiles = level.tiles.len(),
        actions = actions.len(),
        "starting session"
    );

    let started_at = SystemClock.now();
    let mut session = Session::start(&level, store, started_at);
    for action in actions {
        session.perform(*action);
    }
    let summary = session.finish();

    let (q, r) = (summary.position.q(), summary.position.r());
    match summary.result {
        Some(result) => println!(
            "run ended ({}) after {} steps at ({q}, {r})",
            result_label(result),
            summary.steps
        ),
        None => println!(
            "run unfinished after {} steps at ({q}, {r}); not recorded",
            summary.steps
        ),
    }
    println!("decoys remaining: {}", summary.decoys_remaining);
    if let Some(best) = store.best_finished_steps() {
        println!("best finished run: {best} steps");
    }
    Ok(())
}

fn result_label(result: hexwalk_core::RunResult) -> &'static str {
    match result {
        hexwalk_core::RunResult::Finished => "finished",
        hexwalk_core::RunResult::GaveUp => "gave up",
        hexwalk_core::RunResult::Trap => "trap",
    }
}

fn describe(run: &Run) -> String {
    let outcome = run.result.map_or("open", result_label);
    format!(
        "{id}  {outcome:<8} {steps:>4} steps  start ({q}, {r})  decoys {decoys}  footprints {footprints}",
        id = run.id,
        steps = run.steps_count,
        q = run.start.q(),
        r = run.start.r(),
        decoys = run.fake_trails.len(),
        footprints = run.footprints.len(),
    )
}
