use std::error::Error;
use std::io::Write;

use clap::{Parser, Subcommand};
use commands::{
    commit::{self, CommitArgs},
    parts::{self, PartsArgs},
    run::{self, RunArgs},
    show::{self, ShowArgs},
};
use mlexp_store::to_canonical_json_bytes;
use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "mlexp", about = "Versioned hyperparameter sweeps and local run scheduling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Commit every part of a YAML definition file to the experiment store.
    Commit(CommitArgs),
    /// List parts with their versions.
    Parts(PartsArgs),
    /// Print committed configurations, optionally crossed with seeds.
    Show(ShowArgs),
    /// Enumerate, filter and dispatch runs to an entry point.
    Run(RunArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mlexp=info,mlexp_store=info,mlexp_sched=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Commit(args) => commit::run(&args),
        Command::Parts(args) => parts::run(&args),
        Command::Show(args) => show::run(&args),
        Command::Run(args) => run::run(&args),
    }
}

/// Prints `value` to stdout as canonical JSON.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    let mut bytes = to_canonical_json_bytes(value)?;
    bytes.push(b'\n');
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&bytes)?;
    stdout.flush()?;
    Ok(())
}
