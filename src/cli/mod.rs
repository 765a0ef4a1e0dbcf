// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All real work is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `record`  — run the demo network and save what it did
//   2. `summary` — print the module forest of a recording
//   3. `inspect` — browse a recording module by module

pub mod commands;

use std::io;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, InspectArgs, RecordArgs, SummaryArgs};

/// clap reads the fields and generates the argument parser.
#[derive(Parser, Debug)]
#[command(
    name = "dr-tensor",
    version = "0.1.0",
    about = "Record what every module of a network sees during forward passes, then browse it."
)]
pub struct Cli {
    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand to its use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Record(args)  => run_record(args),
            Commands::Summary(args) => run_summary(args),
            Commands::Inspect(args) => run_inspect(args),
        }
    }
}

fn run_record(args: RecordArgs) -> Result<()> {
    use crate::application::record_use_case::RecordUseCase;

    tracing::info!("Recording {} forward passes into: {}", args.steps, args.output);
    let output = args.output.clone();
    let report = RecordUseCase::new(args.into()).execute()?;

    println!(
        "Recorded {} calls across {} modules ({} tensors) → {}",
        report.calls, report.modules, report.tensors, output
    );
    Ok(())
}

fn run_summary(args: SummaryArgs) -> Result<()> {
    use crate::application::summary_use_case::SummaryUseCase;

    print!("{}", SummaryUseCase::new(args.input).execute()?);
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;

    tracing::info!("Inspecting: {}", args.input);
    InspectUseCase::new(args.input, args.module).execute(io::stdin().lock(), io::stdout().lock())
}
