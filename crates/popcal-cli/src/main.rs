use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    resume::{self, ResumeArgs},
    run::{self, RunArgs},
    summarize::{self, SummarizeArgs},
    version::{self, VersionArgs},
};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "popcal", about = "Ensemble MCMC calibration of population simulators")]
struct Cli {
    /// Log verbosity (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: tracing::Level,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Calibrate the simulator described by a YAML configuration.
    Run(RunArgs),
    /// Continue a run from one of its checkpoints.
    Resume(ResumeArgs),
    /// Recompute posterior summaries from a stored chain.
    Summarize(SummarizeArgs),
    /// Print version information.
    Version(VersionArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Run(args) => run::run(&args),
        Command::Resume(args) => resume::run(&args),
        Command::Summarize(args) => summarize::run(&args),
        Command::Version(args) => version::run(&args),
    }
}
