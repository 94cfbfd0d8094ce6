use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use popcal_mcmc::{build_posterior, kernel, CheckpointPayload};

use super::print_report;

#[derive(Args, Debug)]
pub struct ResumeArgs {
    /// Checkpoint file written by an earlier run.
    #[arg(long)]
    pub checkpoint: PathBuf,
    /// Worker threads, overriding the checkpointed configuration.
    #[arg(long)]
    pub workers: Option<usize>,
    /// Extend the run to this many steps in total.
    #[arg(long)]
    pub steps: Option<usize>,
    /// Output directory, overriding the checkpointed configuration.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &ResumeArgs) -> Result<(), Box<dyn Error>> {
    let mut payload = CheckpointPayload::load(&args.checkpoint)?;
    if let Some(workers) = args.workers {
        payload.config.workers = Some(workers);
    }
    if let Some(steps) = args.steps {
        if steps < payload.step {
            return Err(format!(
                "--steps {steps} is below the {} steps already in the checkpoint",
                payload.step
            )
            .into());
        }
        payload.config.steps = steps;
    }
    if let Some(out) = &args.out {
        payload.config.output.run_directory = Some(out.clone());
    }
    payload.config.validate()?;

    let posterior = build_posterior(&payload.config)?;
    let report = kernel::resume(payload, &posterior)?;
    print_report(&report);
    Ok(())
}
