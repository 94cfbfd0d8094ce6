use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use popcal_mcmc::{build_posterior, kernel, RunConfig};

use super::print_report;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML configuration describing the calibration.
    #[arg(long)]
    pub config: PathBuf,
    /// Master seed, overriding `seed_policy.master_seed`.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Worker threads, overriding `workers`.
    #[arg(long)]
    pub workers: Option<usize>,
    /// Number of steps, overriding `steps`.
    #[arg(long)]
    pub steps: Option<usize>,
    /// Output directory for run artefacts. Defaults to the configured run directory, or
    /// the current directory when none is configured.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let mut config = RunConfig::load(&args.config)?;
    apply_overrides(&mut config, args);
    config.validate()?;

    let posterior = build_posterior(&config)?;
    let report = kernel::run(&config, config.seed_policy.master_seed, &posterior)?;
    print_report(&report);
    Ok(())
}

fn apply_overrides(config: &mut RunConfig, args: &RunArgs) {
    if let Some(seed) = args.seed {
        config.seed_policy.master_seed = seed;
    }
    if let Some(workers) = args.workers {
        config.workers = Some(workers);
    }
    if let Some(steps) = args.steps {
        config.steps = steps;
    }
    if let Some(out) = &args.out {
        config.output.run_directory = Some(out.clone());
    }
    if config.output.run_directory.is_none() {
        config.output.run_directory = Some(PathBuf::from("."));
    }
}
