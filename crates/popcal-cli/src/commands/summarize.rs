use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use popcal_mcmc::artifacts::{load_chain, write_json, write_samples, write_summary_table};
use popcal_mcmc::summarize;

use super::print_summary;

#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// `chain.json` produced by a run.
    #[arg(long)]
    pub chain: PathBuf,
    /// Leading steps to discard.
    #[arg(long, default_value_t = 0)]
    pub burn_in: usize,
    /// Directory receiving `posterior_samples.csv`, `posterior_summary.csv` and
    /// `summary.json`. Only the table is printed when omitted.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &SummarizeArgs) -> Result<(), Box<dyn Error>> {
    let chain = load_chain(&args.chain)?;
    let summary = summarize(&chain, args.burn_in)?;
    if let Some(out) = &args.out {
        fs::create_dir_all(out)?;
        write_samples(&out.join("posterior_samples.csv"), &chain, args.burn_in)?;
        write_summary_table(&out.join("posterior_summary.csv"), &summary)?;
        write_json(&out.join("summary.json"), &summary)?;
    }
    print_summary(&summary);
    Ok(())
}
