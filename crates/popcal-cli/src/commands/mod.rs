pub mod resume;
pub mod run;
pub mod summarize;
pub mod version;

use popcal_mcmc::{RunReport, Summary};

/// Prints the marginal posterior table to stdout.
pub fn print_summary(summary: &Summary) {
    println!(
        "{:<12} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "parameter", "mean", "median", "std", "p2.5", "p97.5"
    );
    for param in &summary.parameters {
        let median = match param.rounded_median {
            Some(rounded) => format!("{rounded}"),
            None => format!("{:.4}", param.median),
        };
        println!(
            "{:<12} {:>12.4} {:>12} {:>12.4} {:>12.4} {:>12.4}",
            param.name, param.mean, median, param.std, param.p2_5, param.p97_5
        );
    }
    println!(
        "steps={} walkers={} burn_in={} samples={} acceptance={:.3}",
        summary.steps,
        summary.walkers,
        summary.burn_in,
        summary.retained_samples,
        summary.convergence.mean_acceptance
    );
}

pub fn print_report(report: &RunReport) {
    print_summary(&report.summary);
    let failures = report.metrics.total_simulator_failures();
    if failures > 0 {
        println!("simulator failures: {failures}");
    }
    if let Some(path) = &report.manifest_path {
        println!("manifest: {}", path.display());
    }
}
