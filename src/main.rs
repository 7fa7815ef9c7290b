//! meshpath CLI entry point

use anyhow::Result;
use meshpath::config::cli::{Cli, ExecutionMode};
use meshpath::config::{toml, validator, Config};
use meshpath::output::{json, text};
use meshpath::runner::{self, RunReport};
use meshpath::util::verification::{verify_distances, VerificationResult};

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli.validate()?;

    let config = toml::load_config(&cli)?;
    validator::validate_config(&config, cli.mode)?;

    // Rank mode stays terse on non-collecting ranks; the banner belongs to
    // whoever prints the result.
    let announces = cli.mode == ExecutionMode::Standalone || config.mesh.rank == Some(0);
    if announces {
        println!("meshpath v{}", env!("CARGO_PKG_VERSION"));
        println!("Distributed all-pairs shortest path computation");
        println!();
        text::print_configuration(&config);
        println!();
    }

    if config.runtime.dry_run {
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    match cli.mode {
        ExecutionMode::Standalone => {
            let report = runner::run_standalone(&config)?;
            finish(&report, &config)
        }
        ExecutionMode::Rank => match runner::run_rank(&config)? {
            Some(report) => finish(&report, &config),
            None => {
                if let Some(rank) = config.mesh.rank {
                    println!("rank {} converged; result collected at rank 0", rank);
                }
                Ok(())
            }
        },
    }
}

/// Render and verify a completed run. Only the collecting participant gets here.
fn finish(report: &RunReport, config: &Config) -> Result<()> {
    text::print_report(report, config);

    let verification = if config.runtime.verify {
        let result = verify_distances(&report.adjacency, &report.distances);
        text::print_verification(&result);
        Some(result)
    } else {
        None
    };

    if let Some(ref path) = config.output.json_output {
        json::write_report(path, report, config, verification.as_ref())?;
        println!("JSON report written to: {}", path.display());
    }

    if let Some(VerificationResult::Failure { .. }) = verification {
        anyhow::bail!("verification failed: computed distances diverge from the reference");
    }

    Ok(())
}
