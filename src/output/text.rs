//! Human-readable text output

use crate::config::Config;
use crate::graph::{Weight, UNREACHABLE};
use crate::runner::RunReport;
use crate::util::verification::VerificationResult;

/// Print the configuration summary before a run
pub fn print_configuration(config: &Config) {
    println!("Configuration:");
    println!("  Graph:   {}", config.graph);
    println!("  Mesh:    {}", config.mesh);
    println!("  Output:  {}", config.output);
    println!("  Runtime: {}", config.runtime);
}

/// Print the full run report: both matrices and the summary line
pub fn print_report(report: &RunReport, config: &Config) {
    println!("═══════════════════════════════════════════════════════════");
    println!("                 SHORTEST PATH RESULTS");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    if !config.output.quiet {
        println!("Adjacency matrix:");
        for line in matrix_lines(report.adjacency.rows()) {
            println!("  {}", line);
        }
        println!();

        println!("Distance matrix:");
        for line in matrix_lines(report.distances.rows()) {
            println!("  {}", line);
        }
        println!();
    }

    println!(
        "Computed {}x{} shortest paths in {:.3}s ({} exchange rounds)",
        report.adjacency.n(),
        report.adjacency.n(),
        report.elapsed.as_secs_f64(),
        report.rounds
    );
}

/// Print the outcome of the Dijkstra cross-check
pub fn print_verification(result: &VerificationResult) {
    match result {
        VerificationResult::Success => {
            println!("Verification: all entries match the Dijkstra reference");
        }
        VerificationResult::Failure {
            source,
            target,
            expected,
            actual,
        } => {
            println!(
                "Verification FAILED: distance ({} -> {}) is {}, reference says {}",
                source,
                target,
                format_weight(*actual),
                format_weight(*expected)
            );
        }
    }
}

/// Render matrix rows as aligned text lines, sentinel shown as `INF`
pub fn matrix_lines<'a>(rows: impl Iterator<Item = &'a [Weight]>) -> Vec<String> {
    let formatted: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(|&w| format_weight(w)).collect())
        .collect();

    let width = formatted
        .iter()
        .flatten()
        .map(|s| s.len())
        .max()
        .unwrap_or(1);

    formatted
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| format!("{:>width$}", cell, width = width))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Format one weight, sentinel as `INF`
pub fn format_weight(w: Weight) -> String {
    if w == UNREACHABLE {
        "INF".to_string()
    } else {
        w.to_string()
    }
}
