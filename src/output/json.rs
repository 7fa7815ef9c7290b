//! JSON report output
//!
//! Machine-readable summary of a completed run: the parameters, both matrices,
//! and timing. Unreachable entries serialize as `null` so consumers do not
//! need to know the sentinel value.

use crate::config::Config;
use crate::graph::{Weight, UNREACHABLE};
use crate::runner::RunReport;
use crate::util::verification::VerificationResult;
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Top-level JSON report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    /// meshpath version that produced the report
    pub version: String,
    pub graph: JsonGraphParams,
    /// Exchange rounds executed (N-1)
    pub rounds: usize,
    /// Wall-clock seconds for exchange + collection
    pub elapsed_s: f64,
    /// Adjacency matrix; `null` marks a missing edge
    pub adjacency: Vec<Vec<Option<Weight>>>,
    /// Converged distances; `null` marks an unreachable pair
    pub distances: Vec<Vec<Option<Weight>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<JsonVerification>,
}

/// Graph generation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonGraphParams {
    pub nodes: usize,
    pub max_weight: Weight,
    pub unreachable_probability: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Verification outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonVerification {
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_mismatch: Option<JsonMismatch>,
}

/// First mismatching entry, when verification failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonMismatch {
    pub source: usize,
    pub target: usize,
    pub expected: Option<Weight>,
    pub actual: Option<Weight>,
}

impl JsonReport {
    pub fn build(
        report: &RunReport,
        config: &Config,
        verification: Option<&VerificationResult>,
    ) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            graph: JsonGraphParams {
                nodes: config.graph.nodes,
                max_weight: config.graph.max_weight,
                unreachable_probability: config.graph.unreachable_probability,
                seed: config.graph.seed,
            },
            rounds: report.rounds,
            elapsed_s: report.elapsed.as_secs_f64(),
            adjacency: nullable_rows(report.adjacency.rows()),
            distances: nullable_rows(report.distances.rows()),
            verification: verification.map(|v| match v {
                VerificationResult::Success => JsonVerification {
                    passed: true,
                    first_mismatch: None,
                },
                VerificationResult::Failure {
                    source,
                    target,
                    expected,
                    actual,
                } => JsonVerification {
                    passed: false,
                    first_mismatch: Some(JsonMismatch {
                        source: *source,
                        target: *target,
                        expected: nullable(*expected),
                        actual: nullable(*actual),
                    }),
                },
            }),
        }
    }
}

/// Write a JSON report for a completed run
pub fn write_report(
    path: &Path,
    report: &RunReport,
    config: &Config,
    verification: Option<&VerificationResult>,
) -> Result<()> {
    let json = JsonReport::build(report, config, verification);

    let file = File::create(path)
        .with_context(|| format!("Failed to create JSON report: {}", path.display()))?;
    serde_json::to_writer_pretty(file, &json)
        .with_context(|| format!("Failed to write JSON report: {}", path.display()))?;

    Ok(())
}

fn nullable(w: Weight) -> Option<Weight> {
    if w == UNREACHABLE {
        None
    } else {
        Some(w)
    }
}

fn nullable_rows<'a>(rows: impl Iterator<Item = &'a [Weight]>) -> Vec<Vec<Option<Weight>>> {
    rows.map(|row| row.iter().map(|&w| nullable(w)).collect())
        .collect()
}
