//! Audit report rendering.
//!
//! One row per family in the stable, alerting-facing schema, plus one
//! detail line per recorded phase failure. Rendering never retries
//! anything; re-invoking the pipeline later is the recovery path.

use std::fmt::Write;

use crate::models::RunReport;

/// Render the run report as an aligned text table plus failure detail.
pub fn render_table(report: &RunReport) -> String {
    let family_width = report
        .batches
        .iter()
        .map(|b| b.family.len())
        .chain(std::iter::once("family".len()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<family_width$}  {:>9}  {:>7}  {:>6}",
        "family", "attempted", "dropped", "failed"
    );
    for batch in &report.batches {
        let note = if batch.discovery_error {
            "  (discovery failed)"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "{:<family_width$}  {:>9}  {:>7}  {:>6}{}",
            batch.family, batch.total_attempted, batch.successfully_dropped, batch.failed, note
        );
    }

    if !report.failures.is_empty() {
        let _ = writeln!(out, "\nphase failures:");
        for failure in &report.failures {
            let _ = writeln!(
                out,
                "  principal={} phase={} error={}",
                failure.principal, failure.phase, failure.error
            );
        }
    }

    out
}

/// Serialize the report in the stable JSON schema consumed by alerting.
pub fn to_json(report: &RunReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
