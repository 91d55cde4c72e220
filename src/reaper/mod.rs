//! Expired dynamic-credential reaper.
//!
//! Discovers leased principals whose validity window has passed and tears
//! down their privilege graph in a fixed safe order before dropping them.
//! Failures are isolated at every level: a broken phase never blocks the
//! remaining phases of its principal, a broken principal never blocks the
//! remaining principals of its family, and a broken family never blocks
//! the remaining families of the run.

mod discovery;
mod error;
mod orchestrator;
mod phases;
pub mod report;

pub use discovery::discover_expired;
pub use error::DiscoveryError;
pub use orchestrator::teardown_principal;

use std::sync::Arc;

use chrono::Utc;

use crate::{
    db::PrincipalRepo,
    models::{BatchReport, PhaseFailure, RunReport, TeardownOutcome},
};

/// Sweeps expired leased principals, family by family.
pub struct Reaper {
    repo: Arc<dyn PrincipalRepo>,
    custodian_role: String,
    progress_batch: usize,
}

impl Reaper {
    pub fn new(
        repo: Arc<dyn PrincipalRepo>,
        custodian_role: impl Into<String>,
        progress_batch: usize,
    ) -> Self {
        Self {
            repo,
            custodian_role: custodian_role.into(),
            progress_batch: progress_batch.max(1),
        }
    }

    /// Sweep one family, returning its counters.
    ///
    /// Never fails: a discovery error is recorded on the report and the
    /// family is skipped.
    pub async fn reap_family(&self, family: &str) -> BatchReport {
        self.reap_family_detailed(family).await.0
    }

    async fn reap_family_detailed(&self, family: &str) -> (BatchReport, Vec<PhaseFailure>) {
        let now = Utc::now();
        let candidates = match discover_expired(&self.repo, family, now).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!(family, error = %e, "family discovery failed, skipping family");
                return (BatchReport::discovery_failed(family), Vec::new());
            }
        };

        tracing::info!(family, candidates = candidates.len(), "sweeping family");

        let mut report = BatchReport::new(family);
        let mut failures: Vec<PhaseFailure> = Vec::new();

        for (idx, principal) in candidates.iter().enumerate() {
            let result =
                teardown_principal(&self.repo, &principal.name, &self.custodian_role).await;

            report.total_attempted += 1;
            match result.outcome {
                TeardownOutcome::Dropped => report.successfully_dropped += 1,
                TeardownOutcome::PartiallyCleaned | TeardownOutcome::Failed => report.failed += 1,
            }
            failures.extend(result.failures);

            if (idx + 1) % self.progress_batch == 0 {
                tracing::info!(
                    family,
                    processed = idx + 1,
                    total = candidates.len(),
                    "sweep progress"
                );
            }
        }

        (report, failures)
    }

    /// Sweep every given family, in order.
    ///
    /// Always returns a complete report: every family appears exactly
    /// once, including families with zero candidates and families whose
    /// discovery failed.
    pub async fn reap_all(&self, families: &[String]) -> RunReport {
        let mut batches = Vec::with_capacity(families.len());
        let mut failures: Vec<PhaseFailure> = Vec::new();

        for family in families {
            let (batch, family_failures) = self.reap_family_detailed(family).await;
            batches.push(batch);
            failures.extend(family_failures);
        }

        RunReport { batches, failures }
    }
}
