//! Per-principal teardown: the five phases in dependency order.

use std::sync::Arc;

use crate::{
    db::{DbError, PrincipalRepo},
    models::{PhaseFailure, TeardownOutcome, TeardownPhase, TeardownResult},
    reaper::phases,
};

/// Run all five phases for one principal, in order.
///
/// Phases 1-4 record their failure and execution continues: a failed
/// default-ACL scrub must never prevent privilege revocation or the final
/// drop. Removal always runs, even after four failures, since the
/// principal may have had no blocking dependency in the first place.
pub async fn teardown_principal(
    repo: &Arc<dyn PrincipalRepo>,
    principal: &str,
    custodian: &str,
) -> TeardownResult {
    let mut failures: Vec<PhaseFailure> = Vec::new();
    let mut cleanup_progress = false;

    match phases::unlink_memberships(repo, principal).await {
        Ok(()) => cleanup_progress = true,
        Err(e) => record_failure(&mut failures, principal, TeardownPhase::Memberships, &e),
    }

    match phases::scrub_default_acls(repo, principal).await {
        Ok(()) => cleanup_progress = true,
        Err(e) => record_failure(&mut failures, principal, TeardownPhase::DefaultAcls, &e),
    }

    match phases::revoke_database_privileges(repo, principal).await {
        Ok(()) => cleanup_progress = true,
        Err(e) => record_failure(
            &mut failures,
            principal,
            TeardownPhase::DatabasePrivileges,
            &e,
        ),
    }

    match phases::sweep_schema_privileges(repo, principal).await {
        Ok(()) => cleanup_progress = true,
        Err(e) => record_failure(
            &mut failures,
            principal,
            TeardownPhase::SchemaPrivileges,
            &e,
        ),
    }

    let outcome = match phases::remove_principal(repo, principal, custodian).await {
        Ok(()) => {
            tracing::info!(principal, "dropped expired principal");
            TeardownOutcome::Dropped
        }
        Err(e) => {
            record_failure(&mut failures, principal, TeardownPhase::Removal, &e);
            if cleanup_progress {
                TeardownOutcome::PartiallyCleaned
            } else {
                TeardownOutcome::Failed
            }
        }
    };

    TeardownResult {
        name: principal.to_string(),
        failures,
        outcome,
    }
}

fn record_failure(
    failures: &mut Vec<PhaseFailure>,
    principal: &str,
    phase: TeardownPhase,
    error: &DbError,
) {
    tracing::warn!(
        principal,
        phase = %phase,
        error = %error,
        "teardown phase failed, continuing"
    );
    failures.push(PhaseFailure {
        principal: principal.to_string(),
        phase,
        error: error.to_string(),
    });
}
