//! The five teardown operations applied to one principal.
//!
//! Every executor is idempotent: re-running against an already-cleaned
//! principal finds nothing to do and succeeds. The orchestrator relies on
//! this to make re-invocation the recovery path after any failure.

use std::sync::Arc;

use crate::db::{DbError, DbResult, PrincipalRepo};

/// Phase 1: sever membership edges in both directions.
///
/// The engine refuses to drop a role that still participates in any
/// membership edge, whichever side of the edge it is on.
pub async fn unlink_memberships(
    repo: &Arc<dyn PrincipalRepo>,
    principal: &str,
) -> DbResult<()> {
    for role in repo.granted_roles(principal).await? {
        repo.revoke_membership(&role, principal).await?;
    }
    for member in repo.member_roles(principal).await? {
        repo.revoke_membership(principal, &member).await?;
    }
    Ok(())
}

/// Phase 2: revoke every default-ACL rule that would auto-grant future
/// objects to the principal, per exact key tuple.
pub async fn scrub_default_acls(
    repo: &Arc<dyn PrincipalRepo>,
    principal: &str,
) -> DbResult<()> {
    for entry in repo.default_acl_entries(principal).await? {
        repo.revoke_default_acl(&entry, principal).await?;
    }
    Ok(())
}

/// Phase 3: revoke privileges held directly on the database container.
pub async fn revoke_database_privileges(
    repo: &Arc<dyn PrincipalRepo>,
    principal: &str,
) -> DbResult<()> {
    repo.revoke_database_privileges(principal).await
}

/// Phase 4: revoke schema usage and object privileges in every non-system
/// schema.
///
/// One schema's failure does not abort the loop over the remaining
/// schemas; the phase fails afterwards if any schema failed.
pub async fn sweep_schema_privileges(
    repo: &Arc<dyn PrincipalRepo>,
    principal: &str,
) -> DbResult<()> {
    let mut failed: Vec<String> = Vec::new();
    for schema in repo.user_schemas().await? {
        if let Err(e) = repo.revoke_schema_privileges(&schema, principal).await {
            tracing::warn!(
                principal,
                schema = %schema,
                error = %e,
                "schema privilege revocation failed, continuing with remaining schemas"
            );
            failed.push(schema);
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(DbError::Internal(format!(
            "revocation failed in {} schema(s): {}",
            failed.len(),
            failed.join(", ")
        )))
    }
}

/// Phase 5: reassign still-owned objects to the custodian, drop residuals,
/// then remove the principal itself.
///
/// "Already gone" is success at every step: the principal may have been
/// deleted externally between discovery and now.
pub async fn remove_principal(
    repo: &Arc<dyn PrincipalRepo>,
    principal: &str,
    custodian: &str,
) -> DbResult<()> {
    repo.reassign_owned(principal, custodian).await?;
    repo.drop_owned(principal).await?;
    repo.drop_principal(principal).await
}
