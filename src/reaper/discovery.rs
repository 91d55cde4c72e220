//! Expired-principal discovery for one naming family.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    db::PrincipalRepo,
    models::CredentialPrincipal,
    reaper::error::DiscoveryError,
};

/// Find principals in `family` whose lease expired strictly before `now`,
/// most overdue first.
///
/// A principal without an expiry is not managed by this reaper and is never
/// a candidate; neither is one whose window is still open. Ordering puts
/// the longest-overdue leases first so that an interrupted run has already
/// attempted the riskiest ones.
pub async fn discover_expired(
    repo: &Arc<dyn PrincipalRepo>,
    family: &str,
    now: DateTime<Utc>,
) -> Result<Vec<CredentialPrincipal>, DiscoveryError> {
    let matching = repo
        .principals_matching(family)
        .await
        .map_err(|source| DiscoveryError {
            family: family.to_string(),
            source,
        })?;

    let mut expired: Vec<CredentialPrincipal> = matching
        .into_iter()
        .filter(|p| p.valid_until.is_some_and(|until| until < now))
        .collect();
    expired.sort_by_key(|p| p.valid_until);

    tracing::debug!(
        family,
        candidates = expired.len(),
        "discovered expired principals"
    );

    Ok(expired)
}
