use thiserror::Error;

use crate::db::DbError;

/// Candidate lookup failed for one family.
///
/// Fatal to that family only: the family is reported with zero attempts and
/// the run moves on to the next one.
#[derive(Debug, Error)]
#[error("discovery failed for family {family:?}: {source}")]
pub struct DiscoveryError {
    pub family: String,
    #[source]
    pub source: DbError,
}
