//! Capability surface over the role catalog.

use async_trait::async_trait;

use crate::{
    db::error::DbResult,
    models::{CredentialPrincipal, DefaultAclEntry},
};

/// Typed client over the role catalog's query and mutation surface.
///
/// Implemented against PostgreSQL in [`crate::db::postgres`]; tests
/// substitute an in-memory fake. Enumeration reflects live catalog state at
/// call time, and the catalog mutates concurrently, so every operation must
/// tolerate entries vanishing between a listing and the statement acting on
/// them.
#[async_trait]
pub trait PrincipalRepo: Send + Sync {
    /// All principals whose name matches the family pattern, with their
    /// validity window. No expiry filtering happens here; the candidate
    /// rule belongs to discovery.
    async fn principals_matching(&self, pattern: &str) -> DbResult<Vec<CredentialPrincipal>>;

    /// Roles the principal is a member of.
    async fn granted_roles(&self, principal: &str) -> DbResult<Vec<String>>;

    /// Roles that are members of the principal.
    async fn member_roles(&self, principal: &str) -> DbResult<Vec<String>>;

    /// Sever one membership edge: `member` stops being a member of `role`.
    async fn revoke_membership(&self, role: &str, member: &str) -> DbResult<()>;

    /// Default-ACL rules that grant future privileges to the principal.
    async fn default_acl_entries(&self, principal: &str) -> DbResult<Vec<DefaultAclEntry>>;

    /// Revoke one default-ACL rule for the principal, by exact key tuple.
    async fn revoke_default_acl(&self, entry: &DefaultAclEntry, principal: &str) -> DbResult<()>;

    /// Revoke privileges the principal holds directly on the database.
    async fn revoke_database_privileges(&self, principal: &str) -> DbResult<()>;

    /// Non-system schemas, minus the configured exclusions.
    async fn user_schemas(&self) -> DbResult<Vec<String>>;

    /// Revoke schema usage and all table/sequence/function privileges the
    /// principal holds inside one schema.
    async fn revoke_schema_privileges(&self, schema: &str, principal: &str) -> DbResult<()>;

    /// Reassign objects owned by the principal to the custodian role.
    /// Succeeds if the principal is already gone.
    async fn reassign_owned(&self, principal: &str, custodian: &str) -> DbResult<()>;

    /// Drop residual objects still owned by the principal.
    /// Succeeds if the principal is already gone.
    async fn drop_owned(&self, principal: &str) -> DbResult<()>;

    /// Remove the principal itself. Succeeds if the role is already gone.
    async fn drop_principal(&self, principal: &str) -> DbResult<()>;
}
