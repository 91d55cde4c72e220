//! Core domain types shared across the reaper pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One leased role as recorded in the role catalog.
///
/// Created externally by the secret manager. A principal without an expiry
/// is not a lease and is never touched by the reaper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPrincipal {
    pub name: String,
    pub valid_until: Option<DateTime<Utc>>,
}

/// Object kinds a default-ACL rule can cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclObjectKind {
    Table,
    Sequence,
    Function,
    Type,
}

impl AclObjectKind {
    /// Keyword used in `ALTER DEFAULT PRIVILEGES ... REVOKE ALL ON <kw>`.
    pub fn revoke_keyword(&self) -> &'static str {
        match self {
            AclObjectKind::Table => "TABLES",
            AclObjectKind::Sequence => "SEQUENCES",
            AclObjectKind::Function => "FUNCTIONS",
            AclObjectKind::Type => "TYPES",
        }
    }
}

impl TryFrom<char> for AclObjectKind {
    type Error = String;

    /// Decode a `pg_default_acl.defaclobjtype` catalog code.
    fn try_from(code: char) -> Result<Self, Self::Error> {
        match code {
            'r' => Ok(AclObjectKind::Table),
            'S' => Ok(AclObjectKind::Sequence),
            'f' => Ok(AclObjectKind::Function),
            'T' => Ok(AclObjectKind::Type),
            other => Err(format!("unknown default-ACL object kind code {other:?}")),
        }
    }
}

impl fmt::Display for AclObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AclObjectKind::Table => "table",
            AclObjectKind::Sequence => "sequence",
            AclObjectKind::Function => "function",
            AclObjectKind::Type => "type",
        };
        f.write_str(name)
    }
}

/// One future-privilege rule referencing a principal.
///
/// Revocation must name the exact (granting role, schema-or-global, kind)
/// tuple the rule is keyed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultAclEntry {
    pub granting_role: String,
    /// `None` for a database-global rule rather than a schema-scoped one.
    pub schema: Option<String>,
    pub kind: AclObjectKind,
}

/// Teardown phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TeardownPhase {
    Memberships,
    DefaultAcls,
    DatabasePrivileges,
    SchemaPrivileges,
    Removal,
}

impl fmt::Display for TeardownPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TeardownPhase::Memberships => "memberships",
            TeardownPhase::DefaultAcls => "default_acls",
            TeardownPhase::DatabasePrivileges => "database_privileges",
            TeardownPhase::SchemaPrivileges => "schema_privileges",
            TeardownPhase::Removal => "removal",
        };
        f.write_str(name)
    }
}

/// A recorded failure of one phase for one principal.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseFailure {
    pub principal: String,
    pub phase: TeardownPhase,
    pub error: String,
}

/// How far the teardown of one principal got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownOutcome {
    /// Final removal succeeded; the principal is gone.
    Dropped,
    /// Final removal failed but at least one earlier phase made progress.
    /// Re-invocation later is the intended recovery path.
    PartiallyCleaned,
    /// Final removal failed and no earlier phase made progress, e.g. an
    /// active session still holds the role. Requires operator follow-up.
    Failed,
}

/// Result of tearing down one principal.
#[derive(Debug)]
pub struct TeardownResult {
    pub name: String,
    pub failures: Vec<PhaseFailure>,
    pub outcome: TeardownOutcome,
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// Per-family counters in the stable, alerting-facing schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub family: String,
    pub total_attempted: u64,
    pub successfully_dropped: u64,
    pub failed: u64,
    /// Set when the candidate query itself failed and the family was skipped.
    #[serde(skip_serializing_if = "is_false")]
    pub discovery_error: bool,
}

impl BatchReport {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            total_attempted: 0,
            successfully_dropped: 0,
            failed: 0,
            discovery_error: false,
        }
    }

    pub fn discovery_failed(family: impl Into<String>) -> Self {
        Self {
            discovery_error: true,
            ..Self::new(family)
        }
    }
}

/// The full result of one reap pass: one batch per configured family, in
/// configuration order, plus every phase failure collected along the way.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub batches: Vec<BatchReport>,
    pub failures: Vec<PhaseFailure>,
}

impl RunReport {
    /// True when any family had a discovery error or left principals behind.
    pub fn has_failures(&self) -> bool {
        self.batches
            .iter()
            .any(|b| b.failed > 0 || b.discovery_error)
    }
}
