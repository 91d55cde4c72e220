//! Shared test support: an in-memory role catalog implementing
//! [`PrincipalRepo`].
//!
//! The fake enforces the engine's drop rules: a principal cannot be
//! dropped while any membership edge, default-ACL rule, grant, owned
//! object, or active session still references it. Teardown tests
//! therefore pass only when the phases actually cleaned everything up.
//! Mutating operations are recorded for ordering assertions; reads are
//! not.

use std::{collections::BTreeMap, sync::Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    db::{DbError, DbResult, PrincipalRepo},
    models::{AclObjectKind, CredentialPrincipal, DefaultAclEntry},
};

/// Repo operations that can be made to fail for one principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    /// Membership enumeration fails.
    Memberships,
    /// Default-ACL enumeration fails.
    DefaultAcls,
    /// Database-level revocation fails.
    DatabasePrivileges,
    /// Ownership reassignment fails.
    Reassign,
}

#[derive(Default)]
struct State {
    principals: Vec<CredentialPrincipal>,
    /// (role, member) edges.
    memberships: Vec<(String, String)>,
    /// (rule, grantee).
    default_acls: Vec<(DefaultAclEntry, String)>,
    database_grants: Vec<String>,
    schemas: Vec<String>,
    /// (schema, grantee).
    schema_grants: Vec<(String, String)>,
    owned_objects: BTreeMap<String, u32>,
    fail_points: Vec<(String, FailPoint)>,
    /// (principal, schema) pairs whose revocation fails.
    failing_schemas: Vec<(String, String)>,
    fail_user_schemas: bool,
    failing_patterns: Vec<String>,
    held_roles: Vec<String>,
    calls: Vec<String>,
}

#[derive(Default)]
pub struct FakePrincipalRepo {
    state: Mutex<State>,
}

impl FakePrincipalRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_principal(&self, name: &str, valid_until: Option<DateTime<Utc>>) {
        self.state.lock().unwrap().principals.push(CredentialPrincipal {
            name: name.into(),
            valid_until,
        });
    }

    pub fn add_membership(&self, role: &str, member: &str) {
        self.state
            .lock()
            .unwrap()
            .memberships
            .push((role.into(), member.into()));
    }

    pub fn add_default_acl(
        &self,
        granting_role: &str,
        schema: Option<&str>,
        kind: AclObjectKind,
        grantee: &str,
    ) {
        self.state.lock().unwrap().default_acls.push((
            DefaultAclEntry {
                granting_role: granting_role.into(),
                schema: schema.map(Into::into),
                kind,
            },
            grantee.into(),
        ));
    }

    pub fn add_database_grant(&self, principal: &str) {
        self.state
            .lock()
            .unwrap()
            .database_grants
            .push(principal.into());
    }

    pub fn add_schema(&self, name: &str) {
        self.state.lock().unwrap().schemas.push(name.into());
    }

    pub fn add_schema_grant(&self, schema: &str, grantee: &str) {
        self.state
            .lock()
            .unwrap()
            .schema_grants
            .push((schema.into(), grantee.into()));
    }

    pub fn add_owned_objects(&self, principal: &str, count: u32) {
        *self
            .state
            .lock()
            .unwrap()
            .owned_objects
            .entry(principal.into())
            .or_insert(0) += count;
    }

    pub fn fail_point(&self, principal: &str, point: FailPoint) {
        self.state
            .lock()
            .unwrap()
            .fail_points
            .push((principal.into(), point));
    }

    pub fn fail_schema(&self, principal: &str, schema: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_schemas
            .push((principal.into(), schema.into()));
    }

    pub fn fail_user_schemas(&self) {
        self.state.lock().unwrap().fail_user_schemas = true;
    }

    /// Make discovery fail for one family pattern.
    pub fn fail_matching(&self, pattern: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_patterns
            .push(pattern.into());
    }

    /// Simulate an active session holding the role: the drop will refuse.
    pub fn hold_role(&self, principal: &str) {
        self.state.lock().unwrap().held_roles.push(principal.into());
    }

    pub fn release_role(&self, principal: &str) {
        self.state
            .lock()
            .unwrap()
            .held_roles
            .retain(|r| r != principal);
    }

    /// Remove every injected failure, keeping catalog state intact.
    pub fn clear_failures(&self) {
        let mut state = self.state.lock().unwrap();
        state.fail_points.clear();
        state.failing_schemas.clear();
        state.fail_user_schemas = false;
        state.failing_patterns.clear();
    }

    /// Recorded mutating operations, in execution order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn has_principal(&self, name: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .principals
            .iter()
            .any(|p| p.name == name)
    }

    /// Edges where the principal appears on either side.
    pub fn membership_count(&self, principal: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .memberships
            .iter()
            .filter(|(role, member)| role == principal || member == principal)
            .count()
    }
}

fn check_fail(state: &State, principal: &str, point: FailPoint) -> DbResult<()> {
    if state
        .fail_points
        .iter()
        .any(|(p, fp)| p == principal && *fp == point)
    {
        return Err(DbError::Internal(format!(
            "injected {point:?} failure for {principal}"
        )));
    }
    Ok(())
}

fn has_dependencies(state: &State, principal: &str) -> bool {
    state
        .memberships
        .iter()
        .any(|(role, member)| role == principal || member == principal)
        || state.default_acls.iter().any(|(_, grantee)| grantee == principal)
        || state.database_grants.iter().any(|g| g == principal)
        || state.schema_grants.iter().any(|(_, grantee)| grantee == principal)
        || state.owned_objects.get(principal).copied().unwrap_or(0) > 0
}

/// SQL LIKE matching: `%` matches any run, `_` any single character.
fn like_match(pattern: &str, value: &str) -> bool {
    fn matches(p: &[char], v: &[char]) -> bool {
        match p.split_first() {
            None => v.is_empty(),
            Some((&'%', rest)) => (0..=v.len()).any(|i| matches(rest, &v[i..])),
            Some((&'_', rest)) => !v.is_empty() && matches(rest, &v[1..]),
            Some((&c, rest)) => v.first() == Some(&c) && matches(rest, &v[1..]),
        }
    }
    let p: Vec<char> = pattern.chars().collect();
    let v: Vec<char> = value.chars().collect();
    matches(&p, &v)
}

#[async_trait]
impl PrincipalRepo for FakePrincipalRepo {
    async fn principals_matching(&self, pattern: &str) -> DbResult<Vec<CredentialPrincipal>> {
        let state = self.state.lock().unwrap();
        if state.failing_patterns.iter().any(|p| p == pattern) {
            return Err(DbError::Internal(format!(
                "injected discovery failure for {pattern}"
            )));
        }
        Ok(state
            .principals
            .iter()
            .filter(|p| like_match(pattern, &p.name))
            .cloned()
            .collect())
    }

    async fn granted_roles(&self, principal: &str) -> DbResult<Vec<String>> {
        let state = self.state.lock().unwrap();
        check_fail(&state, principal, FailPoint::Memberships)?;
        Ok(state
            .memberships
            .iter()
            .filter(|(_, member)| member == principal)
            .map(|(role, _)| role.clone())
            .collect())
    }

    async fn member_roles(&self, principal: &str) -> DbResult<Vec<String>> {
        let state = self.state.lock().unwrap();
        check_fail(&state, principal, FailPoint::Memberships)?;
        Ok(state
            .memberships
            .iter()
            .filter(|(role, _)| role == principal)
            .map(|(_, member)| member.clone())
            .collect())
    }

    async fn revoke_membership(&self, role: &str, member: &str) -> DbResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("revoke_membership {role} {member}"));
        state
            .memberships
            .retain(|(r, m)| !(r == role && m == member));
        Ok(())
    }

    async fn default_acl_entries(&self, principal: &str) -> DbResult<Vec<DefaultAclEntry>> {
        let state = self.state.lock().unwrap();
        check_fail(&state, principal, FailPoint::DefaultAcls)?;
        Ok(state
            .default_acls
            .iter()
            .filter(|(_, grantee)| grantee == principal)
            .map(|(entry, _)| entry.clone())
            .collect())
    }

    async fn revoke_default_acl(&self, entry: &DefaultAclEntry, principal: &str) -> DbResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!(
            "revoke_default_acl {} {} {} {}",
            entry.granting_role,
            entry.schema.as_deref().unwrap_or("<global>"),
            entry.kind,
            principal
        ));
        state
            .default_acls
            .retain(|(e, grantee)| !(e == entry && grantee == principal));
        Ok(())
    }

    async fn revoke_database_privileges(&self, principal: &str) -> DbResult<()> {
        let mut state = self.state.lock().unwrap();
        check_fail(&state, principal, FailPoint::DatabasePrivileges)?;
        state
            .calls
            .push(format!("revoke_database_privileges {principal}"));
        state.database_grants.retain(|g| g != principal);
        Ok(())
    }

    async fn user_schemas(&self) -> DbResult<Vec<String>> {
        let state = self.state.lock().unwrap();
        if state.fail_user_schemas {
            return Err(DbError::Internal("injected schema listing failure".into()));
        }
        Ok(state.schemas.clone())
    }

    async fn revoke_schema_privileges(&self, schema: &str, principal: &str) -> DbResult<()> {
        let mut state = self.state.lock().unwrap();
        if state
            .failing_schemas
            .iter()
            .any(|(p, s)| p == principal && s == schema)
        {
            return Err(DbError::Internal(format!(
                "injected revocation failure in schema {schema}"
            )));
        }
        state
            .calls
            .push(format!("revoke_schema_privileges {schema} {principal}"));
        state
            .schema_grants
            .retain(|(s, grantee)| !(s == schema && grantee == principal));
        Ok(())
    }

    async fn reassign_owned(&self, principal: &str, custodian: &str) -> DbResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(format!("reassign_owned {principal} {custodian}"));
        if !state.principals.iter().any(|p| p.name == principal) {
            return Ok(());
        }
        check_fail(&state, principal, FailPoint::Reassign)?;
        if let Some(count) = state.owned_objects.remove(principal) {
            *state.owned_objects.entry(custodian.into()).or_insert(0) += count;
        }
        Ok(())
    }

    async fn drop_owned(&self, principal: &str) -> DbResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("drop_owned {principal}"));
        if !state.principals.iter().any(|p| p.name == principal) {
            return Ok(());
        }
        state.owned_objects.remove(principal);
        Ok(())
    }

    async fn drop_principal(&self, principal: &str) -> DbResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("drop_principal {principal}"));
        if !state.principals.iter().any(|p| p.name == principal) {
            return Ok(());
        }
        if state.held_roles.iter().any(|r| r == principal) {
            return Err(DbError::Internal(format!(
                "role \"{principal}\" is held by an active session"
            )));
        }
        if has_dependencies(&state, principal) {
            return Err(DbError::Internal(format!(
                "role \"{principal}\" cannot be dropped because other objects depend on it"
            )));
        }
        state.principals.retain(|p| p.name != principal);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_match() {
        assert!(like_match("svc_user_%", "svc_user_abc123"));
        assert!(like_match("svc%", "svc_user_abc123"));
        assert!(!like_match("svc_user_%", "svc_use"));
        assert!(like_match("a_c", "abc"));
        assert!(!like_match("a_c", "abbc"));
        assert!(like_match("%", ""));
    }
}
