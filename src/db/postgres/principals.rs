//! Raw-SQL implementation of [`PrincipalRepo`] over `pg_catalog`.
//!
//! Role, schema, and database names cannot travel as bind parameters in
//! GRANT/REVOKE/DROP statement forms, so they are quoted with
//! [`quote_ident`] and spliced into the statement text. Catalog lookups use
//! bind parameters throughout.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::{
    db::{
        error::{DbError, DbResult},
        repos::PrincipalRepo,
    },
    models::{AclObjectKind, CredentialPrincipal, DefaultAclEntry},
};

pub struct PostgresPrincipalRepo {
    pool: PgPool,
    exclude_schemas: Vec<String>,
}

impl PostgresPrincipalRepo {
    pub fn new(pool: PgPool, exclude_schemas: Vec<String>) -> Self {
        Self {
            pool,
            exclude_schemas,
        }
    }

    async fn execute(&self, sql: &str) -> DbResult<()> {
        sqlx::query(sql).execute(&self.pool).await?;
        Ok(())
    }

    /// The database this session is connected to; REVOKE ... ON DATABASE
    /// needs it by name.
    async fn current_database(&self) -> DbResult<String> {
        let row = sqlx::query("SELECT current_database()::text AS db")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("db"))
    }
}

/// Quote an identifier for splicing into DDL, doubling embedded quotes.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Treat "object does not exist" as success: the principal raced with an
/// external deletion.
fn tolerate_gone(result: DbResult<()>) -> DbResult<()> {
    match result {
        Err(e) if e.is_undefined_object() => Ok(()),
        other => other,
    }
}

#[async_trait]
impl PrincipalRepo for PostgresPrincipalRepo {
    async fn principals_matching(&self, pattern: &str) -> DbResult<Vec<CredentialPrincipal>> {
        let rows = sqlx::query(
            r#"
            SELECT rolname::text AS name, rolvaliduntil AS valid_until
            FROM pg_catalog.pg_roles
            WHERE rolname LIKE $1
            ORDER BY rolname
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| CredentialPrincipal {
                name: row.get("name"),
                valid_until: row.get("valid_until"),
            })
            .collect())
    }

    async fn granted_roles(&self, principal: &str) -> DbResult<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT g.rolname::text AS name
            FROM pg_catalog.pg_auth_members m
            JOIN pg_catalog.pg_roles g ON g.oid = m.roleid
            JOIN pg_catalog.pg_roles mem ON mem.oid = m.member
            WHERE mem.rolname = $1
            ORDER BY g.rolname
            "#,
        )
        .bind(principal)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| row.get("name")).collect())
    }

    async fn member_roles(&self, principal: &str) -> DbResult<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT mem.rolname::text AS name
            FROM pg_catalog.pg_auth_members m
            JOIN pg_catalog.pg_roles g ON g.oid = m.roleid
            JOIN pg_catalog.pg_roles mem ON mem.oid = m.member
            WHERE g.rolname = $1
            ORDER BY mem.rolname
            "#,
        )
        .bind(principal)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| row.get("name")).collect())
    }

    async fn revoke_membership(&self, role: &str, member: &str) -> DbResult<()> {
        let sql = format!(
            "REVOKE {} FROM {}",
            quote_ident(role),
            quote_ident(member)
        );
        tolerate_gone(self.execute(&sql).await)
    }

    async fn default_acl_entries(&self, principal: &str) -> DbResult<Vec<DefaultAclEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT
                   pg_get_userbyid(d.defaclrole)::text AS granting_role,
                   n.nspname::text AS schema_name,
                   d.defaclobjtype::text AS kind_code
            FROM pg_catalog.pg_default_acl d
            LEFT JOIN pg_catalog.pg_namespace n ON n.oid = d.defaclnamespace
            CROSS JOIN LATERAL aclexplode(d.defaclacl) AS a
            WHERE a.grantee = (
                SELECT oid FROM pg_catalog.pg_roles WHERE rolname = $1
            )
            "#,
        )
        .bind(principal)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let code: String = row.get("kind_code");
                let kind = code
                    .chars()
                    .next()
                    .ok_or_else(|| DbError::Internal("empty default-ACL kind code".into()))
                    .and_then(|c| AclObjectKind::try_from(c).map_err(DbError::Internal))?;
                Ok(DefaultAclEntry {
                    granting_role: row.get("granting_role"),
                    schema: row.get("schema_name"),
                    kind,
                })
            })
            .collect()
    }

    async fn revoke_default_acl(&self, entry: &DefaultAclEntry, principal: &str) -> DbResult<()> {
        let scope = match &entry.schema {
            Some(schema) => format!(" IN SCHEMA {}", quote_ident(schema)),
            None => String::new(),
        };
        let sql = format!(
            "ALTER DEFAULT PRIVILEGES FOR ROLE {}{} REVOKE ALL ON {} FROM {}",
            quote_ident(&entry.granting_role),
            scope,
            entry.kind.revoke_keyword(),
            quote_ident(principal)
        );
        tolerate_gone(self.execute(&sql).await)
    }

    async fn revoke_database_privileges(&self, principal: &str) -> DbResult<()> {
        let database = self.current_database().await?;
        let sql = format!(
            "REVOKE ALL PRIVILEGES ON DATABASE {} FROM {}",
            quote_ident(&database),
            quote_ident(principal)
        );
        tolerate_gone(self.execute(&sql).await)
    }

    async fn user_schemas(&self) -> DbResult<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT nspname::text AS name
            FROM pg_catalog.pg_namespace
            WHERE nspname <> 'information_schema'
              AND nspname NOT LIKE 'pg\_%'
              AND NOT (nspname = ANY($1))
            ORDER BY nspname
            "#,
        )
        .bind(&self.exclude_schemas)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| row.get("name")).collect())
    }

    async fn revoke_schema_privileges(&self, schema: &str, principal: &str) -> DbResult<()> {
        let schema = quote_ident(schema);
        let principal = quote_ident(principal);

        // Usage first, then the object classes inside the schema.
        let statements = [
            format!("REVOKE USAGE ON SCHEMA {schema} FROM {principal}"),
            format!("REVOKE ALL ON ALL TABLES IN SCHEMA {schema} FROM {principal}"),
            format!("REVOKE ALL ON ALL SEQUENCES IN SCHEMA {schema} FROM {principal}"),
            format!("REVOKE ALL ON ALL FUNCTIONS IN SCHEMA {schema} FROM {principal}"),
        ];
        for sql in &statements {
            tolerate_gone(self.execute(sql).await)?;
        }
        Ok(())
    }

    async fn reassign_owned(&self, principal: &str, custodian: &str) -> DbResult<()> {
        let sql = format!(
            "REASSIGN OWNED BY {} TO {}",
            quote_ident(principal),
            quote_ident(custodian)
        );
        tolerate_gone(self.execute(&sql).await)
    }

    async fn drop_owned(&self, principal: &str) -> DbResult<()> {
        let sql = format!("DROP OWNED BY {}", quote_ident(principal));
        tolerate_gone(self.execute(&sql).await)
    }

    async fn drop_principal(&self, principal: &str) -> DbResult<()> {
        let sql = format!("DROP ROLE IF EXISTS {}", quote_ident(principal));
        self.execute(&sql).await
    }
}
