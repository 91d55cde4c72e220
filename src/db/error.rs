use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// SQLSTATE 42704: the object named in the statement no longer exists.
    ///
    /// Teardown races with external deletion, so several statements treat
    /// this as success.
    pub fn is_undefined_object(&self) -> bool {
        match self {
            DbError::Sqlx(sqlx::Error::Database(e)) => e.code().as_deref() == Some("42704"),
            _ => false,
        }
    }
}
