//! Database-specific error types and conversions.

use foriam_core::error::IamError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Statement rejected: {0}")]
    Statement(String),

    #[error("Unique index `{index}` violated")]
    Conflict { index: String },

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Malformed record: {0}")]
    Decode(String),
}

impl DbError {
    /// Classify an error surfaced by `Response::check`.
    ///
    /// SurrealDB reports unique index violations as
    /// ``Database index `idx_name` already contains ...``; those become
    /// [`DbError::Conflict`] so callers can map them to a duplicate kind.
    pub(crate) fn from_check(err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        match unique_violation_index(&msg) {
            Some(index) => DbError::Conflict { index },
            None => DbError::Statement(msg),
        }
    }

    /// Map a unique-index violation to a caller-facing duplicate error,
    /// converting everything else the usual way.
    pub(crate) fn or_duplicate(self, duplicate: impl FnOnce() -> IamError) -> IamError {
        match self {
            DbError::Conflict { .. } => duplicate(),
            other => other.into(),
        }
    }

    pub(crate) fn is_conflict(&self) -> bool {
        matches!(self, DbError::Conflict { .. })
    }
}

fn unique_violation_index(msg: &str) -> Option<String> {
    if !msg.contains("already contains") {
        return None;
    }
    let start = msg.find("index `")? + "index `".len();
    let len = msg[start..].find('`')?;
    Some(msg[start..start + len].to_string())
}

impl From<DbError> for IamError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => IamError::NotFound { entity, id },
            DbError::Decode(msg) => IamError::Internal(msg),
            DbError::Conflict { index } => {
                IamError::Internal(format!("unhandled unique violation on {index}"))
            }
            other => IamError::StoreUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_index_name_from_violation() {
        let msg = "Database index `idx_user_email` already contains 'a@acme.io', \
                   with record `user:abc`";
        assert_eq!(unique_violation_index(msg).as_deref(), Some("idx_user_email"));
    }

    #[test]
    fn other_errors_are_not_conflicts() {
        assert_eq!(unique_violation_index("Found NONE for field `name`"), None);
    }

    #[test]
    fn not_found_maps_to_core_not_found() {
        let err: IamError = DbError::NotFound {
            entity: "role".into(),
            id: "x".into(),
        }
        .into();
        assert!(matches!(err, IamError::NotFound { .. }));
    }

    #[test]
    fn statement_errors_map_to_store_unavailable() {
        let err: IamError = DbError::Statement("boom".into()).into();
        assert!(matches!(err, IamError::StoreUnavailable(_)));
    }
}
