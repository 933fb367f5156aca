/// Error taxonomy for the data access layer
///
/// Repositories never recover or retry locally. Every driver failure is
/// wrapped together with the operation and the identifiers involved, so the
/// caller can log something actionable and map the kind to a response.
///
/// # Kinds
///
/// - `NotFound`: no row matched the id for the acting owner
/// - `BadRequest`: the caller supplied something the store cannot apply
///   (empty patch, dangling parent/category reference, tree cycle)
/// - `Query`: the underlying sqlx call failed

use uuid::Uuid;

/// Result alias used by every repository method
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Repository error
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Requested entity does not exist for the given owner
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. "service"
        entity: &'static str,
        /// Primary key that was looked up
        id: Uuid,
    },

    /// Caller-supplied input cannot be applied
    #[error("{0}")]
    BadRequest(String),

    /// Storage driver failure, annotated with the failing operation
    #[error("failed to {context}: {source}")]
    Query {
        /// Operation and identifiers, e.g. "update service id=.. user_id=.."
        context: String,
        #[source]
        source: sqlx::Error,
    },
}

impl RepositoryError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        RepositoryError::NotFound { entity, id }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        RepositoryError::BadRequest(message.into())
    }

    /// Returns the name of the violated unique constraint, if that is what failed
    pub fn unique_violation(&self) -> Option<&str> {
        match self {
            RepositoryError::Query {
                source: sqlx::Error::Database(db_err),
                ..
            } if db_err.is_unique_violation() => db_err.constraint(),
            _ => None,
        }
    }
}

/// Attaches operation context to a sqlx result
///
/// ```
/// use fixr_shared::error::{QueryContext, RepositoryError};
///
/// let result: Result<(), sqlx::Error> = Err(sqlx::Error::PoolTimedOut);
/// let err = result.context_with(|| "count services user_id=u1".to_string()).unwrap_err();
/// assert!(matches!(err, RepositoryError::Query { .. }));
/// ```
pub trait QueryContext<T> {
    fn context_with<F>(self, f: F) -> RepositoryResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> QueryContext<T> for Result<T, sqlx::Error> {
    fn context_with<F>(self, f: F) -> RepositoryResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|source| RepositoryError::Query {
            context: f(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let id = Uuid::nil();
        let err = RepositoryError::not_found("category", id);
        assert_eq!(
            err.to_string(),
            "category not found: 00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_query_context_wraps_source() {
        let result: Result<i64, sqlx::Error> = Err(sqlx::Error::RowNotFound);
        let err = result
            .context_with(|| "get service id=1 user_id=u1".to_string())
            .unwrap_err();

        assert!(err.to_string().starts_with("failed to get service id=1 user_id=u1"));
        assert!(err.unique_violation().is_none());
    }
}
