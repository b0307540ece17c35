//! Mapping from sqlx errors to store errors.

use domain::services::StoreError;

/// PostgreSQL `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Classifies a sqlx error for the domain layer.
pub fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                StoreError::AlreadyExists
            } else {
                StoreError::Query(db_err.to_string())
            }
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_unavailable() {
        assert!(store_error(sqlx::Error::PoolTimedOut).is_unavailable());
        assert!(store_error(sqlx::Error::PoolClosed).is_unavailable());
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(store_error(sqlx::Error::Io(io)).is_unavailable());
    }

    #[test]
    fn test_other_errors_are_query_failures() {
        assert!(matches!(
            store_error(sqlx::Error::RowNotFound),
            StoreError::Query(_)
        ));
        assert!(matches!(
            store_error(sqlx::Error::Protocol("bad message".to_string())),
            StoreError::Query(_)
        ));
    }
}
