//! Unified error type for the offline store.
//!
//! Every repository, writer and projection returns [`Result`]. Raw store failures
//! surface as [`Error::Database`]; the remaining variants carry enough context
//! (table, entity, id) for the caller to show a meaningful message.

use sea_orm::DbErr;
use thiserror::Error;

/// Errors raised by the offline store.
#[derive(Debug, Error)]
pub enum Error {
    /// Creating or dropping a table failed. Fatal at startup.
    #[error("Schema error on table {table}: {message}")]
    Schema {
        /// Table the statement targeted
        table: String,
        /// Underlying failure
        message: String,
    },

    /// The requested row does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind (e.g. `"walkin"`)
        entity: &'static str,
        /// Requested primary key
        id: i64,
    },

    /// A write completed without touching the expected rows.
    #[error("Failed to write {entity}: {message}")]
    Write {
        /// Entity kind being written
        entity: &'static str,
        /// What went wrong
        message: String,
    },

    /// A step inside a composite writer failed; the whole unit of work was rolled back.
    #[error("Failed to save {entity} aggregate{}: {source}", .id.map(|id| format!(" {id}")).unwrap_or_default())]
    AggregateWrite {
        /// Aggregate root kind (`"menu"`, `"walkin"`, `"order"`)
        entity: &'static str,
        /// Aggregate root id, when already known
        id: Option<i64>,
        /// The failing step
        #[source]
        source: Box<Error>,
    },

    /// Input rejected before reaching the store.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        message: String,
    },

    /// Settings could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Error reported by `SeaORM` / `SQLite`.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl Error {
    /// Wraps `self` as the failing step of a composite write.
    #[must_use]
    pub fn in_aggregate(self, entity: &'static str, id: Option<i64>) -> Self {
        Self::AggregateWrite {
            entity,
            id,
            source: Box::new(self),
        }
    }

    /// True when the error (or the step it wraps) is a missing row.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::AggregateWrite { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_message_includes_id_and_step() {
        let err = Error::NotFound {
            entity: "walkin",
            id: 7,
        }
        .in_aggregate("walkin", Some(7));

        assert_eq!(
            err.to_string(),
            "Failed to save walkin aggregate 7: walkin 7 not found"
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn test_aggregate_message_without_id() {
        let err = Error::Validation {
            field: "quantity",
            message: "must be positive".to_string(),
        }
        .in_aggregate("walkin", None);

        assert_eq!(
            err.to_string(),
            "Failed to save walkin aggregate: Invalid quantity: must be positive"
        );
        assert!(!err.is_not_found());
    }
}
