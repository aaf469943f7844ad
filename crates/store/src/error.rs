use crate::types::EntityKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} with {field} {key} does not exist")]
    NotFound {
        kind: EntityKind,
        field: &'static str,
        key: String,
    },
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("failed to {operation} {kind}: {source}")]
    Adapter {
        operation: &'static str,
        kind: EntityKind,
        #[source]
        source: sqlx::Error,
    },
    #[error(transparent)]
    Connect(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl Error {
    /// Lookup by primary key found nothing.
    #[must_use]
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            field: "id",
            key: id.into(),
        }
    }

    /// Lookup by a secondary unique field (e.g. email) found nothing.
    #[must_use]
    pub fn not_found_by(kind: EntityKind, field: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            field,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Returns a mapper wrapping a sqlx failure with the operation and entity kind.
    pub fn adapter(operation: &'static str, kind: EntityKind) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Adapter {
            operation,
            kind,
            source,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_missing_identifier() {
        let err = Error::not_found(EntityKind::Post, "abc");
        assert_eq!(err.to_string(), "post with id abc does not exist");

        let err = Error::not_found_by(EntityKind::User, "email", "x@example.com");
        assert_eq!(err.to_string(), "user with email x@example.com does not exist");
        assert!(err.is_not_found());
    }

    #[test]
    fn adapter_error_carries_operation_and_kind() {
        let err = Error::adapter("insert", EntityKind::Product)(sqlx::Error::RowNotFound);
        let msg = err.to_string();
        assert!(msg.starts_with("failed to insert product:"), "{msg}");
        assert!(!err.is_not_found());
    }
}
