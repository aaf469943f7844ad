//! Error mapping from data source errors to GraphQL errors.

use {
    async_graphql::ErrorExtensions,
    storefront_store::Error,
    tracing::warn,
};

pub const NOT_FOUND: &str = "NOT_FOUND";
pub const VALIDATION: &str = "VALIDATION";
pub const ADAPTER: &str = "ADAPTER";

/// Extension `code` reported to clients for a store error.
pub fn error_code(err: &Error) -> &'static str {
    match err {
        Error::NotFound { .. } => NOT_FOUND,
        Error::Validation { .. } => VALIDATION,
        Error::Adapter { .. } | Error::Connect(_) | Error::Migration(_) => ADAPTER,
    }
}

/// Convert a store error into an `async_graphql::Error` carrying an
/// extension `code`. Adapter failures are logged since the client only sees
/// the message.
pub fn store_err(err: Error) -> async_graphql::Error {
    let code = error_code(&err);
    if code == ADAPTER {
        warn!(error = %err, "data source call failed");
    }
    async_graphql::Error::new(err.to_string()).extend_with(|_, ext| ext.set("code", code))
}

/// Shorthand for a validation failure raised inside the resolution layer.
pub fn validation_err(field: &'static str, message: impl Into<String>) -> async_graphql::Error {
    store_err(Error::validation(field, message))
}
