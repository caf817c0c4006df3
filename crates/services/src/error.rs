//! Shared error types for the services crate.

use thiserror::Error;

use careplan_core::form::{FormStateError, SchemaError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by persistence gateways.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("persistence request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors raised while reading configuration values.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{key} must be true or false, got {raw:?}")]
    InvalidBool { key: &'static str, raw: String },
    #[error("{key} must be a whole number of milliseconds, got {raw:?}")]
    InvalidMillis { key: &'static str, raw: String },
    #[error("{key} is not a valid URL: {source}")]
    InvalidUrl {
        key: &'static str,
        #[source]
        source: url::ParseError,
    },
}

/// Errors emitted by `FormSession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FormSessionError {
    #[error("a save is already in progress")]
    SaveInProgress,
    #[error("form is not attached to an assignment")]
    Unassigned,
    #[error("form is {progress}% complete; export needs 100%")]
    Incomplete { progress: u8 },
    #[error("form state lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Form(#[from] careplan_core::Error),
    #[error(transparent)]
    State(#[from] FormStateError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
