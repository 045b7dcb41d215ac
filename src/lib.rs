//! # Modelreg - Model Registry Data Layer
//!
//! SQLite-backed bookkeeping for a model-serving API.
//!
//! Modelreg provides:
//! - A relational registry of roles, users, tasks, models, model versions,
//!   events and a per-user activity log
//! - Idempotent "add if absent" operations that report whether they created
//!   anything
//! - Joined point lookups for users and model versions
//! - Typed per-operation requests and a thin JSON HTTP surface

pub mod entity;
pub mod storage;
pub mod request;
pub mod server;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use entity::{AddResult, EntityKind, ModelView, Outcome, RegistryStats, UserView};
pub use request::{dispatch, Request, Response};
pub use storage::RegistryStore;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for registry operations
///
/// "Already exists" is not an error; see [`Outcome::AlreadyExists`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} {name} does not exist")]
    NotFound { kind: EntityKind, name: String },

    #[error("model {model} does not have version {version}")]
    VersionNotFound { model: String, version: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Registry connection lock poisoned")]
    Lock,
}

impl Error {
    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        Error::NotFound { kind, name: name.into() }
    }

    /// True for any missing-prerequisite or missing-lookup failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. } | Error::VersionNotFound { .. })
    }

    /// True when the backing dataset failed to complete the operation
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Io(_) | Error::Lock)
    }

    /// Stable machine-readable error kind
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::VersionNotFound { .. } => "version_not_found",
            Error::InvalidRequest(_) => "invalid_request",
            Error::Storage(_) | Error::Io(_) | Error::Lock => "storage",
        }
    }
}
