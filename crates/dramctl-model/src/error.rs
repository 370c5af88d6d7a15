//! Error types for the configuration and port model.

use std::path::PathBuf;

/// Errors that can occur while building or inspecting the controller model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A user-supplied configuration value is outside its declared domain.
    #[error("invalid {field}: {reason}, not {value}")]
    Configuration {
        /// Name of the offending field.
        field: &'static str,
        /// The offending value, as written by the user.
        value: String,
        /// What the field accepts.
        reason: String,
    },

    /// An external collaborator returned data that contradicts the request.
    #[error("internal inconsistency: {detail}")]
    InternalInconsistency {
        /// Description of the mismatch.
        detail: String,
    },

    /// A memory map does not have the shape required by the port it is attached to.
    #[error("dimension mismatch: {detail}")]
    DimensionMismatch {
        /// Description of the mismatch.
        detail: String,
    },

    /// An interface was accessed before the step that populates it.
    #[error("{what} is not ready: {detail}")]
    NotReady {
        /// The interface being accessed.
        what: String,
        /// How to make it ready.
        detail: String,
    },

    /// A port already owns a memory map.
    #[error("{port} already has a memory map attached")]
    MapAlreadyAttached {
        /// The port that owns the map.
        port: String,
    },

    /// A resource cannot be placed in a memory map.
    #[error("cannot add resource '{resource}': {detail}")]
    ResourceConflict {
        /// The resource being added.
        resource: String,
        /// Why it was rejected.
        detail: String,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error reading configuration files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    /// Shorthand for a [`ModelError::Configuration`] error.
    pub fn config(
        field: &'static str,
        value: impl std::fmt::Debug,
        reason: impl Into<String>,
    ) -> Self {
        ModelError::Configuration {
            field,
            value: format!("{value:?}"),
            reason: reason.into(),
        }
    }
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
