//! Build orchestration errors.

use std::path::PathBuf;

use dramctl_model::ModelError;
use thiserror::Error;

/// Errors that can occur while preparing, executing, or consuming a core build.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(
        "core name '{name}' has already been used for a previous build; building this instance \
         may overwrite previous build products (pass name_force to disable this check)"
    )]
    NameConflict { name: String },

    #[error("{message} (at {origin}:{line})")]
    TemplateSyntax {
        origin: String,
        line: usize,
        message: String,
    },

    #[error("malformed register listing {listing} at line {line} ({row:?}): {detail}")]
    CsrParse {
        listing: String,
        line: usize,
        row: String,
        detail: String,
    },

    #[error("build script {script} failed ({status}):\n{output}")]
    BuildExecution {
        script: String,
        status: String,
        output: String,
    },

    #[error("invalid build artifact path '{path}': {reason}")]
    InvalidArtifactPath { path: String, reason: String },

    #[error("build artifact '{filename}' not found under {}", root.display())]
    MissingArtifact { filename: String, root: PathBuf },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;
