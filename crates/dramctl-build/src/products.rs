//! Access to the artifacts left behind by an executed build.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{BuildError, Result};
use crate::plan::validate_relative_path;

/// A bundle of named build artifacts.
pub trait BuildProducts {
    /// Read the artifact `filename` as UTF-8 text.
    fn get_text(&self, filename: &str) -> Result<String>;
}

/// Build products stored in a local directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalBuildProducts {
    root: PathBuf,
}

impl LocalBuildProducts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BuildProducts for LocalBuildProducts {
    fn get_text(&self, filename: &str) -> Result<String> {
        validate_relative_path(filename)?;
        let path = self.root.join(filename);
        std::fs::read_to_string(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => BuildError::MissingArtifact {
                filename: filename.to_string(),
                root: self.root.clone(),
            },
            _ => BuildError::Io { path, source },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_existing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("top_csr.csv"), "a,b,0,1,rw\n").unwrap();
        let products = LocalBuildProducts::new(dir.path());
        assert_eq!(products.get_text("top_csr.csv").unwrap(), "a,b,0,1,rw\n");
    }

    #[test]
    fn missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let products = LocalBuildProducts::new(dir.path());
        let err = products.get_text("nope.csv").unwrap_err();
        assert!(matches!(
            err,
            BuildError::MissingArtifact { ref filename, .. } if filename == "nope.csv"
        ));
    }

    #[test]
    fn refuses_paths_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let products = LocalBuildProducts::new(dir.path());
        assert!(matches!(
            products.get_text("../secret"),
            Err(BuildError::InvalidArtifactPath { .. })
        ));
    }
}
