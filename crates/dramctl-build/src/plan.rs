//! Build plans and their local execution.
//!
//! A [`BuildPlan`] is a set of text files plus the name of a shell script among
//! them. Executing it locally writes every file under a root directory and then
//! runs the script there through a [`ScriptRunner`].

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use sha2::{Digest, Sha256};

use crate::error::{BuildError, Result};
use crate::products::LocalBuildProducts;

/// Runs a build script that has been written into a directory.
pub trait ScriptRunner {
    /// Run `{script}.sh` with `root` as the working directory.
    fn run(&self, root: &Path, script: &str) -> Result<()>;
}

/// Runs scripts with the system `sh`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl ScriptRunner for ShellRunner {
    fn run(&self, root: &Path, script: &str) -> Result<()> {
        let script_file = format!("{script}.sh");
        let output = Command::new("sh")
            .arg(&script_file)
            .current_dir(root)
            .output()
            .map_err(|source| BuildError::Io {
                path: root.join(&script_file),
                source,
            })?;

        if !output.status.success() {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(BuildError::BuildExecution {
                script: script_file,
                status: output.status.to_string(),
                output: text,
            });
        }
        Ok(())
    }
}

/// Check that `path` is a non-empty relative path that stays inside its root.
pub(crate) fn validate_relative_path(path: &str) -> Result<()> {
    let invalid = |reason: &str| BuildError::InvalidArtifactPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };
    if path.is_empty() {
        return Err(invalid("path is empty"));
    }
    for component in Path::new(path).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err(invalid("path must not contain '..'")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("path must be relative"))
            }
        }
    }
    Ok(())
}

/// Files to write and the script that builds them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    script: String,
    files: BTreeMap<String, String>,
}

impl BuildPlan {
    /// Create an empty plan whose entry point is `{script}.sh`.
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            files: BTreeMap::new(),
        }
    }

    /// Base name of the build script, without the `.sh` extension.
    pub fn script(&self) -> &str {
        &self.script
    }

    /// Add a file at the relative `path`. Each path may be added once.
    pub fn add_file(&mut self, path: impl Into<String>, content: impl Into<String>) -> Result<()> {
        let path = path.into();
        validate_relative_path(&path)?;
        if self.files.contains_key(&path) {
            return Err(BuildError::InvalidArtifactPath {
                path,
                reason: "a file with this path is already part of the plan".into(),
            });
        }
        self.files.insert(path, content.into());
        Ok(())
    }

    /// Files in path order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    pub fn file(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// SHA-256 over every `(path, content)` pair in path order, as lowercase hex.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for (path, content) in &self.files {
            hasher.update(path.as_bytes());
            hasher.update([0u8]);
            hasher.update(content.as_bytes());
            hasher.update([0u8]);
        }
        hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Write every file under `root`, creating directories as needed and
    /// overwriting existing files.
    pub fn write_local(&self, root: &Path) -> Result<()> {
        let io = |path: PathBuf| move |source: std::io::Error| BuildError::Io { path, source };
        std::fs::create_dir_all(root).map_err(io(root.to_path_buf()))?;
        for (path, content) in &self.files {
            let target = root.join(path);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(io(parent.to_path_buf()))?;
            }
            std::fs::write(&target, content).map_err(io(target.clone()))?;
        }
        tracing::debug!(root = %root.display(), files = self.files.len(), "wrote build plan");
        Ok(())
    }

    /// Write the plan under `root` and run its script there.
    pub fn execute_local(
        &self,
        root: &Path,
        runner: &dyn ScriptRunner,
    ) -> Result<LocalBuildProducts> {
        self.write_local(root)?;
        tracing::info!(root = %root.display(), script = %self.script, "running build script");
        runner.run(root, &self.script)?;
        Ok(LocalBuildProducts::new(root))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<(PathBuf, String)>>,
    }

    impl ScriptRunner for Recorder {
        fn run(&self, root: &Path, script: &str) -> Result<()> {
            self.calls.borrow_mut().push((root.to_path_buf(), script.to_string()));
            Ok(())
        }
    }

    #[test]
    fn rejects_escaping_paths() {
        let mut plan = BuildPlan::new("build_top");
        for bad in ["", "/etc/passwd", "../up.txt", "a/../../b"] {
            let err = plan.add_file(bad, "x").unwrap_err();
            assert!(matches!(err, BuildError::InvalidArtifactPath { .. }), "{bad:?}");
        }
        plan.add_file("sub/dir/file.txt", "x").unwrap();
        plan.add_file("./top.yml", "x").unwrap();
    }

    #[test]
    fn rejects_duplicate_paths() {
        let mut plan = BuildPlan::new("build_top");
        plan.add_file("a.txt", "1").unwrap();
        assert!(plan.add_file("a.txt", "2").is_err());
        assert_eq!(plan.file("a.txt"), Some("1"));
    }

    #[test]
    fn digest_is_order_independent_and_content_sensitive() {
        let mut a = BuildPlan::new("s");
        a.add_file("x", "1").unwrap();
        a.add_file("y", "2").unwrap();
        let mut b = BuildPlan::new("s");
        b.add_file("y", "2").unwrap();
        b.add_file("x", "1").unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);

        let mut c = BuildPlan::new("s");
        c.add_file("x", "1").unwrap();
        c.add_file("y", "3").unwrap();
        assert_ne!(a.digest(), c.digest());
    }

    #[test]
    fn write_local_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("build");
        let mut plan = BuildPlan::new("s");
        plan.add_file("nested/file.txt", "hello").unwrap();
        plan.write_local(&root).unwrap();
        let text = std::fs::read_to_string(root.join("nested/file.txt")).unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn execute_local_runs_script_in_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut plan = BuildPlan::new("build_top");
        plan.add_file("build_top.sh", "true\n").unwrap();
        let runner = Recorder::default();
        let products = plan.execute_local(dir.path(), &runner).unwrap();
        assert_eq!(products.root(), dir.path());
        let calls = runner.calls.borrow();
        assert_eq!(calls.as_slice(), &[(dir.path().to_path_buf(), "build_top".to_string())]);
    }

    #[cfg(unix)]
    #[test]
    fn shell_runner_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut plan = BuildPlan::new("build_top");
        plan.add_file("build_top.sh", "echo broken >&2\nexit 3\n").unwrap();
        let err = plan.execute_local(dir.path(), &ShellRunner).unwrap_err();
        match err {
            BuildError::BuildExecution { script, output, .. } => {
                assert_eq!(script, "build_top.sh");
                assert!(output.contains("broken"));
            }
            other => panic!("expected a build execution error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn shell_runner_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let mut plan = BuildPlan::new("build_top");
        plan.add_file("build_top.sh", "set -e\necho ok > out.txt\n").unwrap();
        plan.execute_local(dir.path(), &ShellRunner).unwrap();
        assert!(dir.path().join("out.txt").exists());
    }
}
