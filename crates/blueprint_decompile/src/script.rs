//! Script externalization.
//!
//! `EXEC` scripts are written next to the decompiled source and referenced
//! by path. File names carry a random 8 hex digit suffix, so concurrent
//! decompilations into the same directory do not coordinate.

use blueprint_core::{BlueprintError, BlueprintResult, ScriptType};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Directory prefix of script paths embedded in source
pub const SCRIPT_PATH_PREFIX: &str = "specs";

/// Escape single quotes the way decompiled source expects
#[must_use]
pub fn escape_script(script: &str) -> String {
    script.replace('\'', "/'")
}

/// Destination of externalized scripts
pub trait ScriptSink {
    /// Write a script body, returning the path to embed in source
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::ScriptWriteFailure`] if the write fails
    fn write_script(&self, script_type: ScriptType, body: &str) -> BlueprintResult<String>;
}

/// Scripts written into a directory on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDir {
    root: PathBuf,
}

impl ScriptDir {
    /// Write scripts into `root`, creating it on first write
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory scripts are written to
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fresh file name for a script of the given type
    #[must_use]
    pub fn file_name(script_type: ScriptType) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("task_file_{}.{}", &suffix[..8], script_type.extension())
    }
}

impl ScriptSink for ScriptDir {
    fn write_script(&self, script_type: ScriptType, body: &str) -> BlueprintResult<String> {
        let file_name = Self::file_name(script_type);
        let path = self.root.join(&file_name);
        let failure = |err: std::io::Error| BlueprintError::ScriptWriteFailure {
            path: path.display().to_string(),
            reason: err.to_string(),
        };

        fs::create_dir_all(&self.root).map_err(failure)?;
        fs::write(&path, body).map_err(failure)?;

        debug!(path = %path.display(), bytes = body.len(), "wrote script");
        Ok(format!("{}/{}", SCRIPT_PATH_PREFIX, file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_script() {
        assert_eq!(escape_script("echo 'hi'"), "echo /'hi/'");
        assert_eq!(escape_script("echo hi"), "echo hi");
    }

    #[test]
    fn test_file_name_shape() {
        let name = ScriptDir::file_name(ScriptType::PowerShell);
        assert!(name.starts_with("task_file_"));
        assert!(name.ends_with(".ps1"));
        let suffix = &name["task_file_".len()..name.len() - ".ps1".len()];
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_write_script() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ScriptDir::new(dir.path());
        let embedded = sink.write_script(ScriptType::Shell, "echo /'hi/'").unwrap();
        assert!(embedded.starts_with("specs/task_file_"));
        assert!(embedded.ends_with(".sh"));

        let file = dir.path().join(embedded.trim_start_matches("specs/"));
        assert_eq!(fs::read_to_string(file).unwrap(), "echo /'hi/'");
    }

    #[test]
    fn test_write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ScriptDir::new(dir.path().join("scripts"));
        sink.write_script(ScriptType::Static, "print(1)").unwrap();
        assert_eq!(fs::read_dir(sink.root()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let sink = ScriptDir::new(blocker.join("nested"));
        let err = sink.write_script(ScriptType::Shell, "echo").unwrap_err();
        assert!(matches!(err, BlueprintError::ScriptWriteFailure { .. }));
        assert_eq!(err.class(), blueprint_core::ErrorClass::Io);
    }
}
