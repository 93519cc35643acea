//! Scoped scratch directories for pipelines that exchange files with external tools.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// A uniquely named temporary directory owned by one pipeline invocation.
///
/// The directory is removed by [`Workspace::cleanup`], or at the latest when the value is
/// dropped (which also covers unwinding from a panic).
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Creates a fresh directory named `<prefix><random>` under `root`, or under the
    /// system temporary directory when `root` is `None`.
    pub fn create(root: Option<&Path>, prefix: &str) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix);
        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        let path = dir.path().to_path_buf();
        debug!(path = %path.display(), "Created workspace.");
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file called `name` inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    pub fn is_cleaned_up(&self) -> bool {
        self.dir.is_none()
    }

    /// Removes the directory tree.
    ///
    /// Idempotent: calling it again, or after something else already deleted the
    /// directory, succeeds.
    pub fn cleanup(&mut self) -> io::Result<()> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };
        match dir.close() {
            Ok(()) => {
                debug!(path = %self.path.display(), "Removed workspace.");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Runs `body` inside a fresh workspace and removes the workspace afterwards.
///
/// Cleanup runs on every path out of `body`. If `body` fails, its error is returned
/// unchanged and a simultaneous cleanup failure is only logged; if `body` succeeds but the
/// directory cannot be removed, the cleanup error is returned.
pub fn with_workspace<T, E, F>(root: Option<&Path>, prefix: &str, body: F) -> Result<T, E>
where
    F: FnOnce(&Workspace) -> Result<T, E>,
    E: From<io::Error>,
{
    let mut workspace = Workspace::create(root, prefix)?;
    let outcome = body(&workspace);
    let cleaned = workspace.cleanup();

    match (outcome, cleaned) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(cleanup_error)) => {
            warn!(
                path = %workspace.path().display(),
                error = %cleanup_error,
                "Failed to remove workspace after a pipeline error."
            );
            Err(e)
        }
    }
}
