//! External executables: how they are found, run and given scratch space.

pub mod invoker;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

use crate::workspace::{Workspace, with_workspace};
use invoker::{ToolCommand, ToolError, ToolOutput, ToolRunner};
use registry::{Tool, ToolPaths};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything a pipeline needs to call external tools: a runner, the configured
/// executables, and where scoped workspaces are created.
#[derive(Debug, Clone)]
pub struct Toolbox<R: ToolRunner> {
    runner: R,
    paths: ToolPaths,
    workspace_root: Option<PathBuf>,
}

impl<R: ToolRunner> Toolbox<R> {
    pub fn new(runner: R, paths: ToolPaths) -> Self {
        Self {
            runner,
            paths,
            workspace_root: None,
        }
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn paths(&self) -> &ToolPaths {
        &self.paths
    }

    pub fn workspace_root(&self) -> Option<&Path> {
        self.workspace_root.as_deref()
    }

    /// Resolves the executable configured for `tool`, failing if it cannot be found.
    pub fn require(&self, tool: Tool) -> Result<&str, ToolError> {
        let program = self.paths.get(tool);
        if self.runner.is_available(program) {
            Ok(program)
        } else {
            Err(ToolError::NotFound {
                program: program.to_string(),
            })
        }
    }

    /// Checks every tool in `tools`, reporting the first missing one.
    pub fn preflight(&self, tools: &[Tool]) -> Result<(), ToolError> {
        for &tool in tools {
            let program = self.require(tool)?;
            debug!(%tool, program, "External tool available.");
        }
        Ok(())
    }

    /// Starts a command line for `tool`; the executable is resolved by [`Toolbox::require`].
    pub fn command(&self, tool: Tool) -> Result<ToolCommand, ToolError> {
        self.require(tool).map(ToolCommand::new)
    }

    pub fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError> {
        self.runner.run(command)
    }

    /// Runs `body` in a fresh workspace under the configured root.
    pub fn scoped<T, E, F>(&self, prefix: &str, body: F) -> Result<T, E>
    where
        F: FnOnce(&Workspace) -> Result<T, E>,
        E: From<std::io::Error>,
    {
        with_workspace(self.workspace_root(), prefix, body)
    }
}
