//! An in-memory [`ToolRunner`] for exercising pipelines without installed tools.

use super::invoker::{ToolCommand, ToolError, ToolOutput, ToolRunner};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

type Handler = Box<dyn Fn(&ToolCommand) -> ToolOutput>;

/// Simulates tool availability and runs scripted handlers instead of processes.
///
/// Handlers may write files the real tool would produce. Captured stdout is written to the
/// command's `stdout_path` when one is set, as a shell redirect would.
#[derive(Default)]
pub struct ScriptedRunner {
    available: Option<HashSet<String>>,
    handlers: HashMap<String, Handler>,
    calls: RefCell<Vec<ToolCommand>>,
}

impl ScriptedRunner {
    /// Every program is available and exits successfully with no output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only `programs` are available.
    pub fn with_available(programs: &[&str]) -> Self {
        Self {
            available: Some(programs.iter().map(|p| p.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn on<F>(mut self, program: &str, handler: F) -> Self
    where
        F: Fn(&ToolCommand) -> ToolOutput + 'static,
    {
        self.handlers.insert(program.to_string(), Box::new(handler));
        self
    }

    pub fn calls(&self) -> Vec<ToolCommand> {
        self.calls.borrow().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.program.clone()).collect()
    }
}

impl ToolRunner for ScriptedRunner {
    fn is_available(&self, program: &str) -> bool {
        self.available
            .as_ref()
            .is_none_or(|set| set.contains(program))
    }

    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError> {
        self.calls.borrow_mut().push(command.clone());
        if !self.is_available(&command.program) {
            return Err(ToolError::NotFound {
                program: command.program.clone(),
            });
        }

        let mut output = match self.handlers.get(&command.program) {
            Some(handler) => handler(command),
            None => ToolOutput {
                exit_status: Some(0),
                ..ToolOutput::default()
            },
        };
        if let Some(path) = &command.stdout_path {
            std::fs::write(path, std::mem::take(&mut output.stdout)).map_err(|source| {
                ToolError::Io {
                    program: command.program.clone(),
                    source,
                }
            })?;
        }
        Ok(output)
    }
}

/// A successful run printing `stdout`.
pub fn exit_ok(stdout: &str) -> ToolOutput {
    ToolOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_status: Some(0),
    }
}

/// A failed run with the given exit status.
pub fn exit_with(status: i32, stderr: &str) -> ToolOutput {
    ToolOutput {
        stdout: String::new(),
        stderr: stderr.to_string(),
        exit_status: Some(status),
    }
}
