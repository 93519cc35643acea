//! An in-memory [`Engine`] for exercising pipelines without an engine process.

use super::command::EngineCommand;
use super::error::EngineError;
use super::session::Engine;
use crate::core::result::CommandResult;
use serde_json::json;
use std::collections::{HashMap, VecDeque};

type Handler = Box<dyn FnMut(&EngineCommand) -> CommandResult>;

/// Records every command and replies from a script keyed by operation name.
///
/// Lookup order per command: queued one-shot replies, then a handler, then a fixed reply,
/// and finally a fully successful empty reply.
#[derive(Default)]
pub struct ScriptedEngine {
    pub commands: Vec<EngineCommand>,
    once: HashMap<&'static str, VecDeque<CommandResult>>,
    handlers: HashMap<&'static str, Handler>,
    fixed: HashMap<&'static str, CommandResult>,
    failures: HashMap<&'static str, String>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replies with `result` to every command named `name`.
    pub fn respond(&mut self, name: &'static str, result: CommandResult) -> &mut Self {
        self.fixed.insert(name, result);
        self
    }

    /// Queues `result` for the next command named `name` only.
    pub fn respond_once(&mut self, name: &'static str, result: CommandResult) -> &mut Self {
        self.once.entry(name).or_default().push_back(result);
        self
    }

    /// Computes replies for `name` from the command itself, e.g. to write exported files.
    pub fn handle<F>(&mut self, name: &'static str, handler: F) -> &mut Self
    where
        F: FnMut(&EngineCommand) -> CommandResult + 'static,
    {
        self.handlers.insert(name, Box::new(handler));
        self
    }

    /// Makes `name` fail at the transport level, as if the engine process had died.
    pub fn fail_with(&mut self, name: &'static str, status: &str) -> &mut Self {
        self.failures.insert(name, status.to_string());
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.commands.iter().map(EngineCommand::name).collect()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.commands
            .iter()
            .map(EngineCommand::to_command_line)
            .collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.commands.iter().filter(|c| c.name() == name).count()
    }
}

impl Engine for ScriptedEngine {
    fn execute(&mut self, command: &EngineCommand) -> Result<CommandResult, EngineError> {
        let name = command.name();
        if let Some(status) = self.failures.get(name) {
            return Err(EngineError::Terminated {
                status: status.clone(),
            });
        }
        self.commands.push(command.clone());

        if let Some(result) = self.once.get_mut(name).and_then(VecDeque::pop_front) {
            return Ok(result);
        }
        if let Some(handler) = self.handlers.get_mut(name) {
            return Ok(handler(command));
        }
        Ok(self
            .fixed
            .get(name)
            .cloned()
            .unwrap_or_else(|| CommandResult::success(json!({}))))
    }
}

/// A listing reply naming `names`, as returned by `list-objects`.
pub fn objects_reply(names: &[&str]) -> CommandResult {
    let objects: Vec<_> = names.iter().map(|n| json!({ "name": n })).collect();
    CommandResult::success(json!({ "objects": objects }))
}
