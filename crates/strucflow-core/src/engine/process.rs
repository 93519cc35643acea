use super::command::EngineCommand;
use super::error::EngineError;
use super::session::Engine;
use crate::core::result::CommandResult;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tracing::{debug, warn};

/// An analysis engine running as a child process.
///
/// The child reads one command line per stdin line and answers each with exactly one
/// JSON-encoded [`CommandResult`] on a single stdout line. Its stderr is inherited so engine
/// diagnostics reach the user's terminal.
pub struct ProcessEngine {
    program: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl ProcessEngine {
    pub fn spawn<S: AsRef<str>>(program: &str, args: &[S]) -> Result<Self, EngineError> {
        let mut child = Command::new(program)
            .args(args.iter().map(AsRef::as_ref))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().ok_or_else(|| EngineError::Spawn {
            program: program.to_string(),
            source: std::io::Error::other("child stdout was not captured"),
        })?;

        debug!(program, pid = child.id(), "Started analysis engine process.");
        Ok(Self {
            program: program.to_string(),
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn terminated(&mut self) -> EngineError {
        let status = match self.child.try_wait() {
            Ok(Some(status)) => status.to_string(),
            Ok(None) => "closed its output".to_string(),
            Err(e) => e.to_string(),
        };
        EngineError::Terminated { status }
    }

    fn send(&mut self, line: &str) -> Result<(), EngineError> {
        let stdin = self.stdin.as_mut().ok_or(EngineError::Terminated {
            status: "input already closed".to_string(),
        })?;
        let written = writeln!(stdin, "{line}").and_then(|()| stdin.flush());
        match written {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Err(self.terminated()),
            Err(e) => Err(EngineError::Io(e)),
        }
    }
}

impl Engine for ProcessEngine {
    fn execute(&mut self, command: &EngineCommand) -> Result<CommandResult, EngineError> {
        let line = command.to_command_line();
        if line.contains(['\n', '\r']) {
            return Err(EngineError::InvalidCommand {
                command: command.name(),
                reason: "arguments must not contain line breaks",
            });
        }

        self.send(&line)?;

        let mut reply = String::new();
        if self.stdout.read_line(&mut reply)? == 0 {
            return Err(self.terminated());
        }
        serde_json::from_str(reply.trim_end()).map_err(|e| EngineError::Protocol {
            command: command.name(),
            message: e.to_string(),
        })
    }
}

impl Drop for ProcessEngine {
    fn drop(&mut self) {
        // Closing stdin lets a well-behaved engine exit on its own before it is killed.
        drop(self.stdin.take());
        if let Ok(None) = self.child.try_wait() {
            if let Err(e) = self.child.kill() {
                warn!(program = %self.program, error = %e, "Failed to stop analysis engine.");
            }
        }
        let _ = self.child.wait();
    }
}
