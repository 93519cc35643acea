use std::ffi::OsString;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("No '{program}' executable")]
    NotFound { program: String },

    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' did not finish within {seconds} s and was killed")]
    TimedOut { program: String, seconds: u64 },

    #[error("I/O error while running '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// One external program invocation. Arguments are passed verbatim, never through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<OsString>,
    /// When set, standard output is written to this file instead of being captured.
    pub stdout_path: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdout_path: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout_path = Some(path.into());
        self
    }

    /// A human-readable rendering for logs and error messages.
    pub fn display(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.args {
            out.push(' ');
            out.push_str(&arg.to_string_lossy());
        }
        if let Some(path) = &self.stdout_path {
            out.push_str(" > ");
            out.push_str(&path.to_string_lossy());
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was ended by a signal.
    pub exit_status: Option<i32>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_status == Some(0)
    }
}

/// Runs external executables.
///
/// A non-zero exit is reported in [`ToolOutput::exit_status`], not as an error: some tools
/// exit non-zero after producing usable output, so the caller decides what counts as failure.
pub trait ToolRunner {
    fn is_available(&self, program: &str) -> bool;

    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError>;
}

/// Runs tools as blocking child processes on the host system.
#[derive(Debug, Clone, Default)]
pub struct SystemToolRunner {
    /// Hard limit per run; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl SystemToolRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn wait(&self, child: &mut Child, program: &str) -> Result<ExitStatus, ToolError> {
        let io_err = |source| ToolError::Io {
            program: program.to_string(),
            source,
        };
        let Some(timeout) = self.timeout else {
            return child.wait().map_err(io_err);
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait().map_err(io_err)? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                if let Err(e) = child.kill() {
                    warn!(program, error = %e, "Failed to kill timed-out tool.");
                }
                let _ = child.wait();
                return Err(ToolError::TimedOut {
                    program: program.to_string(),
                    seconds: timeout.as_secs(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

impl ToolRunner for SystemToolRunner {
    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError> {
        let program = command.program.as_str();
        debug!(command = %command.display(), "Running external tool.");

        let stdout = match &command.stdout_path {
            Some(path) => Stdio::from(File::create(path).map_err(|source| ToolError::Io {
                program: program.to_string(),
                source,
            })?),
            None => Stdio::piped(),
        };

        let mut child = Command::new(program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::NotFound => ToolError::NotFound {
                    program: program.to_string(),
                },
                _ => ToolError::Launch {
                    program: program.to_string(),
                    source,
                },
            })?;

        // Pipes are drained on their own threads so a chatty tool cannot block on a full pipe.
        let stdout_reader = drain(child.stdout.take());
        let stderr_reader = drain(child.stderr.take());

        let status = self.wait(&mut child, program)?;
        let output = ToolOutput {
            stdout: stdout_reader.join().unwrap_or_default(),
            stderr: stderr_reader.join().unwrap_or_default(),
            exit_status: status.code(),
        };
        debug!(program, exit_status = ?output.exit_status, "External tool finished.");
        Ok(output)
    }
}

/// Whether `path` is an existing regular file with at least one byte.
pub fn is_nonempty_file(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}
