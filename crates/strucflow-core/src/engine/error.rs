use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to start analysis engine '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Analysis engine terminated unexpectedly ({status})")]
    Terminated { status: String },

    #[error("Malformed engine reply to '{command}': {message}")]
    Protocol { command: &'static str, message: String },

    #[error("Command '{command}' cannot be sent to the engine: {reason}")]
    InvalidCommand {
        command: &'static str,
        reason: &'static str,
    },
}
