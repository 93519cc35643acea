use super::result::CommandResult;
use thiserror::Error;
use tracing::warn;

/// The success tier a pipeline step requires from an engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessTier {
    Full,
    Partial,
}

impl std::fmt::Display for SuccessTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuccessTier::Full => write!(f, "full"),
            SuccessTier::Partial => write!(f, "partial"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct AssertionError {
    pub required: SuccessTier,
    pub message: String,
    pub engine_errors: Vec<String>,
}

/// Fails unless `result` reports full success.
///
/// # Errors
///
/// Returns an [`AssertionError`] carrying `message` when `full_success` is false. The
/// engine's own error strings are logged and kept on the error for diagnostics.
pub fn assert_full_success<'a>(
    result: &'a CommandResult,
    message: impl Into<String>,
) -> Result<&'a CommandResult, AssertionError> {
    check(result, SuccessTier::Full, message.into())
}

/// Fails unless `result` reports at least partial success.
///
/// # Errors
///
/// Returns an [`AssertionError`] carrying `message` when `partial_success` is false.
pub fn assert_partial_success<'a>(
    result: &'a CommandResult,
    message: impl Into<String>,
) -> Result<&'a CommandResult, AssertionError> {
    check(result, SuccessTier::Partial, message.into())
}

fn check(
    result: &CommandResult,
    required: SuccessTier,
    message: String,
) -> Result<&CommandResult, AssertionError> {
    let satisfied = match required {
        SuccessTier::Full => result.is_full_success(),
        SuccessTier::Partial => result.is_partial_success(),
    };
    if satisfied {
        return Ok(result);
    }

    let engine_errors: Vec<String> = result.errors().into_iter().map(String::from).collect();
    warn!(
        tier = %required,
        engine_errors = ?engine_errors,
        "Engine call did not reach the required success tier: {}",
        message
    );
    Err(AssertionError {
        required,
        message,
        engine_errors,
    })
}
