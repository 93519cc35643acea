pub mod animate;
pub mod casp_qa;
pub mod fetch;
pub mod tmalign;

use crate::config::AppConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use strucflow::engine::process::ProcessEngine;
use strucflow::engine::progress::ProgressReporter;
use strucflow::engine::session::Session;
use strucflow::tools::Toolbox;
use strucflow::tools::invoker::SystemToolRunner;
use tracing::info;

/// Starts the configured analysis engine and wraps it in a fresh session.
pub fn open_session(config: &AppConfig) -> Result<Session<ProcessEngine>> {
    info!(program = %config.engine.program, "Starting analysis engine...");
    let engine = ProcessEngine::spawn(&config.engine.program, &config.engine.args)?;
    Ok(Session::new(engine))
}

pub fn toolbox(config: &AppConfig) -> Toolbox<SystemToolRunner> {
    let toolbox = Toolbox::new(
        SystemToolRunner::new(config.tool_timeout),
        config.tools.clone(),
    );
    match &config.workspace_root {
        Some(root) => toolbox.with_workspace_root(root),
        None => toolbox,
    }
}

pub fn reporter(handler: &CliProgressHandler) -> ProgressReporter<'static> {
    ProgressReporter::with_callback(handler.get_callback())
}
