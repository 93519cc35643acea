use super::{open_session, reporter, toolbox};
use crate::cli::TmalignArgs;
use crate::config::AppConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use strucflow::tools::registry::Tool;
use strucflow::workflows::error::PipelineError;
use strucflow::workflows::tmalign::{AlignFilesParams, align_files};
use tracing::info;

fn align_params(args: TmalignArgs) -> AlignFilesParams {
    AlignFilesParams {
        target_file: args.target,
        model_file: args.model,
        output_file: args.output,
        target_selection: args.target_selection,
        model_selection: args.model_selection,
    }
}

pub fn run(args: TmalignArgs, config: &AppConfig) -> Result<()> {
    let tools = toolbox(config);
    tools
        .preflight(&[Tool::TmAlign])
        .map_err(PipelineError::from)?;

    let params = align_params(args);
    let mut session = open_session(config)?;
    let progress_handler = CliProgressHandler::new();
    let reporter = reporter(&progress_handler);

    println!("Aligning model onto target...");
    let outcome = align_files(&mut session, &tools, &params, &reporter)?;
    info!(tm_score = outcome.tm_score, "Alignment finished.");

    println!(
        "✓ TM-score {:.4}; aligned model written to: {}",
        outcome.tm_score,
        params.output_file.display()
    );
    Ok(())
}
