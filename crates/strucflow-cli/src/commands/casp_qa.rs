use super::{open_session, reporter, toolbox};
use crate::cli::{CaspQaArgs, QaMethod};
use crate::config::AppConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use strucflow::tools::registry::Tool;
use strucflow::workflows::casp_qa::{CaspQaMethod, CaspQaParams, casp_qa};
use strucflow::workflows::error::PipelineError;
use tracing::info;

impl From<QaMethod> for CaspQaMethod {
    fn from(method: QaMethod) -> Self {
        match method {
            QaMethod::Dark => CaspQaMethod::VoromqaDark,
            QaMethod::Light => CaspQaMethod::VoromqaLight,
        }
    }
}

fn qa_params(args: CaspQaArgs) -> CaspQaParams {
    CaspQaParams {
        sequence_file: args.sequence,
        model_file: args.model,
        output_prefix: args.output_prefix,
        method: args.method.into(),
        rebuild_side_chains: args.rebuild_side_chains,
    }
}

pub fn run(args: CaspQaArgs, config: &AppConfig) -> Result<()> {
    let tools = toolbox(config);
    if args.rebuild_side_chains {
        tools.preflight(&[Tool::Scwrl]).map_err(PipelineError::from)?;
    }

    let params = qa_params(args);
    let mut session = open_session(config)?;
    let progress_handler = CliProgressHandler::new();
    let reporter = reporter(&progress_handler);

    println!("Scoring model {}...", params.model_file.display());
    let outcome = casp_qa(&mut session, &tools, &params, &reporter)?;
    info!(
        model = %outcome.model_name,
        global_score = outcome.global_score,
        residues = outcome.sequence_length,
        "CASP QA finished."
    );

    println!(
        "✓ Global score {:.3} over {} residues",
        outcome.global_score, outcome.sequence_length
    );
    println!("  CASP QA line written to: {}", outcome.casp_line_path.display());
    println!("  Scored model written to: {}", outcome.scores_path.display());
    Ok(())
}
