use super::error::PipelineError;
use super::side_chains::rebuild_side_chains_all;
use crate::core::assertions::{AssertionError, SuccessTier, assert_full_success, assert_partial_success};
use crate::core::io::adjuncts::read_residue_values;
use crate::core::io::casp::{CaspQaLine, DEFAULT_WRAP};
use crate::core::result::object_names;
use crate::engine::command::{
    AdjunctExpression, ExportOptions, ImportOptions, PoolingMode, ScoringMethod,
};
use crate::engine::progress::ProgressReporter;
use crate::engine::session::{Engine, Session};
use crate::tools::Toolbox;
use crate::tools::invoker::{ToolRunner, is_nonempty_file};
use crate::tools::registry::Tool;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Adjunct holding residue numbers of the reference sequence.
const REFERENCE_ADJUNCT: &str = "refseq";
/// Completeness below which the global score is scaled down.
const COMPLETENESS_THRESHOLD: f64 = 0.85;

/// Which VoroMQA flavour produces the local and global scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaspQaMethod {
    /// Neural-network VoroMQA (requires the classic scores as input).
    #[default]
    VoromqaDark,
    /// Classic VoroMQA with residue smoothing.
    VoromqaLight,
}

/// Adjunct names and parameters for one method's post-processing.
struct MethodPlan {
    /// Residue scores written into the B-factor column of the exported model.
    residue_adjunct: &'static str,
    /// Expected local distance errors reported in the CASP line.
    line_adjunct: &'static str,
    reverse_s: [f64; 5],
}

impl CaspQaMethod {
    fn plan(self) -> MethodPlan {
        match self {
            CaspQaMethod::VoromqaDark => MethodPlan {
                residue_adjunct: "vd1s",
                line_adjunct: "vd1sd",
                reverse_s: [0.5, 0.1, 0.5, 0.2, 3.0],
            },
            CaspQaMethod::VoromqaLight => MethodPlan {
                residue_adjunct: "vl1s",
                line_adjunct: "vl1sd",
                reverse_s: [0.3, 0.1, 0.5, 0.2, 3.0],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaspQaParams {
    pub sequence_file: PathBuf,
    pub model_file: PathBuf,
    /// Prepended verbatim to output file names, e.g. `results/T1000TS001_1_`.
    pub output_prefix: String,
    pub method: CaspQaMethod,
    pub rebuild_side_chains: bool,
}

impl CaspQaParams {
    fn output(&self, name: &str) -> PathBuf {
        PathBuf::from(format!("{}{}", self.output_prefix, name))
    }

    pub fn casp_line_path(&self) -> PathBuf {
        self.output("casp_qa_line")
    }

    pub fn scores_path(&self) -> PathBuf {
        self.output("scores.pdb")
    }

    pub fn alignment_path(&self) -> PathBuf {
        self.output("sequence_alignment")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaspQaOutcome {
    pub model_name: String,
    pub global_score: f64,
    pub sequence_length: usize,
    pub line: String,
    pub casp_line_path: PathBuf,
    pub scores_path: PathBuf,
}

fn missing_output(message: &str) -> PipelineError {
    PipelineError::Assertion(AssertionError {
        required: SuccessTier::Full,
        message: message.to_string(),
        engine_errors: Vec::new(),
    })
}

/// Loads the model, renumbers it against the target sequence and, optionally, rebuilds
/// its side chains. Returns the model object name and the target sequence length.
fn prepare_model<E: Engine, R: ToolRunner>(
    session: &mut Session<E>,
    tools: &Toolbox<R>,
    params: &CaspQaParams,
    reporter: &ProgressReporter,
) -> Result<(String, usize), PipelineError> {
    let probe = PathBuf::from(format!("{}_mock", params.output_prefix));
    if let Some(dir) = probe.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    session.delete_objects(&[])?;

    let imported = session.import(ImportOptions::pdb(&params.model_file))?;
    assert_partial_success(&imported, "Failed to import PDB file")?;

    let picked = session.list_objects(&[], true)?;
    assert_full_success(&picked, "Failed to import PDB file")?;
    let mut names = object_names(&picked);
    if names.len() != 1 {
        return Err(PipelineError::precondition("Not one object picked"));
    }
    let model_name = names.remove(0);

    let aligned = session.set_reference_sequence(
        REFERENCE_ADJUNCT,
        &params.sequence_file,
        Some(&params.alignment_path()),
    )?;
    assert_full_success(&aligned, "Failed to set residue sequence number adjunct")?;
    let sequence_length = aligned
        .output_field::<usize>("sequence_length")
        .ok_or_else(|| missing_output("Failed to determine target sequence length"))?;

    let renumbered = session.renumber_by_adjunct(REFERENCE_ADJUNCT)?;
    assert_full_success(&renumbered, "Failed to renumber residues by adjunct")?;

    if params.rebuild_side_chains {
        rebuild_side_chains_all(session, tools, reporter)?;
    }
    Ok((model_name, sequence_length))
}

/// Scores the loaded model and leaves per-residue adjuncts in place. Returns the global score.
fn score_model<E: Engine>(
    session: &mut Session<E>,
    method: CaspQaMethod,
) -> Result<f64, PipelineError> {
    let plan = method.plan();

    let contacts = session.construct_contacts()?;
    assert_full_success(&contacts, "Failed to construct contacts")?;

    let global_score = match method {
        CaspQaMethod::VoromqaDark => {
            let basic = session.compute_scores(ScoringMethod::VoromqaGlobal {
                residue_adjunct: None,
                smoothing_window: None,
            })?;
            assert_full_success(&basic, "Failed to calculate basic VoroMQA scores")?;

            let dark = session.compute_scores(ScoringMethod::VoromqaDarkGlobal)?;
            assert_full_success(&dark, "Failed to compute scores")?;
            let score = dark
                .output_field::<f64>("global_score")
                .ok_or_else(|| missing_output("Failed to compute global score"))?;

            let pooled =
                session.pool_residue_adjunct("vd1", plan.residue_adjunct, PoolingMode::Min, 3)?;
            assert_full_success(&pooled, "Failed to pool and smooth residue adjuncts")?;
            score
        }
        CaspQaMethod::VoromqaLight => {
            let light = session.compute_scores(ScoringMethod::VoromqaGlobal {
                residue_adjunct: Some(plan.residue_adjunct.to_string()),
                smoothing_window: Some(5),
            })?;
            assert_full_success(&light, "Failed to calculate basic VoroMQA scores")?;
            light
                .output_field::<f64>("quality_score")
                .ok_or_else(|| missing_output("Failed to compute global score"))?
        }
    };

    let transformed = session.transform_adjunct(
        AdjunctExpression::ReverseS {
            parameters: plan.reverse_s,
        },
        plan.residue_adjunct,
        plan.line_adjunct,
    )?;
    assert_full_success(&transformed, "Failed to transform adjuncts")?;
    Ok(global_score)
}

/// Produces a CASP QA submission line and a B-factor-annotated model for one model file.
///
/// Writes `<prefix>casp_qa_line`, `<prefix>scores.pdb` and the engine's
/// `<prefix>sequence_alignment`. The session is cleared first.
#[instrument(skip_all, name = "casp_qa_workflow", fields(method = ?params.method))]
pub fn casp_qa<E: Engine, R: ToolRunner>(
    session: &mut Session<E>,
    tools: &Toolbox<R>,
    params: &CaspQaParams,
    reporter: &ProgressReporter,
) -> Result<CaspQaOutcome, PipelineError> {
    if params.rebuild_side_chains {
        tools.require(Tool::Scwrl)?;
    }
    if params.output_prefix.is_empty() {
        return Err(PipelineError::precondition("No output prefix"));
    }
    if !is_nonempty_file(&params.sequence_file) {
        return Err(PipelineError::precondition(format!(
            "No target sequence file '{}'",
            params.sequence_file.display()
        )));
    }
    if !is_nonempty_file(&params.model_file) {
        return Err(PipelineError::precondition(format!(
            "No model file '{}'",
            params.model_file.display()
        )));
    }

    // === Phase 1: Model preparation ===
    let (model_name, sequence_length) = reporter.phase("Preparing model", || {
        prepare_model(session, tools, params, reporter)
    })?;

    // === Phase 2: Scoring ===
    let global_score = reporter.phase("Scoring", || score_model(session, params.method))?;
    info!(model = %model_name, global_score, sequence_length, "Model scored.");

    // === Phase 3: Output ===
    let plan = params.method.plan();
    let line = tools.scoped("strucflow-casp-", |ws| {
        let table = ws.file("adjuncts");
        let exported = session.export_atom_adjuncts(&table, &[plan.line_adjunct])?;
        assert_full_success(&exported, "Failed to output CASP QA line")?;

        let text = std::fs::read_to_string(&table)?;
        let values = read_residue_values(&text, plan.line_adjunct).map_err(|e| {
            missing_output(&format!("Failed to output CASP QA line: {e}"))
        })?;

        CaspQaLine::new(&model_name, global_score, sequence_length)
            .scale_by_completeness(COMPLETENESS_THRESHOLD)
            .wrap(DEFAULT_WRAP)
            .residue_scores(values)
            .render()
            .map_err(|e| missing_output(&format!("Failed to output CASP QA line: {e}")))
    })?;
    let casp_line_path = params.casp_line_path();
    std::fs::write(&casp_line_path, &line)?;

    let scores_path = params.scores_path();
    let exported =
        session.export_atoms(ExportOptions::pdb(&scores_path).b_factor(plan.residue_adjunct))?;
    assert_full_success(&exported, "Failed to export atoms")?;

    info!(output = %casp_line_path.display(), "CASP QA line written.");
    Ok(CaspQaOutcome {
        model_name,
        global_score,
        sequence_length,
        line,
        casp_line_path,
        scores_path,
    })
}
