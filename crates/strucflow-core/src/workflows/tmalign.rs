use super::error::PipelineError;
use crate::core::assertions::{assert_full_success, assert_partial_success};
use crate::core::io::tmalign::{parse_matrix, parse_tm_score};
use crate::core::result::object_names;
use crate::core::selection::alpha_carbons_of;
use crate::core::transform::RigidTransform;
use crate::engine::command::{ExportOptions, ImportOptions};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::session::{Engine, Session};
use crate::tools::Toolbox;
use crate::tools::invoker::ToolRunner;
use crate::tools::registry::Tool;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

const TARGET_FILE: &str = "target.pdb";
const MODEL_FILE: &str = "model.pdb";
const MATRIX_FILE: &str = "matrix";
const REPORT_FILE: &str = "tmalign.out";
/// TMalign prints ten decimals; rounding keeps the matrix well within this.
const ROTATION_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, PartialEq)]
pub struct TmalignParams {
    pub target: String,
    pub model: String,
    /// Restricts the target atoms used for alignment; always intersected with alpha carbons.
    pub target_selection: Option<String>,
    pub model_selection: Option<String>,
}

impl TmalignParams {
    pub fn new(target: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            model: model.into(),
            target_selection: None,
            model_selection: None,
        }
    }

    pub fn target_selection(mut self, selection: Option<String>) -> Self {
        self.target_selection = selection;
        self
    }

    pub fn model_selection(mut self, selection: Option<String>) -> Self {
        self.model_selection = selection;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TmalignOutcome {
    pub model: String,
    /// TM-score normalized by the target length.
    pub tm_score: f64,
    /// The motion that was applied to the model.
    pub transform: RigidTransform,
}

/// Superimposes the model object onto the target object.
///
/// Both objects are exported (alpha carbons only) into a scoped workspace and aligned by
/// TMalign. The recovered rotation and translation are applied to every atom of the model,
/// and the view is zoomed onto the target selection.
///
/// # Errors
///
/// Fails before any workspace is created when TMalign is missing, the two names are equal,
/// an object does not exist, or a selection is empty. A missing score or matrix in the
/// aligner's output fails without moving the model.
#[instrument(skip_all, name = "tmalign_workflow", fields(target = %params.target, model = %params.model))]
pub fn tmalign<E: Engine, R: ToolRunner>(
    session: &mut Session<E>,
    tools: &Toolbox<R>,
    params: &TmalignParams,
    reporter: &ProgressReporter,
) -> Result<TmalignOutcome, PipelineError> {
    let program = tools.require(Tool::TmAlign)?;

    // === Phase 0: Preconditions ===
    if params.target == params.model {
        return Err(PipelineError::precondition(format!(
            "Target and model must be different objects, both are '{}'",
            params.target
        )));
    }
    let target_sel = alpha_carbons_of(params.target_selection.as_deref());
    let model_sel = alpha_carbons_of(params.model_selection.as_deref());

    if !session.list_objects(&[&params.target], false)?.is_full_success() {
        return Err(PipelineError::precondition(format!(
            "No target object '{}'",
            params.target
        )));
    }
    if !session.list_objects(&[&params.model], false)?.is_full_success() {
        return Err(PipelineError::precondition(format!(
            "No model object '{}'",
            params.model
        )));
    }
    if !session.select_atoms(&params.target, &target_sel)?.is_full_success() {
        return Err(PipelineError::precondition(format!(
            "No target atoms for selection '{target_sel}'"
        )));
    }
    if !session.select_atoms(&params.model, &model_sel)?.is_full_success() {
        return Err(PipelineError::precondition(format!(
            "No model atoms for selection '{model_sel}'"
        )));
    }

    // === Phase 1: Alignment in a scoped workspace ===
    reporter.report(Progress::PhaseStart { name: "Aligning" });
    let outcome = tools.scoped("strucflow-tmalign-", |ws| {
        let target_file = ws.file(TARGET_FILE);
        let model_file = ws.file(MODEL_FILE);
        let matrix_file = ws.file(MATRIX_FILE);
        let report_file = ws.file(REPORT_FILE);

        let exported = session.export_atoms(
            ExportOptions::pdb(&target_file)
                .on_object(&params.target)
                .selection(&target_sel),
        )?;
        assert_full_success(&exported, "Failed to export target atoms")?;
        let exported = session.export_atoms(
            ExportOptions::pdb(&model_file)
                .on_object(&params.model)
                .selection(&model_sel),
        )?;
        assert_full_success(&exported, "Failed to export model atoms")?;

        let command = tools
            .command(Tool::TmAlign)?
            .arg(&model_file)
            .arg(&target_file)
            .arg("-m")
            .arg(&matrix_file)
            .stdout_to(&report_file);
        let output = tools.run(&command)?;
        if !output.success() {
            warn!(
                exit_status = ?output.exit_status,
                stderr = %output.stderr.trim(),
                "{program} exited unsuccessfully; validating its output anyway."
            );
        }

        let report = std::fs::read_to_string(&report_file).unwrap_or_default();
        let tm_score = parse_tm_score(&report)
            .ok_or_else(|| PipelineError::tool_failure(program, "Invalid TMalign output"))?;

        let matrix = std::fs::read_to_string(&matrix_file).unwrap_or_default();
        let transform = parse_matrix(&matrix).map_err(|e| {
            warn!(error = %e, "Could not read the superposition matrix.");
            PipelineError::tool_failure(program, "Invalid TMalign matrix output")
        })?;
        if !transform.is_proper_rotation(ROTATION_TOLERANCE) {
            warn!("Superposition matrix is not a proper rotation; applying it as reported.");
        }

        let moved = session.move_atoms(&params.model, transform)?;
        assert_full_success(&moved, "Failed to move atoms")?;

        // Framing the view is cosmetic; a failed zoom does not undo the alignment.
        session.zoom_by_atoms(&params.target, &target_sel)?;

        Ok::<_, PipelineError>(TmalignOutcome {
            model: params.model.clone(),
            tm_score,
            transform,
        })
    });
    reporter.report(Progress::PhaseFinish);
    let outcome = outcome?;

    info!(tm_score = outcome.tm_score, "Model superimposed onto target.");
    Ok(outcome)
}

fn listed_objects<E: Engine>(session: &mut Session<E>) -> Result<Vec<String>, PipelineError> {
    let listed = session.list_objects(&[], false)?;
    if !listed.is_full_success() {
        return Err(PipelineError::precondition("No objects available"));
    }
    let names = object_names(&listed);
    if names.len() < 2 {
        return Err(PipelineError::precondition("Less than two objects available"));
    }
    Ok(names)
}

/// Aligns every other loaded object onto `target`.
#[instrument(skip_all, name = "tmalign_all_on_one_workflow", fields(target = %target))]
pub fn tmalign_all_on_one<E: Engine, R: ToolRunner>(
    session: &mut Session<E>,
    tools: &Toolbox<R>,
    target: &str,
    target_selection: Option<&str>,
    model_selection: Option<&str>,
    reporter: &ProgressReporter,
) -> Result<Vec<TmalignOutcome>, PipelineError> {
    tools.require(Tool::TmAlign)?;
    let names = listed_objects(session)?;

    let models: Vec<&String> = names.iter().filter(|n| n.as_str() != target).collect();
    reporter.report(Progress::TaskStart {
        total_steps: models.len() as u64,
    });
    let mut outcomes = Vec::with_capacity(models.len());
    for model in models {
        let params = TmalignParams::new(target, model.as_str())
            .target_selection(target_selection.map(str::to_string))
            .model_selection(model_selection.map(str::to_string));
        outcomes.push(tmalign(session, tools, &params, reporter)?);
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    Ok(outcomes)
}

/// Aligns every loaded object onto the first one, using one selection for both sides.
pub fn tmalign_all_on_first<E: Engine, R: ToolRunner>(
    session: &mut Session<E>,
    tools: &Toolbox<R>,
    selection: Option<&str>,
    reporter: &ProgressReporter,
) -> Result<Vec<TmalignOutcome>, PipelineError> {
    tools.require(Tool::TmAlign)?;
    let names = listed_objects(session)?;
    tmalign_all_on_one(session, tools, &names[0], selection, selection, reporter)
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignFilesParams {
    pub target_file: PathBuf,
    pub model_file: PathBuf,
    /// Where the superimposed model is written.
    pub output_file: PathBuf,
    pub target_selection: Option<String>,
    pub model_selection: Option<String>,
}

/// Loads two structure files, superimposes the model onto the target and writes the moved
/// model to `output_file`.
#[instrument(skip_all, name = "align_files_workflow")]
pub fn align_files<E: Engine, R: ToolRunner>(
    session: &mut Session<E>,
    tools: &Toolbox<R>,
    params: &AlignFilesParams,
    reporter: &ProgressReporter,
) -> Result<TmalignOutcome, PipelineError> {
    tools.require(Tool::TmAlign)?;
    for file in [&params.target_file, &params.model_file] {
        if !crate::tools::invoker::is_nonempty_file(file) {
            return Err(PipelineError::precondition(format!(
                "No input file '{}'",
                file.display()
            )));
        }
    }

    reporter.report(Progress::PhaseStart { name: "Loading" });
    let imported = session.import(ImportOptions::pdb(&params.target_file).title("target"))?;
    assert_partial_success(&imported, "Failed to import target PDB file")?;
    let imported = session.import(ImportOptions::pdb(&params.model_file).title("model"))?;
    assert_partial_success(&imported, "Failed to import model PDB file")?;
    reporter.report(Progress::PhaseFinish);

    let align = TmalignParams::new("target", "model")
        .target_selection(params.target_selection.clone())
        .model_selection(params.model_selection.clone());
    let outcome = tmalign(session, tools, &align, reporter)?;

    let exported =
        session.export_atoms(ExportOptions::pdb(&params.output_file).on_object("model"))?;
    assert_full_success(&exported, "Failed to export aligned model")?;
    info!(output = %params.output_file.display(), "Aligned model written.");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::result::CommandResult;
    use crate::engine::command::EngineCommand;
    use crate::engine::testing::{ScriptedEngine, objects_reply};
    use crate::tools::invoker::ToolCommand;
    use crate::tools::registry::ToolPaths;
    use crate::tools::testing::{ScriptedRunner, exit_ok};
    use crate::workflows::error::ErrorKind;
    use nalgebra::{Matrix3, Point3, Vector3};
    use std::path::Path;

    const REPORT: &str = "\
TM-score= 0.61000 (if normalized by length of Chain_1, i.e., LN=80)
TM-score= 0.83214 (if normalized by length of Chain_2, i.e., LN=76)
";

    const MATRIX: &str = "\
------ The rotation matrix to rotate Chain_1 to Chain_2 ------
m               t[m]        u[m][0]        u[m][1]        u[m][2]
0       1.0000000000   0.0000000000  -1.0000000000   0.0000000000
1       2.0000000000   1.0000000000   0.0000000000   0.0000000000
2       3.0000000000   0.0000000000   0.0000000000   1.0000000000
";

    fn matrix_path(cmd: &ToolCommand) -> &Path {
        let index = cmd.args.iter().position(|a| a == "-m").unwrap();
        Path::new(&cmd.args[index + 1])
    }

    fn aligner(report: &'static str, matrix: &'static str) -> ScriptedRunner {
        ScriptedRunner::new().on("TMalign", move |cmd| {
            std::fs::write(matrix_path(cmd), matrix).unwrap();
            exit_ok(report)
        })
    }

    fn toolbox(runner: ScriptedRunner, root: &Path) -> Toolbox<ScriptedRunner> {
        Toolbox::new(runner, ToolPaths::default()).with_workspace_root(root)
    }

    fn move_command(engine: &ScriptedEngine) -> Option<&EngineCommand> {
        engine.commands.iter().find(|c| c.name() == "move-atoms")
    }

    #[test]
    fn aligns_model_and_applies_the_recovered_transform() {
        let root = tempfile::tempdir().unwrap();
        let tools = toolbox(aligner(REPORT, MATRIX), root.path());
        let mut session = Session::new(ScriptedEngine::new());

        let outcome = tmalign(
            &mut session,
            &tools,
            &TmalignParams::new("A", "B"),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(outcome.model, "B");
        assert_eq!(outcome.tm_score, 0.83214);
        let moved = outcome.transform.apply(&Point3::new(1.0, 0.0, 0.0));
        assert!((moved - Point3::new(1.0, 3.0, 3.0)).norm() < 1e-4);

        let engine = session.into_engine();
        assert_eq!(
            engine.names(),
            vec![
                "list-objects",
                "list-objects",
                "select-atoms",
                "select-atoms",
                "export-atoms",
                "export-atoms",
                "move-atoms",
                "zoom-by-atoms",
            ]
        );
        assert_eq!(
            move_command(&engine),
            Some(&EngineCommand::MoveAtoms {
                objects: "B".to_string(),
                transform: RigidTransform::new(
                    Matrix3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0),
                    Vector3::new(1.0, 2.0, 3.0),
                ),
            })
        );
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn model_is_passed_first_and_selections_are_alpha_carbons() {
        let root = tempfile::tempdir().unwrap();
        let tools = toolbox(aligner(REPORT, MATRIX), root.path());
        let mut session = Session::new(ScriptedEngine::new());
        let params = TmalignParams::new("A", "B").model_selection(Some("[-chain B]".into()));

        tmalign(&mut session, &tools, &params, &ProgressReporter::new()).unwrap();

        let call = &tools.runner().calls()[0];
        assert!(call.args[0].to_string_lossy().ends_with("model.pdb"));
        assert!(call.args[1].to_string_lossy().ends_with("target.pdb"));

        let lines = session.into_engine().command_lines();
        assert!(lines.contains(&"select-atoms -on-objects 'A' -use '[-aname CA]'".to_string()));
        assert!(lines.contains(
            &"select-atoms -on-objects 'B' -use '(([-chain B]) and ([-aname CA]))'".to_string()
        ));
    }

    #[test]
    fn missing_score_line_fails_without_moving_atoms() {
        let root = tempfile::tempdir().unwrap();
        let tools = toolbox(aligner("no score here\n", MATRIX), root.path());
        let mut session = Session::new(ScriptedEngine::new());

        let err = tmalign(
            &mut session,
            &tools,
            &TmalignParams::new("A", "B"),
            &ProgressReporter::new(),
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "Invalid TMalign output");
        assert_eq!(err.kind(), ErrorKind::ToolFailure);
        assert!(move_command(session.engine()).is_none());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn empty_matrix_fails_without_moving_atoms() {
        let root = tempfile::tempdir().unwrap();
        let tools = toolbox(aligner(REPORT, ""), root.path());
        let mut session = Session::new(ScriptedEngine::new());

        let err = tmalign(
            &mut session,
            &tools,
            &TmalignParams::new("A", "B"),
            &ProgressReporter::new(),
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "Invalid TMalign matrix output");
        assert!(move_command(session.engine()).is_none());
    }

    #[test]
    fn missing_aligner_fails_before_any_engine_call_or_workspace() {
        let root = tempfile::tempdir().unwrap();
        let tools = toolbox(ScriptedRunner::with_available(&[]), root.path());
        let mut session = Session::new(ScriptedEngine::new());

        let err = tmalign(
            &mut session,
            &tools,
            &TmalignParams::new("A", "B"),
            &ProgressReporter::new(),
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "No 'TMalign' executable");
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert!(session.engine().commands.is_empty());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn identical_target_and_model_are_rejected() {
        let root = tempfile::tempdir().unwrap();
        let tools = toolbox(aligner(REPORT, MATRIX), root.path());
        let mut session = Session::new(ScriptedEngine::new());

        let err = tmalign(
            &mut session,
            &tools,
            &TmalignParams::new("A", "A"),
            &ProgressReporter::new(),
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert!(tools.runner().calls().is_empty());
    }

    #[test]
    fn empty_model_selection_fails_before_the_aligner_runs() {
        let root = tempfile::tempdir().unwrap();
        let tools = toolbox(aligner(REPORT, MATRIX), root.path());
        let mut engine = ScriptedEngine::new();
        engine
            .respond_once("select-atoms", CommandResult::success(serde_json::json!({})))
            .respond_once("select-atoms", CommandResult::failure(vec!["No atoms selected".into()]));
        let mut session = Session::new(engine);

        let err = tmalign(
            &mut session,
            &tools,
            &TmalignParams::new("A", "B"),
            &ProgressReporter::new(),
        )
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "No model atoms for selection '[-aname CA]'"
        );
        assert!(tools.runner().calls().is_empty());
    }

    #[test]
    fn failed_move_is_a_full_result_failure() {
        let root = tempfile::tempdir().unwrap();
        let tools = toolbox(aligner(REPORT, MATRIX), root.path());
        let mut engine = ScriptedEngine::new();
        engine.respond("move-atoms", CommandResult::failure(vec![]));
        let mut session = Session::new(engine);

        let err = tmalign(
            &mut session,
            &tools,
            &TmalignParams::new("A", "B"),
            &ProgressReporter::new(),
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "Failed to move atoms");
        assert_eq!(err.kind(), ErrorKind::FullResult);
        assert!(session.engine().commands.iter().all(|c| c.name() != "zoom-by-atoms"));
    }

    #[test]
    fn all_on_first_aligns_every_other_object() {
        let root = tempfile::tempdir().unwrap();
        let tools = toolbox(aligner(REPORT, MATRIX), root.path());
        let mut engine = ScriptedEngine::new();
        engine.respond_once("list-objects", objects_reply(&["ref", "m1", "m2"]));
        engine.respond_once("list-objects", objects_reply(&["ref", "m1", "m2"]));
        let mut session = Session::new(engine);

        let outcomes =
            tmalign_all_on_first(&mut session, &tools, None, &ProgressReporter::new()).unwrap();

        let models: Vec<&str> = outcomes.iter().map(|o| o.model.as_str()).collect();
        assert_eq!(models, vec!["m1", "m2"]);
        assert_eq!(tools.runner().calls().len(), 2);
    }

    #[test]
    fn batch_alignment_needs_two_objects() {
        let root = tempfile::tempdir().unwrap();
        let tools = toolbox(aligner(REPORT, MATRIX), root.path());
        let mut engine = ScriptedEngine::new();
        engine.respond("list-objects", objects_reply(&["only"]));
        let mut session = Session::new(engine);

        let err = tmalign_all_on_one(
            &mut session,
            &tools,
            "only",
            None,
            None,
            &ProgressReporter::new(),
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "Less than two objects available");
    }

    #[test]
    fn align_files_imports_aligns_and_exports_the_model() {
        let root = tempfile::tempdir().unwrap();
        let inputs = tempfile::tempdir().unwrap();
        let target_file = inputs.path().join("t.pdb");
        let model_file = inputs.path().join("m.pdb");
        std::fs::write(&target_file, "ATOM").unwrap();
        std::fs::write(&model_file, "ATOM").unwrap();
        let tools = toolbox(aligner(REPORT, MATRIX), root.path());
        let mut session = Session::new(ScriptedEngine::new());
        let params = AlignFilesParams {
            target_file,
            model_file,
            output_file: inputs.path().join("aligned.pdb"),
            target_selection: None,
            model_selection: None,
        };

        let outcome =
            align_files(&mut session, &tools, &params, &ProgressReporter::new()).unwrap();

        assert_eq!(outcome.model, "model");
        let engine = session.into_engine();
        assert_eq!(engine.count("import"), 2);
        assert_eq!(
            engine.command_lines().last().unwrap(),
            &format!(
                "export-atoms -on-objects 'model' -as-pdb -file '{}'",
                params.output_file.display()
            )
        );
    }
}
