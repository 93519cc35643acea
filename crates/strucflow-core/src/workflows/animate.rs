use super::error::PipelineError;
use crate::core::assertions::assert_full_success;
use crate::core::turntable::{
    TurntableAction, TurntableParams, TurntablePlan, plan_spin, plan_turntable,
};
use crate::engine::command::GuiAction;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::session::{Engine, Session};
use crate::tools::Toolbox;
use crate::tools::invoker::{ToolRunner, is_nonempty_file};
use crate::tools::registry::Tool;
use crate::workspace::Workspace;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

pub const DEFAULT_SPIN_ANGLE: f64 = 5.0;
/// Inter-frame delay in hundredths of a second.
pub const DEFAULT_DELAY: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SpinParams {
    pub output: PathBuf,
    pub angle_degrees: f64,
    pub delay: u32,
    /// Save the GUI state and disable widgets while frames are captured.
    pub hide_gui: bool,
}

impl SpinParams {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            angle_degrees: DEFAULT_SPIN_ANGLE,
            delay: DEFAULT_DELAY,
            hide_gui: false,
        }
    }

    pub fn angle(mut self, angle_degrees: f64) -> Self {
        self.angle_degrees = angle_degrees;
        self
    }

    pub fn delay(mut self, delay: u32) -> Self {
        self.delay = delay;
        self
    }

    pub fn hide_gui(mut self, hide_gui: bool) -> Self {
        self.hide_gui = hide_gui;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurntableAnimationParams {
    pub output: PathBuf,
    pub turntable: TurntableParams,
    pub delay: u32,
    pub hide_gui: bool,
}

impl TurntableAnimationParams {
    pub fn new(output: impl Into<PathBuf>, turntable: TurntableParams) -> Self {
        Self {
            output: output.into(),
            turntable,
            delay: DEFAULT_DELAY,
            hide_gui: false,
        }
    }

    pub fn delay(mut self, delay: u32) -> Self {
        self.delay = delay;
        self
    }

    pub fn hide_gui(mut self, hide_gui: bool) -> Self {
        self.hide_gui = hide_gui;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationOutcome {
    pub output: PathBuf,
    /// Distinct screenshots rendered by the engine.
    pub frames_captured: usize,
    /// Images handed to the encoder, counting reused and paused frames.
    pub frames_encoded: usize,
}

/// Exports a full-circle rotation of the current view as an animated image.
#[instrument(skip_all, name = "spin_workflow", fields(angle = params.angle_degrees))]
pub fn gif_spin<E: Engine, R: ToolRunner>(
    session: &mut Session<E>,
    tools: &Toolbox<R>,
    params: &SpinParams,
    reporter: &ProgressReporter,
) -> Result<AnimationOutcome, PipelineError> {
    tools.require(Tool::ImageEncoder)?;
    let plan = plan_spin(params.angle_degrees)?;
    animate(session, tools, &plan, &params.output, params.delay, params.hide_gui, reporter)
}

/// Exports a back-and-forth rotation of the current view as a seamlessly looping
/// animated image. The view ends in its starting orientation.
#[instrument(skip_all, name = "turntable_workflow", fields(steps = params.turntable.steps))]
pub fn turntable<E: Engine, R: ToolRunner>(
    session: &mut Session<E>,
    tools: &Toolbox<R>,
    params: &TurntableAnimationParams,
    reporter: &ProgressReporter,
) -> Result<AnimationOutcome, PipelineError> {
    tools.require(Tool::ImageEncoder)?;
    let plan = plan_turntable(&params.turntable)?;
    animate(session, tools, &plan, &params.output, params.delay, params.hide_gui, reporter)
}

fn animate<E: Engine, R: ToolRunner>(
    session: &mut Session<E>,
    tools: &Toolbox<R>,
    plan: &TurntablePlan,
    output: &Path,
    delay: u32,
    hide_gui: bool,
    reporter: &ProgressReporter,
) -> Result<AnimationOutcome, PipelineError> {
    let program = tools.paths().get(Tool::ImageEncoder);

    tools
        .scoped("strucflow-animation-", |ws| {
            // === Phase 1: Frame capture ===
            let frames = reporter.phase("Capturing frames", || {
                capture_with_gui_state(session, ws, plan, hide_gui, reporter)
            })?;

            // === Phase 2: Encoding ===
            reporter.phase("Encoding animation", || -> Result<(), PipelineError> {
                let mut command = tools
                    .command(Tool::ImageEncoder)?
                    .arg("-delay")
                    .arg(delay.to_string())
                    .args(["-loop", "0"]);
                for &index in &plan.frame_order {
                    command = command.arg(&frames[index]);
                }
                let run = tools.run(&command.arg(output))?;
                if !is_nonempty_file(output) {
                    return Err(PipelineError::tool_failure(
                        program,
                        format!("No animation produced: {}", run.stderr.trim()),
                    ));
                }
                if !run.success() {
                    warn!(exit_status = ?run.exit_status, "{program} exited unsuccessfully but produced output.");
                }
                Ok(())
            })?;

            info!(
                output = %output.display(),
                captured = frames.len(),
                encoded = plan.frame_order.len(),
                "Animation written."
            );
            Ok(AnimationOutcome {
                output: output.to_path_buf(),
                frames_captured: frames.len(),
                frames_encoded: plan.frame_order.len(),
            })
        })
        .map_err(|e: PipelineError| e.with_context(program))
}

/// Runs the capture, bracketed by a GUI state push and pop when `hide_gui` is set.
///
/// Once the push succeeded the pop is always issued; an error from the capture wins over
/// an error from the pop.
fn capture_with_gui_state<E: Engine>(
    session: &mut Session<E>,
    ws: &Workspace,
    plan: &TurntablePlan,
    hide_gui: bool,
    reporter: &ProgressReporter,
) -> Result<Vec<PathBuf>, PipelineError> {
    if !hide_gui {
        return capture_frames(session, ws, plan, reporter);
    }

    let pushed = session.configure_gui(GuiAction::Push)?;
    assert_full_success(&pushed, "Failed to save GUI state")?;

    let captured = session
        .configure_gui(GuiAction::DisableWidgets)
        .map_err(PipelineError::from)
        .and_then(|r| {
            assert_full_success(&r, "Failed to disable GUI widgets")?;
            Ok(())
        })
        .and_then(|()| capture_frames(session, ws, plan, reporter));

    let restored = session
        .configure_gui(GuiAction::Pop)
        .map_err(PipelineError::from)
        .and_then(|r| {
            assert_full_success(&r, "Failed to restore GUI state")?;
            Ok(())
        });

    match (captured, restored) {
        (Ok(frames), Ok(())) => Ok(frames),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(pop_error)) => {
            warn!(error = %pop_error, "Failed to restore GUI state after a capture error.");
            Err(e)
        }
    }
}

/// Executes every plan action and returns the captured image paths in capture order.
///
/// On failure, the rotation applied so far is undone on a best-effort basis so the shared
/// view does not drift.
fn capture_frames<E: Engine>(
    session: &mut Session<E>,
    ws: &Workspace,
    plan: &TurntablePlan,
    reporter: &ProgressReporter,
) -> Result<Vec<PathBuf>, PipelineError> {
    let mut frames = Vec::with_capacity(plan.capture_count());
    let mut applied = 0.0;

    reporter.report(Progress::TaskStart {
        total_steps: plan.capture_count() as u64,
    });
    let outcome = plan.actions.iter().try_for_each(|action| -> Result<(), PipelineError> {
        match *action {
            TurntableAction::Rotate(angle) => {
                let rotated = session.rotate(angle)?;
                assert_full_success(&rotated, "Failed to rotate view")?;
                applied += angle;
            }
            TurntableAction::Capture => {
                let frame = ws.file(&format!("frame_{:05}.png", frames.len()));
                let shot = session.screenshot(&frame)?;
                assert_full_success(&shot, "Failed to capture screenshot")?;
                frames.push(frame);
                reporter.report(Progress::TaskIncrement);
            }
        }
        Ok(())
    });
    reporter.report(Progress::TaskFinish);

    if let Err(e) = outcome {
        if applied != 0.0 {
            if let Err(undo) = session.rotate(-applied) {
                warn!(error = %undo, applied, "Failed to undo partial rotation.");
            }
        }
        return Err(e);
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::result::CommandResult;
    use crate::core::turntable::TurntableVariant;
    use crate::engine::command::EngineCommand;
    use crate::engine::testing::ScriptedEngine;
    use crate::tools::invoker::ToolCommand;
    use crate::tools::registry::ToolPaths;
    use crate::tools::testing::{ScriptedRunner, exit_ok};
    use crate::workflows::error::ErrorKind;
    use std::sync::Mutex;

    fn encoder() -> ScriptedRunner {
        ScriptedRunner::new().on("convert", |cmd: &ToolCommand| {
            let out = cmd.args.last().unwrap();
            std::fs::write(Path::new(out), "GIF89a").unwrap();
            exit_ok("")
        })
    }

    fn rotations(engine: &ScriptedEngine) -> Vec<f64> {
        engine
            .commands
            .iter()
            .filter_map(|c| match c {
                EngineCommand::Rotate { angle_degrees, .. } => Some(*angle_degrees),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn spin_captures_one_frame_per_increment_and_encodes_them_in_order() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("out.gif");
        let tools = Toolbox::new(encoder(), ToolPaths::default())
            .with_workspace_root(root.path().join("scratch"));
        let mut session = Session::new(ScriptedEngine::new());

        let outcome = gif_spin(
            &mut session,
            &tools,
            &SpinParams::new(&out).angle(10.0).delay(2),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(outcome.frames_captured, 36);
        assert_eq!(outcome.frames_encoded, 36);
        let engine = session.into_engine();
        assert_eq!(engine.count("screenshot"), 36);
        assert_eq!(rotations(&engine).iter().sum::<f64>(), 360.0);

        let call = &tools.runner().calls()[0];
        let args: Vec<String> = call
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(&args[..4], ["-delay", "2", "-loop", "0"]);
        assert_eq!(args.len(), 4 + 36 + 1);
        assert!(args[4].ends_with("frame_00000.png"));
        assert!(args[39].ends_with("frame_00035.png"));
        assert_eq!(Path::new(&args[40]), out);
        assert_eq!(
            std::fs::read_dir(root.path().join("scratch")).unwrap().count(),
            0
        );
    }

    #[test]
    fn turntable_reuses_frames_and_leaves_no_net_rotation() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("turn.gif");
        let tools = Toolbox::new(encoder(), ToolPaths::default())
            .with_workspace_root(root.path());
        let mut session = Session::new(ScriptedEngine::new());
        let params = TurntableAnimationParams::new(&out, TurntableParams::new(8, 2.0).pause_frames(3));

        let outcome = turntable(&mut session, &tools, &params, &ProgressReporter::new()).unwrap();

        // 1 + (4 + 3) + 4 + 1 + (4 + 3) + 4
        assert_eq!(outcome.frames_encoded, 24);
        assert_eq!(outcome.frames_captured, 9);
        let engine = session.into_engine();
        assert_eq!(rotations(&engine).iter().sum::<f64>(), 0.0);
        assert_eq!(tools.runner().calls()[0].args.len(), 4 + 24 + 1);
    }

    #[test]
    fn sweep_variant_has_no_start_frame() {
        let root = tempfile::tempdir().unwrap();
        let tools = Toolbox::new(encoder(), ToolPaths::default())
            .with_workspace_root(root.path());
        let mut session = Session::new(ScriptedEngine::new());
        let params = TurntableAnimationParams::new(
            root.path().join("sweep.gif"),
            TurntableParams::new(6, 1.0)
                .pause_frames(2)
                .variant(TurntableVariant::Sweep),
        );

        let outcome = turntable(&mut session, &tools, &params, &ProgressReporter::new()).unwrap();

        assert_eq!(outcome.frames_captured, 6);
        assert_eq!(outcome.frames_encoded, 6 + 2 * 2);
    }

    #[test]
    fn gui_state_is_restored_when_a_capture_fails() {
        let root = tempfile::tempdir().unwrap();
        let tools = Toolbox::new(encoder(), ToolPaths::default())
            .with_workspace_root(root.path());
        let mut engine = ScriptedEngine::new();
        engine
            .respond_once("screenshot", CommandResult::success(serde_json::json!({})))
            .respond("screenshot", CommandResult::failure(vec!["no context".into()]));
        let mut session = Session::new(engine);
        let params = SpinParams::new(root.path().join("x.gif"))
            .angle(90.0)
            .hide_gui(true);

        let err = gif_spin(&mut session, &tools, &params, &ProgressReporter::new()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::FullResult);
        assert_eq!(
            err.to_string(),
            "Failed to use convert: Failed to capture screenshot"
        );
        let engine = session.into_engine();
        let names = engine.names();
        assert_eq!(names[0], "configure-gui-push");
        assert_eq!(names[1], "configure-gui-disable-widgets");
        assert_eq!(names.last(), Some(&"configure-gui-pop"));
        // Two 90 degree turns were applied before the failure, then undone.
        assert_eq!(rotations(&engine), vec![90.0, 90.0, -180.0]);
        assert!(tools.runner().calls().is_empty());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_encoder_output_is_a_tool_failure() {
        let root = tempfile::tempdir().unwrap();
        let tools = Toolbox::new(ScriptedRunner::new(), ToolPaths::default())
            .with_workspace_root(root.path());
        let mut session = Session::new(ScriptedEngine::new());

        let err = gif_spin(
            &mut session,
            &tools,
            &SpinParams::new(root.path().join("x.gif")).angle(120.0),
            &ProgressReporter::new(),
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ToolFailure);
        assert!(err.to_string().contains("No animation produced"));
    }

    #[test]
    fn missing_encoder_fails_before_any_engine_call() {
        let tools = Toolbox::new(ScriptedRunner::with_available(&[]), ToolPaths::default());
        let mut session = Session::new(ScriptedEngine::new());

        let err = gif_spin(
            &mut session,
            &tools,
            &SpinParams::new("x.gif"),
            &ProgressReporter::new(),
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "No 'convert' executable");
        assert!(session.engine().commands.is_empty());
    }

    #[test]
    fn progress_reports_each_captured_frame() {
        let root = tempfile::tempdir().unwrap();
        let tools = Toolbox::new(encoder(), ToolPaths::default())
            .with_workspace_root(root.path());
        let mut session = Session::new(ScriptedEngine::new());
        let increments = Mutex::new(0usize);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if matches!(event, Progress::TaskIncrement) {
                *increments.lock().unwrap() += 1;
            }
        }));

        gif_spin(
            &mut session,
            &tools,
            &SpinParams::new(root.path().join("x.gif")).angle(45.0),
            &reporter,
        )
        .unwrap();

        drop(reporter);
        assert_eq!(increments.into_inner().unwrap(), 8);
    }
}
