use super::{open_session, reporter, toolbox};
use crate::cli::{AnimationArgs, SpinArgs, TurntableArgs};
use crate::config::{AnimationSettings, AppConfig};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use std::path::Path;
use strucflow::core::assertions::{assert_full_success, assert_partial_success};
use strucflow::core::selection::alpha_carbons_of;
use strucflow::core::turntable::{TurntableParams, TurntableVariant};
use strucflow::core::utils::identifiers::is_valid_object_name;
use strucflow::engine::command::ImportOptions;
use strucflow::engine::process::ProcessEngine;
use strucflow::engine::session::Session;
use strucflow::tools::registry::Tool;
use strucflow::workflows::animate::{
    AnimationOutcome, SpinParams, TurntableAnimationParams, gif_spin, turntable,
};
use strucflow::workflows::error::PipelineError;
use tracing::info;

const FALLBACK_TITLE: &str = "structure";

fn object_title(input: &Path) -> String {
    input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| is_valid_object_name(stem))
        .unwrap_or(FALLBACK_TITLE)
        .to_string()
}

fn spin_params(args: &SpinArgs, settings: &AnimationSettings) -> SpinParams {
    SpinParams::new(&args.animation.output)
        .angle(args.angle.unwrap_or(settings.spin_angle))
        .delay(args.animation.delay.unwrap_or(settings.delay))
        .hide_gui(args.animation.hide_gui || settings.hide_gui)
}

fn turntable_params(args: &TurntableArgs, settings: &AnimationSettings) -> TurntableAnimationParams {
    let variant = if args.sweep {
        TurntableVariant::Sweep
    } else {
        TurntableVariant::WithStartFrame
    };
    let turntable = TurntableParams::new(
        args.steps.unwrap_or(settings.turntable_steps),
        args.angle.unwrap_or(settings.turntable_angle),
    )
    .pause_frames(args.pause_frames.unwrap_or(settings.pause_frames))
    .variant(variant);

    TurntableAnimationParams::new(&args.animation.output, turntable)
        .delay(args.animation.delay.unwrap_or(settings.delay))
        .hide_gui(args.animation.hide_gui || settings.hide_gui)
}

/// Loads the structure to animate and frames it in the view.
fn load_scene(args: &AnimationArgs, config: &AppConfig) -> Result<Session<ProcessEngine>> {
    let tools = toolbox(config);
    tools
        .preflight(&[Tool::ImageEncoder])
        .map_err(PipelineError::from)?;

    let mut session = open_session(config)?;
    let title = object_title(&args.input);
    info!(input = %args.input.display(), object = %title, "Loading structure to animate...");

    let imported = session
        .import(ImportOptions::pdb(&args.input).title(&title))
        .map_err(PipelineError::from)?;
    assert_partial_success(&imported, "Failed to import PDB file").map_err(PipelineError::from)?;

    let zoomed = session
        .zoom_by_atoms(&title, &alpha_carbons_of(None))
        .map_err(PipelineError::from)?;
    assert_full_success(&zoomed, "Failed to zoom on structure").map_err(PipelineError::from)?;
    Ok(session)
}

fn report(outcome: &AnimationOutcome) {
    info!(
        captured = outcome.frames_captured,
        encoded = outcome.frames_encoded,
        "Animation encoded."
    );
    println!(
        "✓ {} frames ({} captured) written to: {}",
        outcome.frames_encoded,
        outcome.frames_captured,
        outcome.output.display()
    );
}

pub fn run_spin(args: SpinArgs, config: &AppConfig) -> Result<()> {
    let params = spin_params(&args, &config.animation);
    let mut session = load_scene(&args.animation, config)?;
    let tools = toolbox(config);
    let progress_handler = CliProgressHandler::new();
    let reporter = reporter(&progress_handler);

    println!("Rendering spin at {}° per frame...", params.angle_degrees);
    let outcome = gif_spin(&mut session, &tools, &params, &reporter)?;
    report(&outcome);
    Ok(())
}

pub fn run_turntable(args: TurntableArgs, config: &AppConfig) -> Result<()> {
    let params = turntable_params(&args, &config.animation);
    let mut session = load_scene(&args.animation, config)?;
    let tools = toolbox(config);
    let progress_handler = CliProgressHandler::new();
    let reporter = reporter(&progress_handler);

    println!(
        "Rendering turntable with {} steps of {}°...",
        params.turntable.steps, params.turntable.angle_degrees
    );
    let outcome = turntable(&mut session, &tools, &params, &reporter)?;
    report(&outcome);
    Ok(())
}
