use thiserror::Error;
use tracing::warn;

/// Angle tolerance used when deciding whether a rotation closes a full turn.
const ANGLE_EPSILON: f64 = 1e-9;

/// Upper bound on frames captured by one full-circle spin (a 0.1 degree step).
pub const MAX_SPIN_FRAMES: usize = 3600;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TurntableError {
    #[error("Turntable needs at least 2 steps after rounding down to an even count (requested {requested})")]
    TooFewSteps { requested: usize },

    #[error("Invalid rotation angle {0}: must be a positive finite number of degrees")]
    InvalidAngle(f64),

    #[error("Rotation angle {0} is larger than a full turn, no frame would be captured")]
    AngleExceedsTurn(f64),

    #[error("Rotation angle {angle} would need {frames} frames for a full turn (at most {max})")]
    TooManyFrames { angle: f64, frames: usize, max: usize },
}

/// How the "there and back" sweep is assembled into a looping frame list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurntableVariant {
    /// Captures the untouched start orientation first and replays every captured frame on
    /// the way back, so the loop passes smoothly through the start view.
    #[default]
    WithStartFrame,
    /// Only the two outward arcs are captured; the loop jumps between their extremities.
    Sweep,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurntableParams {
    /// Total step count; odd values are rounded down.
    pub steps: usize,
    pub angle_degrees: f64,
    /// How many times each extremity frame is repeated to pause the animation.
    pub pause_frames: usize,
    pub variant: TurntableVariant,
}

impl TurntableParams {
    pub fn new(steps: usize, angle_degrees: f64) -> Self {
        Self {
            steps,
            angle_degrees,
            pause_frames: 0,
            variant: TurntableVariant::default(),
        }
    }

    pub fn pause_frames(mut self, pause_frames: usize) -> Self {
        self.pause_frames = pause_frames;
        self
    }

    pub fn variant(mut self, variant: TurntableVariant) -> Self {
        self.variant = variant;
        self
    }
}

impl Default for TurntableParams {
    fn default() -> Self {
        Self::new(40, 1.0).pause_frames(5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TurntableAction {
    /// Rotate the view about its vertical axis by this many degrees.
    Rotate(f64),
    /// Render the current view to the next image.
    Capture,
}

/// An executable rotation/capture script plus the order in which captured images play.
///
/// The n-th [`TurntableAction::Capture`] produces image `n`; `frame_order` lists image
/// indices, repeating them where a frame is reused or held as a pause.
#[derive(Debug, Clone, PartialEq)]
pub struct TurntablePlan {
    pub actions: Vec<TurntableAction>,
    pub frame_order: Vec<usize>,
}

impl TurntablePlan {
    pub fn capture_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, TurntableAction::Capture))
            .count()
    }

    /// Sum of every signed rotation in the plan, in degrees.
    pub fn net_rotation(&self) -> f64 {
        self.actions
            .iter()
            .map(|a| match a {
                TurntableAction::Rotate(angle) => *angle,
                TurntableAction::Capture => 0.0,
            })
            .sum()
    }

    /// Whether executing the plan leaves the view where it started (modulo whole turns).
    pub fn returns_to_start(&self) -> bool {
        let residual = self.net_rotation().rem_euclid(360.0);
        residual < ANGLE_EPSILON || 360.0 - residual < ANGLE_EPSILON
    }
}

fn validate_angle(angle: f64) -> Result<(), TurntableError> {
    if !angle.is_finite() || angle <= 0.0 {
        return Err(TurntableError::InvalidAngle(angle));
    }
    Ok(())
}

/// Builds a closed-loop turntable plan.
///
/// The view is swept backward by `steps / 2` increments, returned, swept forward by the
/// same amount and returned again, so the net rotation of the whole plan is zero.
///
/// # Errors
///
/// Returns [`TurntableError`] for a non-positive or non-finite angle, or when fewer than
/// two steps remain after rounding an odd count down.
pub fn plan_turntable(params: &TurntableParams) -> Result<TurntablePlan, TurntableError> {
    validate_angle(params.angle_degrees)?;

    let even_steps = params.steps - params.steps % 2;
    if even_steps != params.steps {
        warn!(
            requested = params.steps,
            used = even_steps,
            "Odd turntable step count rounded down to an even number."
        );
    }
    if even_steps < 2 {
        return Err(TurntableError::TooFewSteps {
            requested: params.steps,
        });
    }

    let half = even_steps / 2;
    let a = params.angle_degrees;
    let p = params.pause_frames;

    let mut actions = Vec::with_capacity(6 * half + 1);
    let with_start = params.variant == TurntableVariant::WithStartFrame;
    if with_start {
        actions.push(TurntableAction::Capture);
    }
    for _ in 0..half {
        actions.push(TurntableAction::Rotate(-a));
        actions.push(TurntableAction::Capture);
    }
    actions.extend(std::iter::repeat_n(TurntableAction::Rotate(a), half));
    for _ in 0..half {
        actions.push(TurntableAction::Rotate(a));
        actions.push(TurntableAction::Capture);
    }
    actions.extend(std::iter::repeat_n(TurntableAction::Rotate(-a), half));

    let frame_order = if with_start {
        // Image 0 is the start view, 1..=half the backward arc, half+1..=2*half the forward arc.
        let backward: Vec<usize> = (1..=half).collect();
        let forward: Vec<usize> = (half + 1..=2 * half).collect();
        let mut order = Vec::with_capacity(2 * (1 + 2 * half + p));
        for arc in [&backward, &forward] {
            order.push(0);
            order.extend(arc.iter().copied());
            order.extend(std::iter::repeat_n(arc[half - 1], p));
            order.extend(arc.iter().rev().copied());
        }
        order
    } else {
        let mut order = Vec::with_capacity(2 * (half + p));
        for arc_start in [0, half] {
            order.extend(arc_start..arc_start + half);
            order.extend(std::iter::repeat_n(arc_start + half - 1, p));
        }
        order
    };

    Ok(TurntablePlan {
        actions,
        frame_order,
    })
}

/// Number of frames in a full-circle spin at `angle_degrees` per frame.
pub fn spin_frame_count(angle_degrees: f64) -> usize {
    if !angle_degrees.is_finite() || angle_degrees <= 0.0 {
        return 0;
    }
    (360.0 / angle_degrees + ANGLE_EPSILON).floor() as usize
}

/// Builds a full-circle spin: rotate then capture, once per frame.
///
/// When the angle does not divide 360 evenly, a final uncaptured rotation completes the
/// turn so the view ends where it began.
///
/// # Errors
///
/// Returns [`TurntableError`] for an invalid angle, one larger than a full turn, or one so
/// small that the turn would exceed [`MAX_SPIN_FRAMES`].
pub fn plan_spin(angle_degrees: f64) -> Result<TurntablePlan, TurntableError> {
    validate_angle(angle_degrees)?;
    let frames = spin_frame_count(angle_degrees);
    if frames == 0 {
        return Err(TurntableError::AngleExceedsTurn(angle_degrees));
    }
    if frames > MAX_SPIN_FRAMES {
        return Err(TurntableError::TooManyFrames {
            angle: angle_degrees,
            frames,
            max: MAX_SPIN_FRAMES,
        });
    }

    let mut actions = Vec::with_capacity(2 * frames + 1);
    for _ in 0..frames {
        actions.push(TurntableAction::Rotate(angle_degrees));
        actions.push(TurntableAction::Capture);
    }
    let residual = 360.0 - frames as f64 * angle_degrees;
    if residual.abs() > ANGLE_EPSILON {
        actions.push(TurntableAction::Rotate(residual));
    }

    Ok(TurntablePlan {
        actions,
        frame_order: (0..frames).collect(),
    })
}
