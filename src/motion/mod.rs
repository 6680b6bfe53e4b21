//! Motion: interpolation, scenes and scene playback
//!
//! Everything here runs on the animation domain. The `Animator` ties the
//! pieces to a `Scheduler` so no callback ever runs concurrently with another.

pub mod animator;
pub mod interpolator;
pub mod player;
pub mod scene;

pub use animator::{Animator, MotionEvent, SNAP_DELAY, TICK_INTERVAL};
pub use interpolator::{lerp, InterpState, Interpolator, StartOutcome, Tick, INSTANT_THRESHOLD};
pub use player::{
    Arrival, Directive, PlaybackError, PlaybackUpdate, PlayerState, PoseResolver, ResolveError,
    ScenePlayer, DEFAULT_FIRST_ARRIVAL, MIN_HOLD_DELAY,
};
pub use scene::{
    DraftError, Scene, SceneDraft, SceneStep, DEFAULT_HOLD_TIME, DEFAULT_STEP_INTERP_TIME,
};
