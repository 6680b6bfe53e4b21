//! Scene playback state machine
//!
//! Sequences a list of steps through move → hold → advance. The player never
//! schedules anything itself; every transition returns a `Directive` telling
//! the animator what to start next. Each play gets a fresh run id, and every
//! callback carries the id it was issued under, so anything left over from a
//! stopped or replaced run is discarded when it arrives.

use std::time::Duration;

use crate::joints::JointVector;

use super::scene::SceneStep;
use crate::input::InputError;

/// Arrival time used for the very first step of a play
pub const DEFAULT_FIRST_ARRIVAL: f64 = 3.0;

/// Delay used instead of a zero hold so the sequence stays re-entrant
pub const MIN_HOLD_DELAY: Duration = Duration::from_millis(50);

/// Player state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Stopped,
    Moving(usize),
    Holding(usize),
}

/// Completion token attached to a scene move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrival {
    pub run: u64,
}

/// What the animator should do after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Interpolate from the current state to `target` over `duration`, then
    /// deliver `arrival` back to the player
    MoveTo {
        step: usize,
        target: JointVector,
        duration: f64,
        arrival: Arrival,
    },
    /// Wait `delay`, then report the hold as elapsed for `run`
    Hold { step: usize, delay: Duration, run: u64 },
    /// Non-looping playback reached the end
    Finished,
    /// The callback belonged to a stale run
    Ignored,
}

/// Why a pose lookup failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    Missing,
    Unreadable(String),
}

/// Resolves pose names to joint vectors at the moment a step plays
pub trait PoseResolver {
    fn resolve(&self, name: &str) -> Result<JointVector, ResolveError>;
}

/// Playback failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlaybackError {
    #[error("Scene has no steps")]
    EmptyScene,

    #[error("Step {index}: {source}")]
    InvalidStep { index: usize, source: InputError },

    #[error("Pose '{0}' not found")]
    MissingPose(String),

    #[error("Pose '{pose}' could not be read: {reason}")]
    UnreadablePose { pose: String, reason: String },

    #[error("Pose '{pose}' for step {step} disappeared during playback")]
    PoseVanished { step: usize, pose: String },
}

/// Snapshot of the player sent to observers after each transition
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackUpdate {
    pub state: PlayerState,
    pub total: usize,
    pub pose_name: Option<String>,
    /// Arrival time while moving, hold time while holding
    pub seconds: f64,
    /// Clock time of the transition
    pub at: f64,
}

impl PlaybackUpdate {
    /// One-line status, e.g. `Step 2/5: wave (holding 1.0s)`
    pub fn describe(&self) -> String {
        let pose = self.pose_name.as_deref().unwrap_or("?");
        match self.state {
            PlayerState::Stopped => "Stopped".to_string(),
            PlayerState::Moving(i) => {
                format!("Step {}/{}: {} (moving {:.1}s)", i + 1, self.total, pose, self.seconds)
            }
            PlayerState::Holding(i) => {
                format!("Step {}/{}: {} (holding {:.1}s)", i + 1, self.total, pose, self.seconds)
            }
        }
    }
}

/// The scene sequencing state machine
#[derive(Debug)]
pub struct ScenePlayer {
    state: PlayerState,
    steps: Vec<SceneStep>,
    looping: bool,
    /// Index of the step to move to next
    index: usize,
    /// Arrival time for the next move
    pending_interp: f64,
    run: u64,
    first_arrival: f64,
}

impl ScenePlayer {
    pub fn new() -> Self {
        Self::with_first_arrival(DEFAULT_FIRST_ARRIVAL)
    }

    pub fn with_first_arrival(first_arrival: f64) -> Self {
        Self {
            state: PlayerState::Stopped,
            steps: Vec::new(),
            looping: false,
            index: 0,
            pending_interp: 0.0,
            run: 0,
            first_arrival,
        }
    }

    /// Validate and start playing `steps`.
    ///
    /// Every pose must resolve before anything moves. On error the player is
    /// left exactly as it was.
    pub fn play(
        &mut self,
        steps: Vec<SceneStep>,
        looping: bool,
        poses: &dyn PoseResolver,
    ) -> Result<Directive, PlaybackError> {
        Self::preflight(&steps, poses)?;

        self.run += 1;
        self.steps = steps;
        self.looping = looping;
        self.index = 0;
        self.pending_interp = self.first_arrival;
        tracing::info!(steps = self.steps.len(), looping, run = self.run, "Playing scene");
        self.begin_move(poses)
    }

    /// The move for `arrival` finished: start holding at that step
    pub fn on_arrival(&mut self, arrival: Arrival) -> Directive {
        let step = match self.state {
            PlayerState::Moving(i) if arrival.run == self.run => i,
            _ => {
                tracing::trace!(run = arrival.run, live = self.run, "Discarding stale arrival");
                return Directive::Ignored;
            }
        };

        let current = &self.steps[step];
        // This step's interp time is the arrival time of the next one
        self.pending_interp = current.interp_time;
        self.index = step + 1;
        self.state = PlayerState::Holding(step);

        Directive::Hold {
            step,
            delay: hold_delay(current.hold_time),
            run: self.run,
        }
    }

    /// The hold timer for `run` fired: move on to the next step
    pub fn on_hold_elapsed(
        &mut self,
        run: u64,
        poses: &dyn PoseResolver,
    ) -> Result<Directive, PlaybackError> {
        match self.state {
            PlayerState::Holding(_) if run == self.run => self.begin_move(poses),
            _ => {
                tracing::trace!(run, live = self.run, "Discarding stale hold timer");
                Ok(Directive::Ignored)
            }
        }
    }

    /// Stop from any state. Returns whether playback was active.
    pub fn stop(&mut self) -> bool {
        let was_playing = self.is_playing();
        self.state = PlayerState::Stopped;
        self.pending_interp = 0.0;
        self.run += 1;
        if was_playing {
            tracing::info!("Scene stopped");
        }
        was_playing
    }

    fn preflight(steps: &[SceneStep], poses: &dyn PoseResolver) -> Result<(), PlaybackError> {
        if steps.is_empty() {
            return Err(PlaybackError::EmptyScene);
        }
        for (index, step) in steps.iter().enumerate() {
            step.validate()
                .map_err(|source| PlaybackError::InvalidStep { index, source })?;
        }
        for step in steps {
            match poses.resolve(&step.pose_name) {
                Ok(_) => {}
                Err(ResolveError::Missing) => {
                    return Err(PlaybackError::MissingPose(step.pose_name.clone()));
                }
                Err(ResolveError::Unreadable(reason)) => {
                    return Err(PlaybackError::UnreadablePose {
                        pose: step.pose_name.clone(),
                        reason,
                    });
                }
            }
        }
        Ok(())
    }

    fn begin_move(&mut self, poses: &dyn PoseResolver) -> Result<Directive, PlaybackError> {
        if self.index >= self.steps.len() {
            if !self.looping {
                self.state = PlayerState::Stopped;
                self.pending_interp = 0.0;
                tracing::info!("Scene playback complete");
                return Ok(Directive::Finished);
            }
            self.index = 0;
            self.pending_interp = self.steps.last().map(|s| s.interp_time).unwrap_or(0.0);
            tracing::debug!(arrival = self.pending_interp, "Looping scene");
        }

        let step = self.index;
        let pose = &self.steps[step].pose_name;
        let target = match poses.resolve(pose) {
            Ok(target) => target,
            Err(e) => {
                let pose = pose.clone();
                tracing::error!(
                    step,
                    pose = %pose,
                    reason = ?e,
                    "Pose vanished during playback, aborting"
                );
                self.stop();
                return Err(PlaybackError::PoseVanished { step, pose });
            }
        };

        self.state = PlayerState::Moving(step);
        Ok(Directive::MoveTo {
            step,
            target,
            duration: self.pending_interp,
            arrival: Arrival { run: self.run },
        })
    }

    /// Observer snapshot stamped with clock time `at`
    pub fn update(&self, at: f64) -> PlaybackUpdate {
        let (pose_name, seconds) = match self.state {
            PlayerState::Stopped => (None, 0.0),
            PlayerState::Moving(i) => (Some(self.steps[i].pose_name.clone()), self.pending_interp),
            PlayerState::Holding(i) => {
                let step = &self.steps[i];
                (Some(step.pose_name.clone()), step.hold_time)
            }
        };
        PlaybackUpdate {
            state: self.state,
            total: self.steps.len(),
            pose_name,
            seconds,
            at,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state != PlayerState::Stopped
    }

    pub fn run(&self) -> u64 {
        self.run
    }

    pub fn pending_interp(&self) -> f64 {
        self.pending_interp
    }

    pub fn steps(&self) -> &[SceneStep] {
        &self.steps
    }

    pub fn looping(&self) -> bool {
        self.looping
    }
}

impl Default for ScenePlayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Hold in whole milliseconds; anything under 1 ms becomes `MIN_HOLD_DELAY`
fn hold_delay(hold_time: f64) -> Duration {
    let ms = (hold_time * 1000.0) as u64;
    if ms > 0 {
        Duration::from_millis(ms)
    } else {
        MIN_HOLD_DELAY
    }
}

#[cfg(test)]
mod tests;
