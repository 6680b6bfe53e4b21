//! Single-shot linear motion driver
//!
//! Moves the shared joint state from a start vector to a target vector over a
//! fixed duration. The interpolator does no scheduling itself: the owner calls
//! `tick` on its own cadence and receives the completion token exactly once
//! when the run finishes.

use crate::joints::{JointVector, SharedJoints, NUM_JOINTS};

/// Durations at or below this snap straight to the target
pub const INSTANT_THRESHOLD: f64 = 0.001;

/// Interpolator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpState {
    #[default]
    Idle,
    Running,
}

/// Result of `start`
#[derive(Debug, PartialEq)]
pub enum StartOutcome<C> {
    /// The target was applied immediately. The caller delivers the completion,
    /// after a short deferral, rather than running it inline.
    Snapped { completion: Option<C> },
    /// A timed run began with this run id
    Running { run: u64 },
}

/// Result of one `tick`
#[derive(Debug, PartialEq)]
pub struct Tick<C> {
    /// Angles written to the joint state by this tick
    pub angles: JointVector,
    /// Progress reached 1.0 (or the interpolator was already idle)
    pub done: bool,
    /// Completion of the run that just finished; `Some` exactly once per run
    pub completion: Option<C>,
}

/// Linear interpolator over the shared joint vector
///
/// `C` is the completion token handed back when a run finishes.
#[derive(Debug)]
pub struct Interpolator<C> {
    joints: SharedJoints,
    state: InterpState,
    from: JointVector,
    to: JointVector,
    start_time: f64,
    end_time: f64,
    duration: f64,
    on_complete: Option<C>,
    run: u64,
}

impl<C> Interpolator<C> {
    pub fn new(joints: SharedJoints) -> Self {
        Self {
            joints,
            state: InterpState::Idle,
            from: [0.0; NUM_JOINTS],
            to: [0.0; NUM_JOINTS],
            start_time: 0.0,
            end_time: 0.0,
            duration: 0.0,
            on_complete: None,
            run: 0,
        }
    }

    /// Begin moving from `from` to `to` over `duration` seconds.
    ///
    /// Starting while a run is active replaces it: the previous run id goes
    /// stale and its completion is dropped without firing.
    pub fn start(
        &mut self,
        from: JointVector,
        to: JointVector,
        duration: f64,
        now: f64,
        on_complete: Option<C>,
    ) -> StartOutcome<C> {
        if self.state == InterpState::Running {
            tracing::debug!(run = self.run, "Replacing active interpolation");
        }
        drop(self.cancel());

        if duration <= INSTANT_THRESHOLD {
            self.joints.set_all(to);
            self.from = to;
            self.to = to;
            tracing::debug!("Instant move to target");
            return StartOutcome::Snapped {
                completion: on_complete,
            };
        }

        self.from = from;
        self.to = to;
        self.duration = duration;
        self.start_time = now;
        self.end_time = now + duration;
        self.on_complete = on_complete;
        self.state = InterpState::Running;
        tracing::debug!(run = self.run, duration, "Interpolation started");
        StartOutcome::Running { run: self.run }
    }

    /// Advance to `now`, write the blended angles and report completion
    pub fn tick(&mut self, now: f64) -> Tick<C> {
        if self.state != InterpState::Running {
            return Tick {
                angles: self.joints.get(),
                done: true,
                completion: None,
            };
        }

        let progress = self.progress_at(now);
        let angles = if progress >= 1.0 {
            self.to
        } else {
            lerp(&self.from, &self.to, progress)
        };
        self.joints.set_all(angles);

        if progress >= 1.0 {
            self.state = InterpState::Idle;
            tracing::debug!(run = self.run, "Interpolation complete");
            Tick {
                angles,
                done: true,
                completion: self.on_complete.take(),
            }
        } else {
            Tick {
                angles,
                done: false,
                completion: None,
            }
        }
    }

    /// Progress in [0, 1] at time `now`
    pub fn progress_at(&self, now: f64) -> f64 {
        if self.state != InterpState::Running || now >= self.end_time {
            return 1.0;
        }
        ((now - self.start_time) / self.duration).clamp(0.0, 1.0)
    }

    /// Stop the active run without touching the joint state.
    ///
    /// Returns the completion that will now never fire.
    pub fn cancel(&mut self) -> Option<C> {
        self.run += 1;
        self.state = InterpState::Idle;
        self.on_complete.take()
    }

    /// Drop the pending completion but let the motion run to its target
    pub fn clear_completion(&mut self) -> Option<C> {
        self.on_complete.take()
    }

    pub fn state(&self) -> InterpState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == InterpState::Running
    }

    /// Id of the current (or most recent) run
    pub fn run(&self) -> u64 {
        self.run
    }

    pub fn target(&self) -> JointVector {
        self.to
    }
}

/// Component-wise `from*(1-t) + to*t`
pub fn lerp(from: &JointVector, to: &JointVector, t: f64) -> JointVector {
    let mut out = [0.0; NUM_JOINTS];
    for (i, v) in out.iter_mut().enumerate() {
        *v = from[i] * (1.0 - t) + to[i] * t;
    }
    out
}
