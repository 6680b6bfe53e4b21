//! Animation-domain driver
//!
//! Owns the interpolator, the scene player and the scheduler, and is the only
//! place where their events meet. All of it runs on one thread: `pump` pops
//! due events in order and dispatches them one at a time, so no two motion
//! callbacks ever run concurrently.

use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{unbounded, Receiver, Sender};

use crate::joints::{JointVector, SharedJoints};
use crate::time::{Clock, Scheduler, TimerToken};

use super::interpolator::{InterpState, Interpolator, StartOutcome};
use super::player::{
    Arrival, Directive, PlaybackError, PlaybackUpdate, PlayerState, PoseResolver, ScenePlayer,
};
use super::scene::SceneStep;

/// Interpolation frame period (~60 Hz)
pub const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Deferral before delivering the completion of an instant move
pub const SNAP_DELAY: Duration = Duration::from_millis(10);

/// Events handled on the animation domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionEvent {
    /// Interpolation frame for interpolator run `run`
    InterpTick { run: u64 },
    /// Deferred arrival after an instant move
    Arrived(Arrival),
    /// Hold timer for player run `run`
    HoldElapsed { run: u64 },
}

/// Drives motion on a single thread from scheduled events
pub struct Animator {
    joints: SharedJoints,
    interpolator: Interpolator<Arrival>,
    player: ScenePlayer,
    scheduler: Scheduler<MotionEvent>,
    hold_timer: Option<TimerToken>,
    observers: Vec<Sender<PlaybackUpdate>>,
}

impl Animator {
    pub fn new(joints: SharedJoints, clock: Arc<dyn Clock>, first_arrival: f64) -> Self {
        Self {
            interpolator: Interpolator::new(joints.clone()),
            joints,
            player: ScenePlayer::with_first_arrival(first_arrival),
            scheduler: Scheduler::new(clock),
            hold_timer: None,
            observers: Vec::new(),
        }
    }

    /// Receive a `PlaybackUpdate` after every player transition
    pub fn subscribe(&mut self) -> Receiver<PlaybackUpdate> {
        let (tx, rx) = unbounded();
        self.observers.push(tx);
        rx
    }

    /// Interpolate from the current state to `target` with no completion.
    pub fn move_to(&mut self, target: JointVector, duration: f64) {
        let from = self.joints.get();
        let now = self.scheduler.now();
        match self.interpolator.start(from, target, duration, now, None) {
            StartOutcome::Snapped { .. } => {}
            StartOutcome::Running { run } => {
                self.scheduler.after(Duration::ZERO, MotionEvent::InterpTick { run });
            }
        }
    }

    /// Validate and start a scene. Nothing changes if validation fails.
    pub fn play(
        &mut self,
        steps: Vec<SceneStep>,
        looping: bool,
        poses: &dyn PoseResolver,
    ) -> Result<(), PlaybackError> {
        let directive = self.player.play(steps, looping, poses)?;
        self.cancel_hold_timer();
        self.apply(directive);
        Ok(())
    }

    /// Stop scene playback. An interpolation already under way still reaches
    /// its target, but its completion is dropped.
    pub fn stop(&mut self) -> bool {
        let was_playing = self.player.stop();
        self.interpolator.clear_completion();
        self.cancel_hold_timer();
        if was_playing {
            self.notify();
        }
        was_playing
    }

    /// Dispatch every event that is due. Returns how many were handled.
    ///
    /// A pose vanishing mid-scene stops playback and is returned as an error;
    /// events still queued are left for the next call.
    pub fn pump(&mut self, poses: &dyn PoseResolver) -> Result<usize, PlaybackError> {
        let mut handled = 0;
        while let Some(event) = self.scheduler.pop_due() {
            handled += 1;
            self.dispatch(event.payload, poses)?;
        }
        Ok(handled)
    }

    fn dispatch(
        &mut self,
        event: MotionEvent,
        poses: &dyn PoseResolver,
    ) -> Result<(), PlaybackError> {
        match event {
            MotionEvent::InterpTick { run } => {
                if run != self.interpolator.run() || !self.interpolator.is_running() {
                    tracing::trace!(run, "Discarding stale interpolation tick");
                    return Ok(());
                }
                let tick = self.interpolator.tick(self.scheduler.now());
                if !tick.done {
                    self.scheduler.after(TICK_INTERVAL, MotionEvent::InterpTick { run });
                } else if let Some(arrival) = tick.completion {
                    let directive = self.player.on_arrival(arrival);
                    self.apply(directive);
                }
            }
            MotionEvent::Arrived(arrival) => {
                let directive = self.player.on_arrival(arrival);
                self.apply(directive);
            }
            MotionEvent::HoldElapsed { run } => {
                self.hold_timer = None;
                match self.player.on_hold_elapsed(run, poses) {
                    Ok(directive) => self.apply(directive),
                    Err(e) => {
                        self.interpolator.clear_completion();
                        self.notify();
                        return Err(e);
                    }
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::MoveTo {
                step,
                target,
                duration,
                arrival,
            } => {
                tracing::debug!(step, duration, "Moving to scene step");
                let from = self.joints.get();
                let now = self.scheduler.now();
                match self.interpolator.start(from, target, duration, now, Some(arrival)) {
                    StartOutcome::Snapped { completion } => {
                        if let Some(arrival) = completion {
                            self.scheduler.after(SNAP_DELAY, MotionEvent::Arrived(arrival));
                        }
                    }
                    StartOutcome::Running { run } => {
                        self.scheduler.after(Duration::ZERO, MotionEvent::InterpTick { run });
                    }
                }
                self.notify();
            }
            Directive::Hold { step, delay, run } => {
                tracing::debug!(step, delay_ms = delay.as_millis() as u64, "Holding scene step");
                let timer = self.scheduler.after(delay, MotionEvent::HoldElapsed { run });
                self.hold_timer = Some(timer);
                self.notify();
            }
            Directive::Finished => self.notify(),
            Directive::Ignored => {}
        }
    }

    fn cancel_hold_timer(&mut self) {
        if let Some(token) = self.hold_timer.take() {
            self.scheduler.cancel(token);
        }
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let update = self.player.update(self.scheduler.now());
        self.observers.retain(|tx| tx.send(update.clone()).is_ok());
    }

    /// Time until the next scheduled event, if any
    pub fn time_until_next(&self) -> Option<Duration> {
        self.scheduler.time_until_next()
    }

    /// True while a scene plays or an interpolation is running
    pub fn is_busy(&self) -> bool {
        self.player.is_playing() || self.interpolator.is_running()
    }

    pub fn player_state(&self) -> PlayerState {
        self.player.state()
    }

    pub fn interp_state(&self) -> InterpState {
        self.interpolator.state()
    }

    pub fn player(&self) -> &ScenePlayer {
        &self.player
    }

    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    pub fn pending_events(&self) -> usize {
        self.scheduler.pending()
    }
}
