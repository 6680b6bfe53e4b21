//! Real-time driver
//!
//! Wires the stores, the sink and the publisher thread to a controller and
//! runs the animation domain on the calling thread. Between events the loop
//! sleeps until the next one is due, but never longer than one interpolation
//! frame, so freshly scheduled work is picked up promptly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Options;
use crate::controller::{ControlError, Controller};
use crate::joints::{JointState, SharedJoints};
use crate::motion::TICK_INTERVAL;
use crate::publish::{
    FileSink, MemorySink, PublishFrame, PublishStats, PublisherHandle, RedisSink, SinkError,
    StatePublisher, TelemetrySink,
};
use crate::store::{JsonFileStore, PoseDocument, SceneDocument};
use crate::threading::{hibernate_thread, ThreadError};
use crate::time::SystemClock;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Telemetry sink: {0}")]
    Sink(#[from] SinkError),

    #[error("{0}")]
    Thread(#[from] ThreadError),

    #[error(transparent)]
    Control(#[from] ControlError),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

pub struct Runtime {
    controller: Controller,
    joints: SharedJoints,
    publisher: Option<PublisherHandle>,
    standing_height: f64,
}

impl Runtime {
    /// Build everything from options and start the publisher thread
    pub fn start(options: &Options) -> RuntimeResult<Self> {
        Self::with_sink(options, open_sink(options)?)
    }

    /// Like `start`, publishing to `sink`
    pub fn with_sink(options: &Options, sink: Arc<dyn TelemetrySink>) -> RuntimeResult<Self> {
        let joints = JointState::shared(options.default_angles);

        let publisher = StatePublisher::new(
            joints.clone(),
            sink,
            options.publisher_config(),
            options.publish_on_start,
        );
        let switch = publisher.switch();
        let handle = publisher.spawn()?;

        let controller = Controller::new(
            joints.clone(),
            Arc::new(SystemClock::new()),
            Arc::new(JsonFileStore::<PoseDocument>::new(options.poses_path())),
            Arc::new(JsonFileStore::<SceneDocument>::new(options.scenes_path())),
            switch,
            options.motion_settings(),
        );

        tracing::info!(
            poses = %options.poses_path().display(),
            scenes = %options.scenes_path().display(),
            publishing = options.publish_on_start,
            "Runtime started"
        );
        Ok(Self {
            controller,
            joints,
            publisher: Some(handle),
            standing_height: options.standing_height,
        })
    }

    pub fn controller(&mut self) -> &mut Controller {
        &mut self.controller
    }

    /// The frame the publisher would send right now
    pub fn current_frame(&self) -> PublishFrame {
        PublishFrame::from_joints(&self.joints.get(), self.standing_height)
    }

    pub fn publish_stats(&self) -> PublishStats {
        self.publisher.as_ref().map(|p| p.stats()).unwrap_or_default()
    }

    /// Drive the animation domain for `duration`
    pub fn run_for(&mut self, duration: Duration) -> RuntimeResult<()> {
        let deadline = Instant::now() + duration;
        while Instant::now() < deadline {
            self.step(deadline)?;
        }
        Ok(())
    }

    /// Drive until no scene plays and no interpolation runs, or until
    /// `limit` passes. Returns whether the system went idle.
    pub fn run_until_idle(&mut self, limit: Option<Duration>) -> RuntimeResult<bool> {
        let deadline = limit.map(|l| Instant::now() + l);
        loop {
            if !self.controller.is_busy() {
                return Ok(true);
            }
            let now = Instant::now();
            if deadline.is_some_and(|d| now >= d) {
                return Ok(false);
            }
            self.step(deadline.unwrap_or(now + TICK_INTERVAL))?;
        }
    }

    fn step(&mut self, deadline: Instant) -> RuntimeResult<()> {
        self.controller.pump()?;
        let wait = self
            .controller
            .time_until_next()
            .map_or(TICK_INTERVAL, |next| next.min(TICK_INTERVAL));
        let remaining = deadline.saturating_duration_since(Instant::now());
        hibernate_thread(wait.min(remaining));
        Ok(())
    }

    /// Stop playback and the publisher thread
    pub fn shutdown(mut self) -> RuntimeResult<PublishStats> {
        self.controller.stop_scene();
        let stats = match self.publisher.take() {
            Some(handle) => handle.shutdown()?,
            None => PublishStats::default(),
        };
        tracing::info!(published = stats.published, failed = stats.failed, "Runtime stopped");
        Ok(stats)
    }
}

/// The sink `options` asks for: a file directory when `sink_dir` is set,
/// otherwise the Redis server at `telemetry_url`, or memory when that is empty
pub fn open_sink(options: &Options) -> RuntimeResult<Arc<dyn TelemetrySink>> {
    let sink: Arc<dyn TelemetrySink> = match &options.sink_dir {
        Some(dir) => Arc::new(FileSink::new(dir)?),
        None if options.telemetry_url.trim().is_empty() => Arc::new(MemorySink::new()),
        None => Arc::new(RedisSink::connect(options.telemetry_url.trim())?),
    };
    Ok(sink)
}
