//! Fixed-rate state publisher
//!
//! Runs on its own thread, independent of the animation timeline. Each tick
//! takes a snapshot of the joint state, builds a frame and writes it to the
//! sink. Failures are logged and counted; they never stop the loop and never
//! feed back into the joint state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Sender};

use crate::joints::SharedJoints;
use crate::threading::{self, Thread, ThreadError};

use super::frame::{PublishFrame, DEFAULT_STANDING_HEIGHT};
use super::sink::{SinkResult, TelemetrySink};

/// Key the frames are published under unless configured otherwise
pub const DEFAULT_TELEMETRY_KEY: &str = "action_body_unitree_g1_with_hands";

/// Default publish cadence
pub const DEFAULT_RATE_HZ: u32 = 50;

/// Publisher settings
#[derive(Debug, Clone, PartialEq)]
pub struct PublisherConfig {
    pub key: String,
    pub rate_hz: u32,
    pub standing_height: f64,
}

impl PublisherConfig {
    /// Interval between ticks. A zero rate is treated as 1 Hz.
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.rate_hz.max(1) as f64)
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_TELEMETRY_KEY.to_string(),
            rate_hz: DEFAULT_RATE_HZ,
            standing_height: DEFAULT_STANDING_HEIGHT,
        }
    }
}

/// Shared on/off toggle, readable from the publisher thread
#[derive(Debug, Clone)]
pub struct PublishSwitch(Arc<AtomicBool>);

impl PublishSwitch {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn set(&self, enabled: bool) {
        let was = self.0.swap(enabled, Ordering::Relaxed);
        if was != enabled {
            tracing::info!(enabled, "Publishing toggled");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counters snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishStats {
    pub published: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    published: AtomicU64,
    failed: AtomicU64,
}

/// Outcome of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Disabled,
    /// The sink reported itself offline; nothing was attempted
    Offline,
    Published,
    Failed,
}

pub struct StatePublisher {
    joints: SharedJoints,
    sink: Arc<dyn TelemetrySink>,
    config: PublisherConfig,
    switch: PublishSwitch,
    counters: Arc<Counters>,
}

impl StatePublisher {
    pub fn new(
        joints: SharedJoints,
        sink: Arc<dyn TelemetrySink>,
        config: PublisherConfig,
        enabled: bool,
    ) -> Self {
        Self {
            joints,
            sink,
            config,
            switch: PublishSwitch::new(enabled),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Handle for turning publishing on and off
    pub fn switch(&self) -> PublishSwitch {
        self.switch.clone()
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Run one publish tick
    pub fn publish_once(&self) -> TickOutcome {
        if !self.switch.is_enabled() {
            return TickOutcome::Disabled;
        }
        if !self.sink.is_online() {
            return TickOutcome::Offline;
        }
        match self.write_frame() {
            Ok(()) => {
                self.counters.published.fetch_add(1, Ordering::Relaxed);
                TickOutcome::Published
            }
            Err(e) => {
                let failed = self.counters.failed.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(key = %self.config.key, error = %e, failed, "Publish failed");
                TickOutcome::Failed
            }
        }
    }

    fn write_frame(&self) -> SinkResult<()> {
        let frame = PublishFrame::from_joints(&self.joints.get(), self.config.standing_height);
        let payload = frame.to_json()?;
        self.sink.write(&self.config.key, &payload)
    }

    pub fn stats(&self) -> PublishStats {
        snapshot(&self.counters)
    }

    /// Move the publisher onto its own thread, ticking at the configured rate
    pub fn spawn(self) -> Result<PublisherHandle, ThreadError> {
        let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(1);
        let switch = self.switch.clone();
        let counters = self.counters.clone();
        let period = self.config.period();

        let thread = Thread::spawn(Some("state-publisher"), move || {
            tracing::info!(
                key = %self.config.key,
                rate_hz = self.config.rate_hz,
                "Publisher started"
            );
            let ticker = channel::tick(period);
            loop {
                crossbeam::select! {
                    recv(ticker) -> _ => {
                        self.publish_once();
                    }
                    recv(shutdown_rx) -> _ => break,
                }
            }
            let stats = self.stats();
            tracing::info!(published = stats.published, failed = stats.failed, "Publisher stopped");
        })?;

        Ok(PublisherHandle {
            switch,
            counters,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }
}

fn snapshot(counters: &Counters) -> PublishStats {
    PublishStats {
        published: counters.published.load(Ordering::Relaxed),
        failed: counters.failed.load(Ordering::Relaxed),
    }
}

/// Handle to a running publisher thread
///
/// Dropping the handle stops the thread without waiting for it.
pub struct PublisherHandle {
    switch: PublishSwitch,
    counters: Arc<Counters>,
    shutdown: Option<Sender<()>>,
    thread: Option<Thread<()>>,
}

impl PublisherHandle {
    pub fn switch(&self) -> PublishSwitch {
        self.switch.clone()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.switch.set(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.switch.is_enabled()
    }

    pub fn stats(&self) -> PublishStats {
        snapshot(&self.counters)
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| t.is_running())
    }

    /// Stop the thread and wait for it to exit
    pub fn shutdown(mut self) -> Result<PublishStats, ThreadError> {
        self.stop_and_join()?;
        Ok(self.stats())
    }

    fn stop_and_join(&mut self) -> Result<(), ThreadError> {
        // Disconnecting the channel wakes the select
        drop(self.shutdown.take());
        match self.thread.take() {
            Some(thread) => thread.join(),
            None => Ok(()),
        }
    }
}

impl Drop for PublisherHandle {
    fn drop(&mut self) {
        drop(self.shutdown.take());
    }
}

/// Wait roughly `ticks` publish periods; test and CLI helper
pub fn wait_ticks(config: &PublisherConfig, ticks: u32) {
    threading::hibernate_thread(config.period() * ticks);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joints::{JointState, NUM_JOINTS};
    use crate::publish::sink::{MemorySink, SinkError};

    struct BrokenSink;

    impl TelemetrySink for BrokenSink {
        fn write(&self, _key: &str, _payload: &str) -> SinkResult<()> {
            Err(SinkError::Unavailable("connection refused".into()))
        }
    }

    fn publisher(sink: Arc<dyn TelemetrySink>, enabled: bool) -> (StatePublisher, SharedJoints) {
        let joints = JointState::shared([0.0; NUM_JOINTS]);
        (StatePublisher::new(joints.clone(), sink, PublisherConfig::default(), enabled), joints)
    }

    #[test]
    fn test_publish_once_writes_frame() {
        let sink = Arc::new(MemorySink::new());
        let (publisher, joints) = publisher(sink.clone(), true);
        joints.set_angle(3, 0.42).unwrap();

        assert_eq!(publisher.publish_once(), TickOutcome::Published);
        let payload = sink.get(DEFAULT_TELEMETRY_KEY).unwrap();
        let values: Vec<f64> = serde_json::from_str(&payload).unwrap();
        assert_eq!(values.len(), 35);
        assert_eq!(values[2], 0.75);
        assert!((values[6 + 3] - 0.42).abs() < 1e-12);
        assert_eq!(publisher.stats(), PublishStats { published: 1, failed: 0 });
    }

    #[test]
    fn test_disabled_is_noop() {
        let sink = Arc::new(MemorySink::new());
        let (publisher, _joints) = publisher(sink.clone(), false);
        assert_eq!(publisher.publish_once(), TickOutcome::Disabled);
        assert!(sink.get(DEFAULT_TELEMETRY_KEY).is_none());

        publisher.switch().set(true);
        assert_eq!(publisher.publish_once(), TickOutcome::Published);
    }

    #[test]
    fn test_failures_are_counted_not_fatal() {
        let (publisher, joints) = publisher(Arc::new(BrokenSink), true);
        let before = joints.get();
        for _ in 0..3 {
            assert_eq!(publisher.publish_once(), TickOutcome::Failed);
        }
        assert_eq!(publisher.stats(), PublishStats { published: 0, failed: 3 });
        assert_eq!(joints.get(), before);
    }

    struct OfflineSink;

    impl TelemetrySink for OfflineSink {
        fn write(&self, _key: &str, _payload: &str) -> SinkResult<()> {
            panic!("offline sink must not be written");
        }

        fn is_online(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_offline_sink_skips_ticks() {
        let (publisher, _joints) = publisher(Arc::new(OfflineSink), true);
        assert_eq!(publisher.publish_once(), TickOutcome::Offline);
        assert_eq!(publisher.stats(), PublishStats::default());
    }

    #[test]
    fn test_period() {
        let mut config = PublisherConfig::default();
        assert_eq!(config.period(), Duration::from_millis(20));
        config.rate_hz = 0;
        assert_eq!(config.period(), Duration::from_secs(1));
    }

    #[test]
    fn test_thread_publishes_and_shuts_down() {
        let sink = Arc::new(MemorySink::new());
        let (publisher, _joints) = publisher(sink.clone(), true);
        let config = publisher.config().clone();
        let handle = publisher.spawn().unwrap();

        wait_ticks(&config, 10);
        assert!(handle.is_running());
        let stats = handle.shutdown().unwrap();
        assert!(stats.published >= 1);
        assert!(sink.get(DEFAULT_TELEMETRY_KEY).is_some());
    }
}
