//! Named background threads
//!
//! The publisher runs on its own thread while the animation domain stays on
//! the caller's. This module wraps `std::thread` with named spawning, a join
//! that reports panics as errors, and the sleep primitive the runtime loop
//! uses between events.


use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Error type for threading operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadError {
    /// Thread spawn failed
    SpawnFailed(String),
    /// Thread join failed
    JoinFailed(String),
}

impl std::fmt::Display for ThreadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThreadError::SpawnFailed(s) => write!(f, "Thread spawn failed: {}", s),
            ThreadError::JoinFailed(s) => write!(f, "Thread join failed: {}", s),
        }
    }
}

impl std::error::Error for ThreadError {}

pub type Result<T> = std::result::Result<T, ThreadError>;

// ============================================================================
// Thread Handle
// ============================================================================

/// Handle to a spawned thread
///
/// Dropping the handle detaches the thread; call `join` to wait for it.
pub struct Thread<T> {
    handle: Option<JoinHandle<T>>,
    name: Option<String>,
}

impl<T> Thread<T> {
    /// Spawn a new thread that executes the given function
    ///
    /// # Arguments
    /// * `name` - Optional thread name (shows up in panics and log output)
    /// * `f` - Function to execute in the new thread
    ///
    /// # Errors
    /// Returns `ThreadError::SpawnFailed` if thread creation fails
    pub fn spawn<F>(name: Option<&str>, f: F) -> Result<Self>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let mut builder = thread::Builder::new();
        if let Some(n) = name {
            builder = builder.name(n.to_string());
        }

        let handle = builder
            .spawn(f)
            .map_err(|e| ThreadError::SpawnFailed(format!("Failed to spawn thread: {}", e)))?;

        tracing::debug!(thread = name.unwrap_or("<unnamed>"), "Thread spawned");
        Ok(Self {
            handle: Some(handle),
            name: name.map(String::from),
        })
    }

    /// Wait for the thread to finish and return its result
    ///
    /// # Errors
    /// Returns `ThreadError::JoinFailed` if the thread panicked
    pub fn join(mut self) -> Result<T> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| {
                ThreadError::JoinFailed(format!(
                    "Thread '{}' panicked",
                    self.name.as_deref().unwrap_or("<unnamed>")
                ))
            }),
            None => Err(ThreadError::JoinFailed("Thread already joined".to_string())),
        }
    }

    /// Check if the thread is still running
    pub fn is_running(&self) -> bool {
        match &self.handle {
            Some(handle) => !handle.is_finished(),
            None => false,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

// ============================================================================
// Sleeping
// ============================================================================

/// Sleep the current thread
///
/// A zero duration yields instead of sleeping.
pub fn hibernate_thread(duration: Duration) {
    if duration.is_zero() {
        thread::yield_now();
    } else {
        thread::sleep(duration);
    }
}
