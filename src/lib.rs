//! Joint-motion sequencing engine
//!
//! Interpolates a 29-joint humanoid between poses, plays multi-step scenes
//! with hold and arrival timings, and publishes the live joint state to a
//! telemetry sink at a fixed rate on a background thread.

pub mod cli;
pub mod config;
pub mod controller;
pub mod input;
pub mod joints;
pub mod logging;
pub mod motion;
pub mod propfile;
pub mod publish;
pub mod runtime;
pub mod store;
pub mod threading;
pub mod time;

pub use cli::Cli;
pub use config::Options;
pub use controller::{ControlError, Controller, MotionSettings};
pub use joints::{JointState, JointVector, NUM_JOINTS};
pub use logging::LogLevel;
pub use runtime::Runtime;
