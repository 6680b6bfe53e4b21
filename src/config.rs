use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::controller::MotionSettings;
use crate::joints::{joint_vector_from_slice, JointVector, DEFAULT_STANDING_ANGLES};
use crate::logging::LogLevel;
use crate::motion::DEFAULT_FIRST_ARRIVAL;
use crate::input::DEFAULT_INTERP_TIME;
use crate::propfile::{PropertyError, PropertyFile};
use crate::publish::{
    PublisherConfig, DEFAULT_RATE_HZ, DEFAULT_STANDING_HEIGHT, DEFAULT_TELEMETRY_KEY,
    DEFAULT_TELEMETRY_URL,
};

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "sequencer.cfg";

/// Accepted publish rates
pub const RATE_RANGE: std::ops::RangeInclusive<u32> = 1..=1000;

/// Application options that can be set via CLI or config file
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    // Storage
    pub store_dir: PathBuf,
    pub poses_file: String,
    pub scenes_file: String,

    // Publishing. `sink_dir` wins over `telemetry_url`; an empty URL keeps
    // frames in process.
    pub sink_dir: Option<PathBuf>,
    pub telemetry_url: String,
    pub telemetry_key: String,
    pub publish_rate_hz: u32,
    pub publish_on_start: bool,
    pub standing_height: f64,

    // Motion
    pub first_arrival_time: f64,
    pub interp_time: f64,
    pub default_angles: JointVector,

    pub log_level: LogLevel,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("."),
            poses_file: "saved_poses.json".to_string(),
            scenes_file: "saved_scenes.json".to_string(),
            sink_dir: None,
            telemetry_url: DEFAULT_TELEMETRY_URL.to_string(),
            telemetry_key: DEFAULT_TELEMETRY_KEY.to_string(),
            publish_rate_hz: DEFAULT_RATE_HZ,
            publish_on_start: true,
            standing_height: DEFAULT_STANDING_HEIGHT,
            first_arrival_time: DEFAULT_FIRST_ARRIVAL,
            interp_time: DEFAULT_INTERP_TIME,
            default_angles: DEFAULT_STANDING_ANGLES,
            log_level: LogLevel::Info,
        }
    }
}

impl Options {
    pub fn poses_path(&self) -> PathBuf {
        self.store_dir.join(&self.poses_file)
    }

    pub fn scenes_path(&self) -> PathBuf {
        self.store_dir.join(&self.scenes_file)
    }

    pub fn publisher_config(&self) -> PublisherConfig {
        PublisherConfig {
            key: self.telemetry_key.clone(),
            rate_hz: self.publish_rate_hz,
            standing_height: self.standing_height,
        }
    }

    pub fn motion_settings(&self) -> MotionSettings {
        MotionSettings {
            first_arrival: self.first_arrival_time,
            interp_time: self.interp_time,
            default_angles: self.default_angles,
        }
    }

    /// Apply every recognised key of `props`. Unknown keys are warned about.
    pub fn apply_properties(&mut self, props: &PropertyFile) -> Result<()> {
        for (key, value) in props.iter() {
            match key {
                "store_dir" => self.store_dir = PathBuf::from(value),
                "poses_file" => self.poses_file = parse_file_name(key, value)?,
                "scenes_file" => self.scenes_file = parse_file_name(key, value)?,
                "sink_dir" => {
                    self.sink_dir = if value.is_empty() { None } else { Some(PathBuf::from(value)) }
                }
                "telemetry_url" => self.telemetry_url = value.to_string(),
                "telemetry_key" => {
                    if value.is_empty() {
                        anyhow::bail!("telemetry_key must not be empty");
                    }
                    self.telemetry_key = value.to_string();
                }
                "publish_rate_hz" => self.publish_rate_hz = parse_rate(value)?,
                "publish_on_start" => self.publish_on_start = parse_bool(key, value)?,
                "standing_height" => self.standing_height = parse_float(key, value)?,
                "first_arrival_time" => self.first_arrival_time = parse_time(key, value)?,
                "interp_time" => self.interp_time = parse_time(key, value)?,
                "default_angles" => self.default_angles = parse_angles(value)?,
                "log_level" => self.log_level = parse_log_level(value)?,
                other => tracing::warn!(key = other, "Ignoring unknown config key"),
            }
        }
        Ok(())
    }
}

/// Load configuration from `path`, or `sequencer.cfg` in the working
/// directory when no path is given. A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Options> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut options = Options::default();

    match PropertyFile::load(&path) {
        Ok(props) => {
            options
                .apply_properties(&props)
                .with_context(|| format!("Invalid config file {}", path.display()))?;
            tracing::debug!(path = %path.display(), keys = props.len(), "Config loaded");
        }
        Err(PropertyError::FileNotFound) => {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
        }
        Err(e) => {
            return Err(anyhow::Error::new(e))
                .with_context(|| format!("Failed to read {}", path.display()));
        }
    }
    Ok(options)
}

/// Parse a publish rate in Hz (1-1000)
pub fn parse_rate(s: &str) -> Result<u32> {
    let rate: u32 = s.trim().parse().context("Invalid publish rate")?;
    if !RATE_RANGE.contains(&rate) {
        anyhow::bail!("Publish rate out of range (1 to 1000 Hz)");
    }
    Ok(rate)
}

/// Parse a non-negative time in seconds
pub fn parse_time(key: &str, s: &str) -> Result<f64> {
    let value = parse_float(key, s)?;
    if value < 0.0 {
        anyhow::bail!("{} must not be negative", key);
    }
    Ok(value)
}

/// Parse 29 comma-separated joint angles
pub fn parse_angles(s: &str) -> Result<JointVector> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Invalid default_angles value")?;
    if values.iter().any(|v| !v.is_finite()) {
        anyhow::bail!("default_angles must be finite numbers");
    }
    Ok(joint_vector_from_slice(&values)?)
}

/// Parse a log level name
pub fn parse_log_level(s: &str) -> Result<LogLevel> {
    LogLevel::from_name(s).with_context(|| {
        format!("Invalid log level: {}. Valid options: off, error, warn, info, debug, trace", s)
    })
}

fn parse_float(key: &str, s: &str) -> Result<f64> {
    let value: f64 = s.trim().parse().with_context(|| format!("Invalid {} value", key))?;
    if !value.is_finite() {
        anyhow::bail!("{} must be a finite number", key);
    }
    Ok(value)
}

fn parse_bool(key: &str, s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => anyhow::bail!("Invalid {} value: {}", key, s),
    }
}

fn parse_file_name(key: &str, s: &str) -> Result<String> {
    if s.is_empty() {
        anyhow::bail!("{} must not be empty", key);
    }
    Ok(s.to_string())
}
