use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::{parse_log_level, parse_rate, Options};
use crate::logging::LogLevel;

/// Joint sequencer - drive a 29-DoF humanoid through poses and scenes
#[derive(Parser, Debug, Default)]
#[command(name = "joint-sequencer")]
#[command(version)]
#[command(about = "Joint pose sequencer with fixed-rate telemetry publishing", long_about = None)]
pub struct Cli {
    /// Configuration file (key = value)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the pose and scene files
    #[arg(short, long, value_name = "DIR", global = true)]
    pub store_dir: Option<PathBuf>,

    /// Write telemetry frames to files in this directory
    #[arg(long, value_name = "DIR", global = true)]
    pub sink_dir: Option<PathBuf>,

    /// Redis URL telemetry is sent to; empty keeps frames in process
    #[arg(long, value_name = "URL", global = true)]
    pub telemetry_url: Option<String>,

    /// Start with publishing disabled
    #[arg(long, global = true)]
    pub no_publish: bool,

    /// Publish rate in Hz (1-1000)
    #[arg(short, long, value_name = "HZ", global = true)]
    pub rate: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(short, long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Play a stored scene until it finishes (or forever when looping)
    Play {
        /// Scene name
        scene: String,
        /// Loop the scene regardless of its stored flag
        #[arg(long = "loop")]
        looping: bool,
    },
    /// Move to a stored pose
    Pose {
        /// Pose name
        name: String,
        /// Interpolation time in seconds
        #[arg(short, long, value_name = "SECONDS")]
        duration: Option<String>,
    },
    /// List stored poses and scenes
    List,
    /// Copy poses and scenes from YAML files written by the older tool
    Import {
        /// YAML pose file (e.g. saved_poses.yaml)
        #[arg(long, value_name = "FILE")]
        poses: Option<PathBuf>,
        /// YAML scene file (e.g. saved_scenes.yaml)
        #[arg(long, value_name = "FILE")]
        scenes: Option<PathBuf>,
    },
    /// Hold the current pose and keep publishing
    Stream {
        /// Stop after this many seconds
        #[arg(long, value_name = "SECONDS")]
        seconds: Option<f64>,
    },
}

impl Cli {
    /// Level to log at before the config file is read. An unusable
    /// `--log-level` is reported later by `merge_into_options`.
    pub fn initial_log_level(&self) -> LogLevel {
        self.log_level
            .as_deref()
            .and_then(LogLevel::from_name)
            .unwrap_or(LogLevel::Info)
    }

    /// Merge CLI arguments into the options struct
    pub fn merge_into_options(&self, mut opts: Options) -> Result<Options> {
        if let Some(ref dir) = self.store_dir {
            opts.store_dir = dir.clone();
        }

        if let Some(ref dir) = self.sink_dir {
            opts.sink_dir = Some(dir.clone());
        }

        if let Some(ref url) = self.telemetry_url {
            opts.telemetry_url = url.clone();
        }

        if self.no_publish {
            opts.publish_on_start = false;
        }

        if let Some(ref rate) = self.rate {
            opts.publish_rate_hz = parse_rate(rate)?;
        }

        if let Some(ref level) = self.log_level {
            opts.log_level = parse_log_level(level)?;
        }

        Ok(opts)
    }
}
