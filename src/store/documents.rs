//! Stored document schema
//!
//! Poses and scenes are stored as JSON objects keyed by name. Field names
//! follow the on-disk format, so the scene's loop flag is stored as `loop`.

use serde::{Deserialize, Serialize};

use crate::joints::{joint_names_owned, joint_vector_from_slice, JointResult, JointVector};
use crate::motion::{Scene, SceneStep, DEFAULT_HOLD_TIME, DEFAULT_STEP_INTERP_TIME};

/// Timestamp format used in stored documents
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local time formatted for a document
pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// A named joint configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub name: String,
    pub angles: JointVector,
    pub joint_names: Vec<String>,
    pub saved_at: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseDocument {
    pub angles: Vec<f64>,
    #[serde(default)]
    pub joint_names: Vec<String>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub description: String,
}

impl PoseDocument {
    /// Capture `angles` as a new pose document stamped with the current time
    pub fn capture(name: &str, angles: &JointVector) -> Self {
        Self {
            angles: angles.to_vec(),
            joint_names: joint_names_owned(),
            timestamp: timestamp_now(),
            description: format!("Custom pose: {}", name),
        }
    }

    /// The stored angles as a joint vector; the count must match exactly
    pub fn angles(&self) -> JointResult<JointVector> {
        joint_vector_from_slice(&self.angles)
    }

    pub fn into_pose(self, name: &str) -> JointResult<Pose> {
        Ok(Pose {
            name: name.to_string(),
            angles: self.angles()?,
            joint_names: self.joint_names,
            saved_at: self.timestamp,
            description: self.description,
        })
    }
}

fn default_interp_time() -> f64 {
    DEFAULT_STEP_INTERP_TIME
}

fn default_hold_time() -> f64 {
    DEFAULT_HOLD_TIME
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDocument {
    pub pose_name: String,
    #[serde(default = "default_hold_time")]
    pub hold_time: f64,
    #[serde(default = "default_interp_time")]
    pub interp_time: f64,
}

impl From<&SceneStep> for StepDocument {
    fn from(step: &SceneStep) -> Self {
        Self {
            pose_name: step.pose_name.clone(),
            hold_time: step.hold_time,
            interp_time: step.interp_time,
        }
    }
}

impl From<StepDocument> for SceneStep {
    fn from(doc: StepDocument) -> Self {
        // Timings are validated when the scene is played
        SceneStep {
            pose_name: doc.pose_name,
            hold_time: doc.hold_time,
            interp_time: doc.interp_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub steps: Vec<StepDocument>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(rename = "loop", default)]
    pub looping: bool,
}

impl SceneDocument {
    /// Capture a step list as a new scene document
    pub fn capture(steps: &[SceneStep], looping: bool) -> Self {
        Self {
            steps: steps.iter().map(StepDocument::from).collect(),
            timestamp: timestamp_now(),
            looping,
        }
    }

    pub fn into_scene(self, name: &str) -> Scene {
        Scene {
            name: name.to_string(),
            steps: self.steps.into_iter().map(SceneStep::from).collect(),
            looping: self.looping,
            saved_at: self.timestamp,
        }
    }
}
