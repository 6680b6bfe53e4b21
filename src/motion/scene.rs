//! Scene model and the in-memory scene draft
//!
//! A step's `interp_time` is the time used to move *into the following
//! step*, not into the step itself. The first arrival of a play uses a fixed
//! default because no earlier step defines it.

use crate::input::{check_seconds, Field, InputError};

/// Default hold time for new steps (and for stored steps that omit it)
pub const DEFAULT_HOLD_TIME: f64 = 0.0;

/// Default interpolation time for new steps (and for stored steps that omit it)
pub const DEFAULT_STEP_INTERP_TIME: f64 = 1.0;

/// One step of a scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneStep {
    /// Pose referenced by name, resolved when the step plays
    pub pose_name: String,
    /// Seconds to stay at this pose before advancing
    pub hold_time: f64,
    /// Seconds to move from this pose into the next step's pose
    pub interp_time: f64,
}

impl SceneStep {
    /// Build a validated step
    pub fn new(
        pose_name: impl Into<String>,
        hold_time: f64,
        interp_time: f64,
    ) -> Result<Self, InputError> {
        let step = Self {
            pose_name: pose_name.into(),
            hold_time,
            interp_time,
        };
        step.validate()?;
        Ok(step)
    }

    /// Check both timings
    pub fn validate(&self) -> Result<(), InputError> {
        check_seconds(Field::HoldTime, self.hold_time)?;
        check_seconds(Field::InterpTime, self.interp_time)?;
        Ok(())
    }
}

/// A named, optionally looping sequence of steps
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub name: String,
    pub steps: Vec<SceneStep>,
    pub looping: bool,
    pub saved_at: String,
}

/// Errors from editing the draft
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DraftError {
    #[error("No step at position {index} (scene has {len} steps)")]
    NoSuchStep { index: usize, len: usize },

    #[error("Pose name must not be empty")]
    EmptyPoseName,

    #[error(transparent)]
    Input(#[from] InputError),
}

/// The scene being edited before it is played or saved
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneDraft {
    steps: Vec<SceneStep>,
    looping: bool,
}

impl SceneDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step at the end
    pub fn add_step(
        &mut self,
        pose_name: &str,
        hold_time: f64,
        interp_time: f64,
    ) -> Result<usize, DraftError> {
        let step = Self::checked_step(pose_name, hold_time, interp_time)?;
        self.steps.push(step);
        tracing::debug!(pose = pose_name, hold_time, interp_time, "Added scene step");
        Ok(self.steps.len() - 1)
    }

    /// Remove the step at `index`
    pub fn remove_step(&mut self, index: usize) -> Result<SceneStep, DraftError> {
        self.check_index(index)?;
        Ok(self.steps.remove(index))
    }

    /// Replace the pose and timings of an existing step
    pub fn edit_step(
        &mut self,
        index: usize,
        pose_name: &str,
        hold_time: f64,
        interp_time: f64,
    ) -> Result<(), DraftError> {
        self.check_index(index)?;
        self.steps[index] = Self::checked_step(pose_name, hold_time, interp_time)?;
        Ok(())
    }

    /// Swap a step with its predecessor. Returns the new position.
    /// The first step stays where it is.
    pub fn move_up(&mut self, index: usize) -> Result<usize, DraftError> {
        self.check_index(index)?;
        if index == 0 {
            return Ok(0);
        }
        self.steps.swap(index, index - 1);
        Ok(index - 1)
    }

    /// Swap a step with its successor. Returns the new position.
    /// The last step stays where it is.
    pub fn move_down(&mut self, index: usize) -> Result<usize, DraftError> {
        self.check_index(index)?;
        if index + 1 >= self.steps.len() {
            return Ok(index);
        }
        self.steps.swap(index, index + 1);
        Ok(index + 1)
    }

    /// Remove every step
    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// Replace the draft wholesale (used when a stored scene is loaded)
    pub fn replace(&mut self, steps: Vec<SceneStep>, looping: bool) {
        self.steps = steps;
        self.looping = looping;
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn steps(&self) -> &[SceneStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn check_index(&self, index: usize) -> Result<(), DraftError> {
        if index < self.steps.len() {
            Ok(())
        } else {
            Err(DraftError::NoSuchStep {
                index,
                len: self.steps.len(),
            })
        }
    }

    fn checked_step(
        pose_name: &str,
        hold_time: f64,
        interp_time: f64,
    ) -> Result<SceneStep, DraftError> {
        let pose_name = pose_name.trim();
        if pose_name.is_empty() {
            return Err(DraftError::EmptyPoseName);
        }
        Ok(SceneStep::new(pose_name, hold_time, interp_time)?)
    }
}
