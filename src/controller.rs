//! Control surface
//!
//! The single entry point front ends talk to. Every operation validates its
//! input before touching any state and reports failures as `ControlError`.
//! The controller lives on the animation domain; only the joint state and
//! the publish switch are shared with the publisher thread.

use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::Receiver;

use crate::input::{self, check_joint_value, parse_seconds, Field, InputError, DEFAULT_INTERP_TIME};
use crate::joints::{JointError, JointVector, SharedJoints, DEFAULT_STANDING_ANGLES, NUM_JOINTS};
use crate::motion::{
    Animator, DraftError, PlaybackError, PlaybackUpdate, PlayerState, SceneDraft, SceneStep,
    DEFAULT_FIRST_ARRIVAL,
};
use crate::publish::PublishSwitch;
use crate::store::{PoseDocument, PoseStore, SceneDocument, SceneStore, StoreError, StoredPoses};
use crate::time::Clock;

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Joint(JointError),

    #[error("Pose '{0}' not found")]
    MissingPose(String),

    #[error("Pose has {actual} joint values, expected {expected}")]
    JointCountMismatch { expected: usize, actual: usize },

    #[error("Scene '{0}' not found")]
    MissingScene(String),

    #[error("Scene has no steps")]
    EmptyScene,

    #[error("Name must not be empty")]
    EmptyName,

    #[error(transparent)]
    Playback(PlaybackError),

    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type ControlResult<T> = Result<T, ControlError>;

impl From<PlaybackError> for ControlError {
    fn from(e: PlaybackError) -> Self {
        match e {
            PlaybackError::MissingPose(name) => ControlError::MissingPose(name),
            PlaybackError::EmptyScene => ControlError::EmptyScene,
            other => ControlError::Playback(other),
        }
    }
}

impl From<JointError> for ControlError {
    fn from(e: JointError) -> Self {
        match e {
            JointError::CountMismatch { expected, actual } => {
                ControlError::JointCountMismatch { expected, actual }
            }
            other => ControlError::Joint(other),
        }
    }
}

/// Motion defaults applied by the controller
#[derive(Debug, Clone, PartialEq)]
pub struct MotionSettings {
    /// Arrival time for the first step of a scene
    pub first_arrival: f64,
    /// Duration of direct moves (pose loads, resets)
    pub interp_time: f64,
    /// Target of `reset_to_default`
    pub default_angles: JointVector,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            first_arrival: DEFAULT_FIRST_ARRIVAL,
            interp_time: DEFAULT_INTERP_TIME,
            default_angles: DEFAULT_STANDING_ANGLES,
        }
    }
}

/// Listing entry for a stored pose
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSummary {
    pub name: String,
    pub saved_at: String,
    pub description: String,
}

/// Listing entry for a stored scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSummary {
    pub name: String,
    pub steps: usize,
    pub looping: bool,
    pub saved_at: String,
}

pub struct Controller {
    joints: SharedJoints,
    animator: Animator,
    poses: Arc<PoseStore>,
    scenes: Arc<SceneStore>,
    publish: PublishSwitch,
    draft: SceneDraft,
    interp_time: f64,
    default_angles: JointVector,
}

impl Controller {
    pub fn new(
        joints: SharedJoints,
        clock: Arc<dyn Clock>,
        poses: Arc<PoseStore>,
        scenes: Arc<SceneStore>,
        publish: PublishSwitch,
        settings: MotionSettings,
    ) -> Self {
        Self {
            animator: Animator::new(joints.clone(), clock, settings.first_arrival),
            joints,
            poses,
            scenes,
            publish,
            draft: SceneDraft::new(),
            interp_time: settings.interp_time,
            default_angles: settings.default_angles,
        }
    }

    // ------------------------------------------------------------------
    // Joints
    // ------------------------------------------------------------------

    /// Write one joint immediately (mirrored when mirror mode is on)
    pub fn set_joint_target(&self, index: usize, value: f64) -> ControlResult<()> {
        let value = check_joint_value(value)?;
        self.joints.set_angle(index, value)?;
        Ok(())
    }

    /// Interpolate every joint to `targets`. An unusable duration falls back
    /// to the default instead of refusing the move.
    pub fn set_all_targets(
        &mut self,
        targets: JointVector,
        duration: Option<f64>,
    ) -> ControlResult<()> {
        for value in targets {
            check_joint_value(value)?;
        }
        let duration = input::duration_or_default(duration);
        self.direct_move(targets, duration);
        Ok(())
    }

    pub fn reset_to_default(&mut self) {
        self.direct_move(self.default_angles, self.interp_time);
    }

    pub fn zero_all(&mut self) {
        self.direct_move([0.0; NUM_JOINTS], self.interp_time);
    }

    pub fn toggle_mirror(&self, enabled: bool) {
        self.joints.set_mirror(enabled);
        tracing::info!(enabled, "Mirror mode toggled");
    }

    pub fn toggle_publish(&self, enabled: bool) {
        self.publish.set(enabled);
    }

    /// Set the direct-move duration from text
    pub fn set_interp_time(&mut self, text: &str) -> ControlResult<f64> {
        self.interp_time = parse_seconds(Field::InterpTime, text)?;
        Ok(self.interp_time)
    }

    pub fn interp_time(&self) -> f64 {
        self.interp_time
    }

    pub fn joints(&self) -> JointVector {
        self.joints.get()
    }

    fn direct_move(&mut self, target: JointVector, duration: f64) {
        // A playing scene would otherwise lose its arrival to this move
        self.animator.stop();
        self.animator.move_to(target, duration);
    }

    // ------------------------------------------------------------------
    // Poses
    // ------------------------------------------------------------------

    /// Move to a stored pose over the current interpolation time
    pub fn load_pose(&mut self, name: &str) -> ControlResult<()> {
        self.move_to_pose(name, self.interp_time)
    }

    /// Move to a stored pose over `duration` seconds given as text.
    /// Unreadable text moves over the default time rather than failing.
    pub fn interpolate_to_pose(&mut self, name: &str, duration: &str) -> ControlResult<f64> {
        let duration = input::parse_duration_or_default(duration);
        self.move_to_pose(name, duration)?;
        Ok(duration)
    }

    fn move_to_pose(&mut self, name: &str, duration: f64) -> ControlResult<()> {
        let doc = self
            .poses
            .load(name)?
            .ok_or_else(|| ControlError::MissingPose(name.to_string()))?;
        let target = doc.angles()?;
        tracing::info!(pose = name, duration, "Loading pose");
        self.direct_move(target, duration);
        Ok(())
    }

    /// Store the current joint state under `name`, overwriting any pose of that name
    pub fn save_current_as_pose(&self, name: &str) -> ControlResult<()> {
        let name = non_empty(name)?;
        let doc = PoseDocument::capture(name, &self.joints.get());
        self.poses.save(name, doc)?;
        Ok(())
    }

    pub fn delete_pose(&self, name: &str) -> ControlResult<()> {
        if self.poses.delete(name)? {
            Ok(())
        } else {
            Err(ControlError::MissingPose(name.to_string()))
        }
    }

    pub fn poses(&self) -> ControlResult<Vec<PoseSummary>> {
        Ok(self
            .poses
            .load_all()?
            .into_iter()
            .map(|(name, doc)| PoseSummary {
                name,
                saved_at: doc.timestamp,
                description: doc.description,
            })
            .collect())
    }

    // ------------------------------------------------------------------
    // Scenes
    // ------------------------------------------------------------------

    /// Validate and play `steps`. On error nothing starts and a running
    /// scene keeps running.
    pub fn play_scene(&mut self, steps: Vec<SceneStep>, looping: bool) -> ControlResult<()> {
        let poses = StoredPoses(&*self.poses);
        self.animator.play(steps, looping, &poses)?;
        Ok(())
    }

    /// Play the draft being edited
    pub fn play_draft(&mut self) -> ControlResult<()> {
        let steps = self.draft.steps().to_vec();
        let looping = self.draft.looping();
        self.play_scene(steps, looping)
    }

    /// Play a stored scene by name
    pub fn play_stored_scene(&mut self, name: &str, looping: Option<bool>) -> ControlResult<()> {
        let scene = self
            .scenes
            .load(name)?
            .ok_or_else(|| ControlError::MissingScene(name.to_string()))?
            .into_scene(name);
        self.play_scene(scene.steps, looping.unwrap_or(scene.looping))
    }

    pub fn stop_scene(&mut self) -> bool {
        self.animator.stop()
    }

    pub fn draft(&self) -> &SceneDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut SceneDraft {
        &mut self.draft
    }

    /// Store the draft under `name`
    pub fn save_scene(&self, name: &str) -> ControlResult<()> {
        let name = non_empty(name)?;
        if self.draft.is_empty() {
            return Err(ControlError::EmptyScene);
        }
        let doc = SceneDocument::capture(self.draft.steps(), self.draft.looping());
        self.scenes.save(name, doc)?;
        Ok(())
    }

    /// Replace the draft (steps and loop flag) with a stored scene
    pub fn load_scene(&mut self, name: &str) -> ControlResult<()> {
        let scene = self
            .scenes
            .load(name)?
            .ok_or_else(|| ControlError::MissingScene(name.to_string()))?
            .into_scene(name);
        tracing::info!(
            scene = name,
            steps = scene.steps.len(),
            looping = scene.looping,
            "Scene loaded"
        );
        self.draft.replace(scene.steps, scene.looping);
        Ok(())
    }

    pub fn delete_scene(&self, name: &str) -> ControlResult<()> {
        if self.scenes.delete(name)? {
            Ok(())
        } else {
            Err(ControlError::MissingScene(name.to_string()))
        }
    }

    pub fn scenes(&self) -> ControlResult<Vec<SceneSummary>> {
        Ok(self
            .scenes
            .load_all()?
            .into_iter()
            .map(|(name, doc)| SceneSummary {
                name,
                steps: doc.steps.len(),
                looping: doc.looping,
                saved_at: doc.timestamp,
            })
            .collect())
    }

    // ------------------------------------------------------------------
    // Animation domain
    // ------------------------------------------------------------------

    /// Run every due motion event
    pub fn pump(&mut self) -> ControlResult<usize> {
        let poses = StoredPoses(&*self.poses);
        Ok(self.animator.pump(&poses)?)
    }

    pub fn time_until_next(&self) -> Option<Duration> {
        self.animator.time_until_next()
    }

    pub fn subscribe(&mut self) -> Receiver<PlaybackUpdate> {
        self.animator.subscribe()
    }

    pub fn player_state(&self) -> PlayerState {
        self.animator.player_state()
    }

    pub fn is_busy(&self) -> bool {
        self.animator.is_busy()
    }
}

fn non_empty(name: &str) -> ControlResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(ControlError::EmptyName)
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joints::JointState;
    use crate::store::{DocumentStore, MemoryStore};
    use crate::time::ManualClock;

    struct Fixture {
        controller: Controller,
        clock: ManualClock,
        joints: SharedJoints,
        poses: Arc<MemoryStore<PoseDocument>>,
        switch: PublishSwitch,
    }

    fn fixture() -> Fixture {
        let clock = ManualClock::new();
        let joints = JointState::shared([0.0; NUM_JOINTS]);
        let poses = Arc::new(MemoryStore::<PoseDocument>::new());
        let scenes = Arc::new(MemoryStore::<SceneDocument>::new());
        let switch = PublishSwitch::new(true);
        let controller = Controller::new(
            joints.clone(),
            Arc::new(clock.clone()),
            poses.clone(),
            scenes,
            switch.clone(),
            MotionSettings::default(),
        );
        Fixture {
            controller,
            clock,
            joints,
            poses,
            switch,
        }
    }

    fn settle(f: &mut Fixture, seconds: u64) {
        for _ in 0..seconds * 100 {
            f.clock.advance(Duration::from_millis(10));
            f.controller.pump().unwrap();
        }
    }

    fn save_pose(f: &Fixture, name: &str, value: f64) {
        f.poses.save(name, PoseDocument::capture(name, &[value; NUM_JOINTS])).unwrap();
    }

    #[test]
    fn test_set_joint_target_validates() {
        let f = fixture();
        f.controller.set_joint_target(3, 0.5).unwrap();
        assert_eq!(f.joints.angle(3).unwrap(), 0.5);
        assert!(matches!(
            f.controller.set_joint_target(29, 0.0),
            Err(ControlError::Joint(JointError::IndexOutOfRange { index: 29 }))
        ));
        assert!(matches!(f.controller.set_joint_target(0, f64::NAN), Err(ControlError::Input(_))));
    }

    #[test]
    fn test_mirror_and_publish_toggles() {
        let f = fixture();
        f.controller.toggle_mirror(true);
        f.controller.set_joint_target(1, 0.3).unwrap();
        assert_eq!(f.joints.angle(7).unwrap(), -0.3);

        f.controller.toggle_publish(false);
        assert!(!f.switch.is_enabled());
    }

    #[test]
    fn test_save_and_load_pose() {
        let mut f = fixture();
        f.joints.set_all([0.4; NUM_JOINTS]);
        f.controller.save_current_as_pose(" lean ").unwrap();
        f.joints.set_all([0.0; NUM_JOINTS]);

        f.controller.load_pose(" lean ").unwrap();
        settle(&mut f, 3);
        assert_eq!(f.controller.joints(), [0.4; NUM_JOINTS]);

        let listing = f.controller.poses().unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].name, "lean");
        assert_eq!(listing[0].description, "Custom pose: lean");
    }

    #[test]
    fn test_pose_errors() {
        let mut f = fixture();
        assert!(matches!(f.controller.load_pose("nope"), Err(ControlError::MissingPose(_))));
        assert!(matches!(f.controller.save_current_as_pose("  "), Err(ControlError::EmptyName)));
        assert!(matches!(f.controller.delete_pose("nope"), Err(ControlError::MissingPose(_))));

        f.poses
            .save(
                "broken",
                PoseDocument {
                    angles: vec![0.0; 28],
                    joint_names: Vec::new(),
                    timestamp: String::new(),
                    description: String::new(),
                },
            )
            .unwrap();
        assert!(matches!(
            f.controller.load_pose("broken"),
            Err(ControlError::JointCountMismatch { expected: 29, actual: 28 })
        ));
    }

    #[test]
    fn test_play_scene_missing_pose_changes_nothing() {
        let mut f = fixture();
        save_pose(&f, "a", 1.0);
        let before = f.joints.get();
        let steps = vec![
            SceneStep::new("a", 0.0, 1.0).unwrap(),
            SceneStep::new("ghost", 0.0, 1.0).unwrap(),
        ];

        match f.controller.play_scene(steps, false) {
            Err(ControlError::MissingPose(name)) => assert_eq!(name, "ghost"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(f.controller.player_state(), PlayerState::Stopped);
        settle(&mut f, 1);
        assert_eq!(f.joints.get(), before);
    }

    #[test]
    fn test_direct_move_stops_scene() {
        let mut f = fixture();
        save_pose(&f, "a", 1.0);
        f.controller
            .play_scene(vec![SceneStep::new("a", 0.0, 1.0).unwrap()], true)
            .unwrap();
        assert!(f.controller.is_busy());

        f.controller.zero_all();
        assert_eq!(f.controller.player_state(), PlayerState::Stopped);
        settle(&mut f, 3);
        assert_eq!(f.joints.get(), [0.0; NUM_JOINTS]);
        assert_eq!(f.controller.player_state(), PlayerState::Stopped);
    }

    #[test]
    fn test_interp_time_setting() {
        let mut f = fixture();
        assert_eq!(f.controller.set_interp_time("0.5").unwrap(), 0.5);
        assert!(f.controller.set_interp_time("-2").is_err());
        assert_eq!(f.controller.interp_time(), 0.5);

        f.controller.reset_to_default();
        f.clock.advance(Duration::from_millis(600));
        f.controller.pump().unwrap();
        f.controller.pump().unwrap();
        assert_eq!(f.joints.get(), DEFAULT_STANDING_ANGLES);
    }

    #[test]
    fn test_set_all_targets_falls_back_on_bad_duration() {
        let mut f = fixture();
        f.controller.set_all_targets([0.2; NUM_JOINTS], Some(-1.0)).unwrap();
        f.clock.advance(Duration::from_millis(1900));
        f.controller.pump().unwrap();
        f.controller.pump().unwrap();
        assert_ne!(f.joints.get(), [0.2; NUM_JOINTS]);
        settle(&mut f, 1);
        assert_eq!(f.joints.get(), [0.2; NUM_JOINTS]);
    }

    #[test]
    fn test_interpolate_to_pose_falls_back_on_unreadable_duration() {
        let mut f = fixture();
        save_pose(&f, "wave", 0.6);
        f.controller.set_interp_time("0.5").unwrap();

        assert_eq!(f.controller.interpolate_to_pose("wave", "fast").unwrap(), DEFAULT_INTERP_TIME);
        // The configured direct-move time is left alone
        assert_eq!(f.controller.interp_time(), 0.5);

        f.clock.advance(Duration::from_millis(1900));
        f.controller.pump().unwrap();
        f.controller.pump().unwrap();
        assert_ne!(f.joints.get(), [0.6; NUM_JOINTS]);
        settle(&mut f, 1);
        assert_eq!(f.joints.get(), [0.6; NUM_JOINTS]);
    }

    #[test]
    fn test_interpolate_to_pose_uses_given_duration() {
        let mut f = fixture();
        save_pose(&f, "wave", 0.6);
        assert_eq!(f.controller.interpolate_to_pose("wave", " 0.25 ").unwrap(), 0.25);
        f.clock.advance(Duration::from_millis(300));
        f.controller.pump().unwrap();
        f.controller.pump().unwrap();
        assert_eq!(f.joints.get(), [0.6; NUM_JOINTS]);

        assert!(matches!(
            f.controller.interpolate_to_pose("ghost", "1"),
            Err(ControlError::MissingPose(_))
        ));
    }

    #[test]
    fn test_scene_draft_save_load_cycle() {
        let mut f = fixture();
        assert!(matches!(f.controller.save_scene("empty"), Err(ControlError::EmptyScene)));

        f.controller.draft_mut().add_step("a", 0.5, 1.0).unwrap();
        f.controller.draft_mut().add_step("b", 0.0, 2.0).unwrap();
        f.controller.draft_mut().set_looping(true);
        f.controller.save_scene("routine").unwrap();

        f.controller.draft_mut().clear();
        f.controller.draft_mut().set_looping(false);
        f.controller.load_scene("routine").unwrap();
        assert_eq!(f.controller.draft().len(), 2);
        assert!(f.controller.draft().looping());

        let listing = f.controller.scenes().unwrap();
        assert_eq!(listing[0].name, "routine");
        assert_eq!(listing[0].steps, 2);

        f.controller.delete_scene("routine").unwrap();
        assert!(matches!(f.controller.load_scene("routine"), Err(ControlError::MissingScene(_))));
    }

    #[test]
    fn test_play_draft_runs_to_completion() {
        let mut f = fixture();
        save_pose(&f, "a", 0.5);
        f.controller.draft_mut().add_step("a", 0.0, 1.0).unwrap();
        let updates = f.controller.subscribe();

        f.controller.play_draft().unwrap();
        settle(&mut f, 4);

        assert_eq!(f.controller.player_state(), PlayerState::Stopped);
        assert_eq!(f.joints.get(), [0.5; NUM_JOINTS]);
        let states: Vec<PlayerState> = updates.try_iter().map(|u| u.state).collect();
        assert_eq!(
            states,
            vec![PlayerState::Moving(0), PlayerState::Holding(0), PlayerState::Stopped]
        );
    }
}
