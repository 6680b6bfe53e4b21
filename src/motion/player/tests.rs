//! Unit tests for the scene player state machine
//!
//! These drive the player directly, feeding arrivals and hold timers by hand,
//! so the transition order can be checked without any clock.

use super::*;
use crate::joints::NUM_JOINTS;
use std::collections::HashMap;

struct Poses(HashMap<String, JointVector>);

impl Poses {
    fn with(names: &[&str]) -> Self {
        let map = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.to_string(), [i as f64 * 0.1; NUM_JOINTS]))
            .collect();
        Poses(map)
    }

    fn remove(&mut self, name: &str) {
        self.0.remove(name);
    }
}

impl PoseResolver for Poses {
    fn resolve(&self, name: &str) -> Result<JointVector, ResolveError> {
        self.0.get(name).copied().ok_or(ResolveError::Missing)
    }
}

fn step(pose: &str, hold: f64, interp: f64) -> SceneStep {
    SceneStep::new(pose, hold, interp).unwrap()
}

fn arrival_of(directive: Directive) -> Arrival {
    match directive {
        Directive::MoveTo { arrival, .. } => arrival,
        other => panic!("unexpected {:?}", other),
    }
}

/// Feed completions until the player stops or `limit` transitions pass,
/// recording every state and the arrival durations used.
fn run_scene(
    player: &mut ScenePlayer,
    poses: &Poses,
    first: Directive,
    limit: usize,
) -> (Vec<PlayerState>, Vec<f64>) {
    let mut states = vec![player.state()];
    let mut durations = Vec::new();
    let mut directive = first;

    for _ in 0..limit {
        directive = match directive {
            Directive::MoveTo { duration, arrival, .. } => {
                durations.push(duration);
                player.on_arrival(arrival)
            }
            Directive::Hold { run, .. } => player.on_hold_elapsed(run, poses).unwrap(),
            Directive::Finished | Directive::Ignored => break,
        };
        states.push(player.state());
    }
    (states, durations)
}

#[test]
fn test_non_loop_visits_every_step_in_order() {
    let poses = Poses::with(&["a", "b", "c"]);
    let mut player = ScenePlayer::new();
    let first = player
        .play(vec![step("a", 0.0, 1.0), step("b", 1.0, 0.5), step("c", 0.0, 2.0)], false, &poses)
        .unwrap();

    let (states, durations) = run_scene(&mut player, &poses, first, 100);
    assert_eq!(
        states,
        vec![
            PlayerState::Moving(0),
            PlayerState::Holding(0),
            PlayerState::Moving(1),
            PlayerState::Holding(1),
            PlayerState::Moving(2),
            PlayerState::Holding(2),
            PlayerState::Stopped,
        ]
    );
    // First arrival is the default; later ones come from the previous step
    assert_eq!(durations, vec![DEFAULT_FIRST_ARRIVAL, 1.0, 0.5]);
}

#[test]
fn test_loop_returns_to_first_step_with_last_interp() {
    let poses = Poses::with(&["a", "b"]);
    let mut player = ScenePlayer::new();
    let first = player
        .play(vec![step("a", 0.1, 0.7), step("b", 0.2, 0.4)], true, &poses)
        .unwrap();

    let (states, durations) = run_scene(&mut player, &poses, first, 6);
    assert_eq!(
        states,
        vec![
            PlayerState::Moving(0),
            PlayerState::Holding(0),
            PlayerState::Moving(1),
            PlayerState::Holding(1),
            PlayerState::Moving(0),
            PlayerState::Holding(0),
            PlayerState::Moving(1),
        ]
    );
    assert_eq!(durations, vec![DEFAULT_FIRST_ARRIVAL, 0.7, 0.4]);
}

#[test]
fn test_preflight_rejects_missing_pose_without_state_change() {
    let poses = Poses::with(&["a"]);
    let mut player = ScenePlayer::new();
    let err = player
        .play(vec![step("a", 0.0, 1.0), step("ghost", 0.0, 1.0)], false, &poses)
        .unwrap_err();

    assert_eq!(err, PlaybackError::MissingPose("ghost".into()));
    assert_eq!(player.state(), PlayerState::Stopped);
    assert_eq!(player.run(), 0);
    assert!(player.steps().is_empty());
}

#[test]
fn test_preflight_rejects_empty_and_invalid() {
    let poses = Poses::with(&["a"]);
    let mut player = ScenePlayer::new();
    assert_eq!(player.play(Vec::new(), false, &poses), Err(PlaybackError::EmptyScene));

    let bad = SceneStep {
        pose_name: "a".into(),
        hold_time: -1.0,
        interp_time: 1.0,
    };
    match player.play(vec![step("a", 0.0, 1.0), bad], false, &poses) {
        Err(PlaybackError::InvalidStep { index, .. }) => assert_eq!(index, 1),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(player.state(), PlayerState::Stopped);
}

#[test]
fn test_failed_play_keeps_running_scene() {
    let poses = Poses::with(&["a"]);
    let mut player = ScenePlayer::new();
    player.play(vec![step("a", 0.0, 1.0)], false, &poses).unwrap();
    let run = player.run();

    assert!(player.play(vec![step("nope", 0.0, 1.0)], false, &poses).is_err());
    assert_eq!(player.state(), PlayerState::Moving(0));
    assert_eq!(player.run(), run);
}

#[test]
fn test_stop_discards_late_callbacks() {
    let poses = Poses::with(&["a", "b"]);
    let mut player = ScenePlayer::new();
    let steps = vec![step("a", 1.0, 1.0), step("b", 0.0, 1.0)];
    let arrival = arrival_of(player.play(steps, false, &poses).unwrap());

    assert!(player.stop());
    assert_eq!(player.pending_interp(), 0.0);
    assert_eq!(player.on_arrival(arrival), Directive::Ignored);
    assert_eq!(player.state(), PlayerState::Stopped);
    assert!(!player.stop());
}

#[test]
fn test_stale_hold_after_restart_is_ignored() {
    let poses = Poses::with(&["a", "b"]);
    let mut player = ScenePlayer::new();
    let steps = vec![step("a", 1.0, 1.0), step("b", 0.0, 1.0)];
    let arrival = arrival_of(player.play(steps, false, &poses).unwrap());
    let old_run = match player.on_arrival(arrival) {
        Directive::Hold { run, .. } => run,
        other => panic!("unexpected {:?}", other),
    };

    // Restart before the old hold fires
    player.play(vec![step("b", 0.0, 1.0)], false, &poses).unwrap();
    assert_eq!(player.on_hold_elapsed(old_run, &poses), Ok(Directive::Ignored));
    assert_eq!(player.state(), PlayerState::Moving(0));
}

#[test]
fn test_pose_vanishing_mid_play_aborts() {
    let mut poses = Poses::with(&["a", "b"]);
    let mut player = ScenePlayer::new();
    let steps = vec![step("a", 0.0, 1.0), step("b", 0.0, 1.0)];
    let arrival = arrival_of(player.play(steps, false, &poses).unwrap());
    let run = match player.on_arrival(arrival) {
        Directive::Hold { run, .. } => run,
        other => panic!("unexpected {:?}", other),
    };

    poses.remove("b");
    assert_eq!(
        player.on_hold_elapsed(run, &poses),
        Err(PlaybackError::PoseVanished { step: 1, pose: "b".into() })
    );
    assert_eq!(player.state(), PlayerState::Stopped);
}

#[test]
fn test_hold_delay_rounding() {
    assert_eq!(hold_delay(0.0), MIN_HOLD_DELAY);
    assert_eq!(hold_delay(0.0004), MIN_HOLD_DELAY);
    assert_eq!(hold_delay(0.001), Duration::from_millis(1));
    assert_eq!(hold_delay(2.0), Duration::from_secs(2));
}

#[test]
fn test_update_describe() {
    let poses = Poses::with(&["wave"]);
    let mut player = ScenePlayer::new();
    let steps = vec![step("wave", 1.0, 1.0)];
    let arrival = arrival_of(player.play(steps, false, &poses).unwrap());
    assert_eq!(player.update(0.0).describe(), "Step 1/1: wave (moving 3.0s)");
    player.on_arrival(arrival);
    assert_eq!(player.update(3.0).describe(), "Step 1/1: wave (holding 1.0s)");
    player.stop();
    assert_eq!(player.update(3.5).describe(), "Stopped");
}
