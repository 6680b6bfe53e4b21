//! Fixed joint layout for the 29-DoF humanoid
//!
//! Index, name and limit correspondence is fixed here and never reordered.
//! Limits come from the robot URDF and are informational only: they bound
//! input ranges but programmatic writes are not clamped against them.

/// Number of actuated joints
pub const NUM_JOINTS: usize = 29;

/// A complete joint-angle vector in radians
pub type JointVector = [f64; NUM_JOINTS];

/// Joint names, indexed by joint
pub const JOINT_NAMES: [&str; NUM_JOINTS] = [
    // Legs (0-11)
    "left_hip_pitch",
    "left_hip_roll",
    "left_hip_yaw",
    "left_knee",
    "left_ankle_pitch",
    "left_ankle_roll",
    "right_hip_pitch",
    "right_hip_roll",
    "right_hip_yaw",
    "right_knee",
    "right_ankle_pitch",
    "right_ankle_roll",
    // Waist (12-14)
    "waist_yaw",
    "waist_roll",
    "waist_pitch",
    // Arms (15-28)
    "left_shoulder_pitch",
    "left_shoulder_roll",
    "left_shoulder_yaw",
    "left_elbow",
    "left_wrist_roll",
    "left_wrist_pitch",
    "left_wrist_yaw",
    "right_shoulder_pitch",
    "right_shoulder_roll",
    "right_shoulder_yaw",
    "right_elbow",
    "right_wrist_roll",
    "right_wrist_pitch",
    "right_wrist_yaw",
];

/// `(min, max)` limits in radians, indexed by joint
pub const JOINT_LIMITS: [(f64, f64); NUM_JOINTS] = [
    (-2.5307, 2.8798),
    (-0.5236, 2.9671),
    (-2.7576, 2.7576),
    (-0.0873, 2.8798),
    (-0.8727, 0.5236),
    (-0.2618, 0.2618),
    (-2.5307, 2.8798),
    (-2.9671, 0.5236),
    (-2.7576, 2.7576),
    (-0.0873, 2.8798),
    (-0.8727, 0.5236),
    (-0.2618, 0.2618),
    (-2.618, 2.618),
    (-0.52, 0.52),
    (-0.52, 0.52),
    (-3.0892, 2.6704),
    (-1.5882, 2.2515),
    (-2.618, 2.618),
    (-1.0472, 2.0944),
    (-1.9722, 1.9722),
    (-1.6144, 1.6144),
    (-1.6144, 1.6144),
    (-3.0892, 2.6704),
    (-2.2515, 1.5882),
    (-2.618, 2.618),
    (-1.0472, 2.0944),
    (-1.9722, 1.9722),
    (-1.6144, 1.6144),
    (-1.6144, 1.6144),
];

/// A left-to-right mirror mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorPair {
    pub left: usize,
    pub right: usize,
    /// Negate the value when mirroring (roll and yaw axes)
    pub flip: bool,
}

const fn pair(left: usize, right: usize, flip: bool) -> MirrorPair {
    MirrorPair { left, right, flip }
}

/// Symmetric-control pairs. Only the left side is a key.
pub const MIRROR_PAIRS: [MirrorPair; 13] = [
    pair(0, 6, false),
    pair(1, 7, true),
    pair(2, 8, true),
    pair(3, 9, false),
    pair(4, 10, false),
    pair(5, 11, true),
    pair(15, 22, false),
    pair(16, 23, true),
    pair(17, 24, true),
    pair(18, 25, false),
    pair(19, 26, false),
    pair(20, 27, false),
    pair(21, 28, false),
];

/// Built-in standing pose used when no `default_angles` are configured
pub const DEFAULT_STANDING_ANGLES: JointVector = [
    -0.2, 0.0, 0.0, 0.42, -0.23, 0.0, //
    -0.2, 0.0, 0.0, 0.42, -0.23, 0.0, //
    0.0, 0.0, 0.0, //
    0.35, 0.18, 0.0, 0.87, 0.0, 0.0, 0.0, //
    0.35, -0.18, 0.0, 0.87, 0.0, 0.0, 0.0,
];

/// Look up the mirror target for a left-side joint
pub fn mirror_of(index: usize) -> Option<MirrorPair> {
    MIRROR_PAIRS.iter().copied().find(|p| p.left == index)
}

/// Get a joint name by index
pub fn joint_name(index: usize) -> Option<&'static str> {
    JOINT_NAMES.get(index).copied()
}

/// Find a joint index by name
pub fn joint_index(name: &str) -> Option<usize> {
    JOINT_NAMES.iter().position(|n| *n == name)
}

/// Get the `(min, max)` limit for a joint
pub fn joint_limits(index: usize) -> Option<(f64, f64)> {
    JOINT_LIMITS.get(index).copied()
}

/// Joint names as owned strings, in index order (used in saved poses)
pub fn joint_names_owned() -> Vec<String> {
    JOINT_NAMES.iter().map(|n| n.to_string()).collect()
}

/// Check whether a value lies inside a joint's limits. Never used to clamp.
pub fn within_limits(index: usize, value: f64) -> bool {
    joint_limits(index)
        .map(|(lo, hi)| value >= lo && value <= hi)
        .unwrap_or(false)
}
