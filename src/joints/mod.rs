//! Joint layout and the shared joint-angle state

pub mod layout;
pub mod state;

pub use layout::{
    joint_index, joint_limits, joint_name, joint_names_owned, mirror_of, within_limits,
    JointVector, MirrorPair, DEFAULT_STANDING_ANGLES, JOINT_LIMITS, JOINT_NAMES, MIRROR_PAIRS,
    NUM_JOINTS,
};
pub use state::{joint_vector_from_slice, JointError, JointResult, JointState, SharedJoints};
