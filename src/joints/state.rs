//! Shared joint-angle state
//!
//! The vector is read by the publisher thread and written by the animation
//! domain. Every read is a full copy taken under the lock, so a reader never
//! sees a half-applied write (including a mirrored pair).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::layout::{mirror_of, JointVector, NUM_JOINTS};

/// Errors raised by joint-state writes
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JointError {
    #[error("Joint index {index} out of range (robot has 29 joints)")]
    IndexOutOfRange { index: usize },

    #[error("Joint count mismatch: expected {expected}, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

pub type JointResult<T> = Result<T, JointError>;

/// Convert a loosely-sized angle list into a fixed joint vector
pub fn joint_vector_from_slice(values: &[f64]) -> JointResult<JointVector> {
    JointVector::try_from(values).map_err(|_| JointError::CountMismatch {
        expected: NUM_JOINTS,
        actual: values.len(),
    })
}

/// Handle shared between the animation domain and the publisher
pub type SharedJoints = Arc<JointState>;

/// The live 29-joint angle vector plus the mirror-mode flag
#[derive(Debug)]
pub struct JointState {
    angles: RwLock<JointVector>,
    mirror: AtomicBool,
}

impl JointState {
    /// Create a joint state starting at `initial`
    pub fn new(initial: JointVector) -> Self {
        Self {
            angles: RwLock::new(initial),
            mirror: AtomicBool::new(false),
        }
    }

    /// Create a shared handle starting at `initial`
    pub fn shared(initial: JointVector) -> SharedJoints {
        Arc::new(Self::new(initial))
    }

    /// Snapshot copy of all angles
    pub fn get(&self) -> JointVector {
        *self.angles.read()
    }

    /// Read a single angle
    pub fn angle(&self, index: usize) -> JointResult<f64> {
        self.angles
            .read()
            .get(index)
            .copied()
            .ok_or(JointError::IndexOutOfRange { index })
    }

    /// Write one angle, mirroring to the paired right joint when enabled.
    ///
    /// Limits are not enforced. Writing a right-side joint never mirrors back.
    pub fn set_angle(&self, index: usize, value: f64) -> JointResult<()> {
        if index >= NUM_JOINTS {
            return Err(JointError::IndexOutOfRange { index });
        }

        let mirrored = if self.mirror_enabled() {
            mirror_of(index).map(|p| (p.right, if p.flip { -value } else { value }))
        } else {
            None
        };

        let mut angles = self.angles.write();
        angles[index] = value;
        if let Some((right, v)) = mirrored {
            angles[right] = v;
        }
        Ok(())
    }

    /// Replace the whole vector
    pub fn set_all(&self, values: JointVector) {
        *self.angles.write() = values;
    }

    /// Enable or disable symmetric mirroring for future writes
    pub fn set_mirror(&self, enabled: bool) {
        self.mirror.store(enabled, Ordering::SeqCst);
    }

    pub fn mirror_enabled(&self) -> bool {
        self.mirror.load(Ordering::SeqCst)
    }
}

impl Default for JointState {
    fn default() -> Self {
        Self::new([0.0; NUM_JOINTS])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joints::layout::MIRROR_PAIRS;
    use rstest::rstest;

    #[test]
    fn test_get_is_a_copy() {
        let state = JointState::default();
        let mut snapshot = state.get();
        snapshot[0] = 1.0;
        assert_eq!(state.get()[0], 0.0);
    }

    #[test]
    fn test_set_angle_out_of_range() {
        let state = JointState::default();
        assert_eq!(
            state.set_angle(NUM_JOINTS, 0.5),
            Err(JointError::IndexOutOfRange { index: NUM_JOINTS })
        );
        assert_eq!(state.get(), [0.0; NUM_JOINTS]);
    }

    #[test]
    fn test_limits_not_enforced() {
        let state = JointState::default();
        state.set_angle(5, 10.0).unwrap();
        assert_eq!(state.angle(5).unwrap(), 10.0);
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_mirror_invariant_all_pairs(#[case] enabled: bool) {
        for p in MIRROR_PAIRS {
            let state = JointState::new([0.25; NUM_JOINTS]);
            state.set_mirror(enabled);
            state.set_angle(p.left, 0.7).unwrap();

            let angles = state.get();
            assert_eq!(angles[p.left], 0.7);
            let expected = match (enabled, p.flip) {
                (false, _) => 0.25,
                (true, true) => -0.7,
                (true, false) => 0.7,
            };
            assert_eq!(angles[p.right], expected, "pair {:?}", p);
        }
    }

    #[test]
    fn test_mirror_is_one_directional() {
        let state = JointState::default();
        state.set_mirror(true);
        state.set_angle(7, 0.4).unwrap();
        assert_eq!(state.angle(1).unwrap(), 0.0);
        assert_eq!(state.angle(7).unwrap(), 0.4);
    }

    #[test]
    fn test_mirror_toggle_not_retroactive() {
        let state = JointState::default();
        state.set_angle(0, 0.3).unwrap();
        state.set_mirror(true);
        assert_eq!(state.angle(6).unwrap(), 0.0);
    }

    #[test]
    fn test_joint_vector_from_slice() {
        let ok = joint_vector_from_slice(&[0.1; NUM_JOINTS]).unwrap();
        assert_eq!(ok[28], 0.1);

        assert_eq!(
            joint_vector_from_slice(&[0.0; 12]),
            Err(JointError::CountMismatch { expected: 29, actual: 12 })
        );
    }
}
