//! Telemetry frame layout
//!
//! `[vx, vy, pz, roll, pitch, yaw_rate, j0 .. j28]`. Only the height is a
//! non-zero constant; the base velocities and orientation are always zero.

use crate::joints::{JointVector, NUM_JOINTS};

/// Number of base fields ahead of the joint angles
pub const BASE_FIELDS: usize = 6;

/// Total frame length
pub const FRAME_LEN: usize = BASE_FIELDS + NUM_JOINTS;

/// Index of the standing height in the frame
pub const HEIGHT_INDEX: usize = 2;

/// Height published when nothing else is configured
pub const DEFAULT_STANDING_HEIGHT: f64 = 0.75;

/// One published frame, built fresh from a joint snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PublishFrame([f64; FRAME_LEN]);

impl PublishFrame {
    pub fn from_joints(angles: &JointVector, standing_height: f64) -> Self {
        let mut values = [0.0; FRAME_LEN];
        values[HEIGHT_INDEX] = standing_height;
        values[BASE_FIELDS..].copy_from_slice(angles);
        Self(values)
    }

    pub fn values(&self) -> &[f64; FRAME_LEN] {
        &self.0
    }

    pub fn joints(&self) -> &[f64] {
        &self.0[BASE_FIELDS..]
    }

    /// Encode as a flat JSON array
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0[..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let mut angles = [0.0; NUM_JOINTS];
        angles[0] = 0.5;
        angles[28] = -1.25;
        let frame = PublishFrame::from_joints(&angles, DEFAULT_STANDING_HEIGHT);

        let v = frame.values();
        assert_eq!(v.len(), 35);
        assert_eq!(&v[..BASE_FIELDS], &[0.0, 0.0, 0.75, 0.0, 0.0, 0.0]);
        assert_eq!(v[6], 0.5);
        assert_eq!(v[34], -1.25);
        assert_eq!(frame.joints(), &angles[..]);
    }

    #[test]
    fn test_json_is_flat_array() {
        let frame = PublishFrame::from_joints(&[0.0; NUM_JOINTS], 0.75);
        let json = frame.to_json().unwrap();
        let parsed: Vec<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), FRAME_LEN);
        assert_eq!(parsed[HEIGHT_INDEX], 0.75);
        assert!(json.starts_with('[') && json.ends_with(']'));
    }
}
