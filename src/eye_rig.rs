//! Eye camera rig
//!
//! Derives both eye poses from a single HMD pose. Offsets are applied along
//! the HMD's own axes so that translation and rotation compose correctly.
//! Left-handed: +X right, +Y up, +Z forward.

use glam::{DMat4, DQuat, DVec3, EulerRot};

use crate::eye::{Eye, EyePair};
use crate::optics::{DerivedOptics, OpticalConfig};

/// World pose of the HMD (the display plane)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HmdPose {
    pub position: DVec3,
    pub orientation: DQuat,
}

impl HmdPose {
    pub const IDENTITY: Self = Self {
        position: DVec3::ZERO,
        orientation: DQuat::IDENTITY,
    };

    pub fn new(position: DVec3, orientation: DQuat) -> Self {
        Self {
            position,
            orientation: orientation.normalize(),
        }
    }

    /// Yaw/pitch/roll in radians, applied in YXZ order
    pub fn from_euler(position: DVec3, yaw: f64, pitch: f64, roll: f64) -> Self {
        Self::new(position, DQuat::from_euler(EulerRot::YXZ, yaw, pitch, roll))
    }

    /// (yaw, pitch, roll) in radians
    pub fn euler(&self) -> (f64, f64, f64) {
        self.orientation.to_euler(EulerRot::YXZ)
    }

    pub fn axes(&self) -> LocalAxes {
        LocalAxes::from_orientation(self.orientation)
    }

    /// Move along the HMD's local axes
    pub fn translate_local(&mut self, delta: DVec3) {
        self.position += self.orientation * delta;
    }

    /// Rotate about the HMD's local axes
    pub fn rotate_local(&mut self, yaw: f64, pitch: f64, roll: f64) {
        let delta = DQuat::from_euler(EulerRot::YXZ, yaw, pitch, roll);
        self.orientation = (self.orientation * delta).normalize();
    }
}

impl Default for HmdPose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Orthonormal basis of an orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalAxes {
    pub right: DVec3,
    pub up: DVec3,
    pub forward: DVec3,
}

impl LocalAxes {
    pub fn from_orientation(orientation: DQuat) -> Self {
        Self {
            right: orientation * DVec3::X,
            up: orientation * DVec3::Y,
            forward: orientation * DVec3::Z,
        }
    }
}

/// World position and view matrix of one eye
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyePose {
    pub position: DVec3,
    pub view: DMat4,
}

/// The two scalars of the optical state the rig depends on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeRig {
    pub ipd: f64,
    pub dist_eye_to_display: f64,
}

impl EyeRig {
    pub fn new(config: &OpticalConfig, optics: &DerivedOptics) -> Self {
        Self {
            ipd: config.ipd,
            dist_eye_to_display: optics.dist_eye_to_display,
        }
    }

    pub fn eye_position(&self, pose: &HmdPose, eye: Eye) -> DVec3 {
        let axes = pose.axes();
        pose.position + axes.right * (eye.sign() * self.ipd / 2.0)
            - axes.forward * self.dist_eye_to_display
    }

    /// The eye looks straight down the lens axis; it is not aimable on its own.
    pub fn compute_view(&self, pose: &HmdPose, eye: Eye) -> EyePose {
        let axes = pose.axes();
        let position = self.eye_position(pose, eye);
        let view = DMat4::look_at_lh(position, position + axes.forward, axes.up);
        EyePose { position, view }
    }

    pub fn update_pose(&self, pose: &HmdPose) -> EyePair<EyePose> {
        EyePair::from_fn(|eye| self.compute_view(pose, eye))
    }
}
