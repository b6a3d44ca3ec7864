//! HMD pose drivers
//!
//! Either a scripted animation (for demos and when no tracking is available)
//! or manual control from stick/keyboard deltas.

use std::f64::consts::FRAC_PI_2;

use glam::{DQuat, DVec2, DVec3};
use log::info;

use crate::eye_rig::HmdPose;

/// Stick values below this magnitude are treated as zero
pub const DEADZONE: f64 = 0.1;

/// Keep pitch just short of straight up/down
const MAX_PITCH: f64 = FRAC_PI_2 - 0.01;

/// Scripted head motion: a slow look-around plus breathing and sway
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseAnimator {
    base: HmdPose,
    time: f64,
    /// Peak yaw of the look-around sweep (radians)
    pub yaw_amplitude: f64,
    /// Angular frequency of the sweep (radians per second)
    pub yaw_rate: f64,
}

impl PoseAnimator {
    pub fn new(base: HmdPose) -> Self {
        Self {
            base,
            time: 0.0,
            yaw_amplitude: 0.6,
            yaw_rate: 0.4,
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn base(&self) -> HmdPose {
        self.base
    }

    /// Advance the script and return the pose for the new time
    pub fn update(&mut self, dt: f64) -> HmdPose {
        self.time += dt.max(0.0);
        self.sample(self.time)
    }

    pub fn sample(&self, t: f64) -> HmdPose {
        let yaw = self.yaw_amplitude * (t * self.yaw_rate).sin();
        let breathing = (t * 0.5).sin() * 0.01;
        let sway = (t * 0.3).sin() * 0.005;

        let (base_yaw, base_pitch, base_roll) = self.base.euler();
        HmdPose::from_euler(
            self.base.position,
            base_yaw + yaw,
            base_pitch + breathing,
            base_roll + sway,
        )
    }

    /// Restart the script from t = 0
    pub fn reset(&mut self) {
        self.time = 0.0;
        info!("Pose animation reset");
    }

    /// Level the base orientation and restart, keeping the base position
    pub fn recenter(&mut self) {
        self.base = HmdPose::new(self.base.position, DQuat::IDENTITY);
        self.reset();
    }
}

/// One frame of user input, in stick units `[-1, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PoseInput {
    /// x = strafe right, y = move forward
    pub move_stick: DVec2,
    /// x = yaw right, y = pitch up
    pub look_stick: DVec2,
    /// + = rise
    pub vertical: f64,
}

impl PoseInput {
    pub fn with_deadzone(self) -> Self {
        let dz = |v: f64| if v.abs() < DEADZONE { 0.0 } else { v.clamp(-1.0, 1.0) };
        Self {
            move_stick: DVec2::new(dz(self.move_stick.x), dz(self.move_stick.y)),
            look_stick: DVec2::new(dz(self.look_stick.x), dz(self.look_stick.y)),
            vertical: dz(self.vertical),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.move_stick == DVec2::ZERO && self.look_stick == DVec2::ZERO && self.vertical == 0.0
    }
}

/// Speeds applied to full stick deflection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSpeeds {
    /// meters per second
    pub translate: f64,
    /// radians per second
    pub turn: f64,
}

impl Default for InputSpeeds {
    fn default() -> Self {
        Self {
            translate: 1.0,
            turn: 1.5,
        }
    }
}

/// Apply user input in the HMD's local frame. Yaw turns about world up so
/// the horizon stays level; pitch is clamped.
pub fn apply_input(pose: &mut HmdPose, input: &PoseInput, speeds: &InputSpeeds, dt: f64) {
    let input = input.with_deadzone();
    if input.is_idle() || dt <= 0.0 {
        return;
    }

    let delta = DVec3::new(input.move_stick.x, input.vertical, input.move_stick.y);
    pose.translate_local(delta * speeds.translate * dt);

    let (yaw, pitch, roll) = pose.euler();
    let yaw = yaw + input.look_stick.x * speeds.turn * dt;
    let pitch = (pitch - input.look_stick.y * speeds.turn * dt).clamp(-MAX_PITCH, MAX_PITCH);
    *pose = HmdPose::from_euler(pose.position, yaw, pitch, roll);
}

/// Where the HMD pose comes from each frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PoseDriver {
    Scripted(PoseAnimator),
    #[default]
    Manual,
}

impl PoseDriver {
    pub fn is_scripted(&self) -> bool {
        matches!(self, PoseDriver::Scripted(_))
    }

    /// Produce the pose for this frame
    pub fn advance(
        &mut self,
        pose: &mut HmdPose,
        input: &PoseInput,
        speeds: &InputSpeeds,
        dt: f64,
    ) {
        match self {
            PoseDriver::Scripted(animator) => *pose = animator.update(dt),
            PoseDriver::Manual => apply_input(pose, input, speeds, dt),
        }
    }
}
