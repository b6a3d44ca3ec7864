//! HMD controller
//!
//! Owns the optical state and both eye cameras, and drives every update in a
//! fixed order: solve optics, place the eyes, lay out the viewports, then
//! notify observers. Readers that live on other threads take the published
//! `Arc<HmdSnapshot>`, which is swapped whole and never mutated in place.

use std::sync::Arc;

use log::{debug, info, trace, warn};

use crate::camera::EyeCamera;
use crate::error::Result;
use crate::eye::{Eye, EyePair};
use crate::eye_rig::{EyeRig, HmdPose};
use crate::optics::{
    solve_with, ClipDepth, DerivedOptics, OpticalConfig, OpticalParameter, OpticalSolution,
};
use crate::overlay::{OverlayResources, OverlayStyle};
use crate::pose_driver::{InputSpeeds, PoseDriver, PoseInput};
use crate::viewport::{layout, CanvasSize, CompositorSettings, DisplayMode};

/// Immutable view of the controller after an update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HmdSnapshot {
    /// Increments on every published update
    pub revision: u64,
    pub config: OpticalConfig,
    pub optics: DerivedOptics,
    pub pose: HmdPose,
    pub cameras: EyePair<EyeCamera>,
    pub display_mode: DisplayMode,
    pub canvas: CanvasSize,
}

/// Notified after every committed change
pub trait HmdObserver {
    fn on_update(&mut self, snapshot: &HmdSnapshot);
}

impl<F> HmdObserver for F
where
    F: FnMut(&HmdSnapshot),
{
    fn on_update(&mut self, snapshot: &HmdSnapshot) {
        self(snapshot)
    }
}

/// Everything besides the optics that the controller starts from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HmdSettings {
    pub clip_depth: ClipDepth,
    pub compositor: CompositorSettings,
    pub display_mode: DisplayMode,
    pub canvas: CanvasSize,
    pub initial_pose: HmdPose,
    pub driver: PoseDriver,
    pub input_speeds: InputSpeeds,
    pub overlay_style: OverlayStyle,
}

impl Default for HmdSettings {
    fn default() -> Self {
        Self {
            clip_depth: ClipDepth::default(),
            compositor: CompositorSettings::default(),
            display_mode: DisplayMode::default(),
            canvas: CanvasSize::default(),
            initial_pose: HmdPose::IDENTITY,
            driver: PoseDriver::default(),
            input_speeds: InputSpeeds::default(),
            overlay_style: OverlayStyle::default(),
        }
    }
}

pub struct HmdController {
    config: OpticalConfig,
    solution: OpticalSolution,
    rig: EyeRig,

    pose: HmdPose,
    driver: PoseDriver,
    input: PoseInput,
    speeds: InputSpeeds,

    cameras: EyePair<EyeCamera>,
    compositor: CompositorSettings,
    display_mode: DisplayMode,
    canvas: CanvasSize,

    overlay: OverlayResources,
    observers: Vec<Box<dyn HmdObserver>>,
    snapshot: Arc<HmdSnapshot>,
}

impl HmdController {
    pub fn new(config: OpticalConfig, settings: HmdSettings) -> Result<Self> {
        let solution = solve_with(&config, settings.clip_depth)?;
        let rig = EyeRig::new(&config, &solution.optics);
        let pose = match settings.driver {
            PoseDriver::Scripted(animator) => animator.sample(animator.time()),
            PoseDriver::Manual => settings.initial_pose,
        };

        let snapshot = Arc::new(HmdSnapshot {
            revision: 0,
            config,
            optics: solution.optics,
            pose,
            cameras: EyePair::from_fn(EyeCamera::new),
            display_mode: settings.display_mode,
            canvas: settings.canvas,
        });

        let mut controller = Self {
            config,
            solution,
            rig,
            pose,
            driver: settings.driver,
            input: PoseInput::default(),
            speeds: settings.input_speeds,
            cameras: EyePair::from_fn(EyeCamera::new),
            compositor: settings.compositor,
            display_mode: settings.display_mode,
            canvas: settings.canvas,
            overlay: OverlayResources::new(settings.overlay_style),
            observers: Vec::new(),
            snapshot,
        };

        controller.apply_projection();
        controller.refresh_eyes();
        controller.relayout();
        controller.publish();

        info!(
            "HMD controller ready: aspect={:.4} fov_h={:.1} fov_v={:.1}",
            controller.solution.optics.aspect_ratio_eye,
            controller.solution.optics.fov_horizontal,
            controller.solution.optics.fov_vertical,
        );
        Ok(controller)
    }

    pub fn config(&self) -> &OpticalConfig {
        &self.config
    }

    pub fn optics(&self) -> &DerivedOptics {
        &self.solution.optics
    }

    pub fn solution(&self) -> &OpticalSolution {
        &self.solution
    }

    pub fn pose(&self) -> &HmdPose {
        &self.pose
    }

    pub fn cameras(&self) -> &EyePair<EyeCamera> {
        &self.cameras
    }

    pub fn camera(&self, eye: Eye) -> &EyeCamera {
        &self.cameras[eye]
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn compositor_settings(&self) -> &CompositorSettings {
        &self.compositor
    }

    pub fn driver(&self) -> &PoseDriver {
        &self.driver
    }

    pub fn overlay(&self) -> &OverlayResources {
        &self.overlay
    }

    /// Latest published state, safe to hand to another thread
    pub fn snapshot(&self) -> Arc<HmdSnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn add_observer(&mut self, observer: impl HmdObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Edit one optical parameter. On error nothing changes.
    pub fn set_parameter(&mut self, parameter: OpticalParameter, value: f64) -> Result<()> {
        let candidate = self.config.with(parameter, value);
        match self.set_config(candidate) {
            Ok(()) => {
                debug!("Parameter {} = {}", parameter, value);
                Ok(())
            }
            Err(e) => {
                warn!("Rejected {} = {}: {}", parameter, value, e);
                Err(e)
            }
        }
    }

    /// String-keyed entry point for generic slider surfaces
    pub fn set_parameter_by_name(&mut self, name: &str, value: f64) -> Result<()> {
        let parameter = name.parse::<OpticalParameter>()?;
        self.set_parameter(parameter, value)
    }

    /// Replace the whole optical config. On error nothing changes.
    pub fn set_config(&mut self, config: OpticalConfig) -> Result<()> {
        // Solve before touching any state so a failure leaves no partial update
        let solution = solve_with(&config, self.solution.clip_depth)?;

        self.config = config;
        self.solution = solution;
        self.rig = EyeRig::new(&self.config, &self.solution.optics);

        self.apply_projection();
        self.refresh_eyes();
        self.relayout();
        self.publish();

        info!(
            "Optics updated: M={:.3} near={:.4} far={:.4} aspect={:.4}",
            self.solution.optics.magnification,
            self.solution.optics.near,
            self.solution.optics.far,
            self.solution.optics.aspect_ratio_eye,
        );
        Ok(())
    }

    /// Per-frame update from the render loop
    pub fn tick(&mut self, dt: f64) {
        self.driver.advance(&mut self.pose, &self.input, &self.speeds, dt);
        self.refresh_eyes();
        self.publish();
        trace!("tick dt={:.4} revision={}", dt, self.snapshot.revision);
    }

    /// Latest user input, consumed by the manual driver on the next tick
    pub fn set_input(&mut self, input: PoseInput) {
        self.input = input;
    }

    /// Place the HMD directly (external tracking)
    pub fn set_pose(&mut self, pose: HmdPose) {
        self.pose = pose;
        self.refresh_eyes();
        self.publish();
    }

    pub fn set_driver(&mut self, driver: PoseDriver) {
        let kind = if driver.is_scripted() {
            "scripted"
        } else {
            "manual"
        };
        info!("Pose driver: {}", kind);
        self.driver = driver;
    }

    /// Reset orientation to identity, keeping position. A scripted driver
    /// also levels its base so later ticks sweep around the new heading.
    pub fn recenter(&mut self) {
        self.pose = match &mut self.driver {
            PoseDriver::Scripted(animator) => {
                animator.recenter();
                animator.sample(animator.time())
            }
            PoseDriver::Manual => HmdPose::new(self.pose.position, glam::DQuat::IDENTITY),
        };
        self.refresh_eyes();
        self.publish();
        info!("Orientation recentered");
    }

    /// Render target changed size
    pub fn resize(&mut self, canvas: CanvasSize) {
        if canvas == self.canvas {
            return;
        }
        self.canvas = canvas;
        self.relayout();
        self.publish();
        debug!("Canvas resized to {}x{}", canvas.width, canvas.height);
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        if mode == self.display_mode {
            return;
        }
        self.display_mode = mode;
        self.relayout();
        self.publish();
        info!("Display mode: {:?}", mode);
    }

    pub fn set_compositor_settings(&mut self, settings: CompositorSettings) {
        self.compositor = settings;
        self.relayout();
        self.publish();
    }

    pub fn set_overlay_visible(&mut self, visible: bool) {
        self.overlay.visible = visible;
        if visible {
            self.overlay.rebuild(&self.cameras, self.solution.clip_depth);
        } else {
            self.overlay.teardown();
        }
    }

    /// Drop environment-bound resources and rebuild them for the new scene
    pub fn switch_environment(&mut self) {
        let visible = self.overlay.visible;
        let style = *self.overlay.style();
        self.overlay.teardown();

        self.overlay = OverlayResources::new(style);
        self.overlay.visible = visible;
        self.overlay.rebuild(&self.cameras, self.solution.clip_depth);
        info!("Environment switched");
    }

    fn apply_projection(&mut self) {
        for eye in Eye::BOTH {
            self.cameras[eye].set_projection(self.solution.projection[eye]);
        }
    }

    fn refresh_eyes(&mut self) {
        let poses = self.rig.update_pose(&self.pose);
        for eye in Eye::BOTH {
            self.cameras[eye].set_pose(&poses[eye]);
        }
        self.overlay.rebuild(&self.cameras, self.solution.clip_depth);
    }

    fn relayout(&mut self) {
        let rects = layout(
            self.display_mode,
            self.canvas,
            self.solution.optics.aspect_ratio_eye,
            &self.compositor,
        );
        for eye in Eye::BOTH {
            self.cameras[eye].set_viewport(rects[eye], self.canvas);
        }
    }

    fn publish(&mut self) {
        self.snapshot = Arc::new(HmdSnapshot {
            revision: self.snapshot.revision + 1,
            config: self.config,
            optics: self.solution.optics,
            pose: self.pose,
            cameras: self.cameras,
            display_mode: self.display_mode,
            canvas: self.canvas,
        });
        for observer in &mut self.observers {
            observer.on_update(&self.snapshot);
        }
    }
}
