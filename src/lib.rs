//! HMD Core - optics and camera rig for a stereoscopic head-mounted display
//!
//! Turns a physical lens/display description into the per-eye off-axis
//! projections, view matrices and viewports a renderer needs for correct
//! depth perception. Rendering itself lives outside this crate.
//!
//! ```no_run
//! use hmd_core::{HmdController, HmdSettings, OpticalConfig, OpticalParameter};
//!
//! let mut hmd = HmdController::new(OpticalConfig::cardboard(), HmdSettings::default())?;
//! hmd.set_parameter(OpticalParameter::Ipd, 0.063)?;
//! hmd.tick(1.0 / 60.0);
//! let left = hmd.camera(hmd_core::Eye::Left);
//! let _uniforms = left.uniforms();
//! # Ok::<(), hmd_core::HmdError>(())
//! ```

pub mod camera;
pub mod controller;
pub mod error;
pub mod eye;
pub mod eye_rig;
pub mod frustum;
pub mod optics;
pub mod overlay;
pub mod pose_driver;
pub mod ui;
pub mod viewport;

pub use camera::{CameraUniforms, EyeCamera, LayerMask};
pub use controller::{HmdController, HmdObserver, HmdSettings, HmdSnapshot};
pub use error::{ConfigFault, HmdError, Result};
pub use eye::{Eye, EyePair};
pub use eye_rig::{EyePose, EyeRig, HmdPose, LocalAxes};
pub use frustum::FrustumGeometry;
pub use optics::{
    solve, solve_with, ClipDepth, DerivedOptics, EyeProjection, FrustumPlanes, OpticalConfig,
    OpticalParameter, OpticalSolution, ParameterRange,
};
pub use overlay::{LineVertex, OverlayResources, OverlayStyle};
pub use pose_driver::{InputSpeeds, PoseAnimator, PoseDriver, PoseInput};
pub use ui::{PanelAction, ParameterPanel};
pub use viewport::{
    layout, CanvasSize, CompositorSettings, Corner, DisplayMode, PixelRect, ViewportRect,
};
