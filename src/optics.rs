//! Optical solver
//!
//! Converts physical lens/display geometry into per-eye off-axis frustums.
//! Thin-lens model: the display sits inside the focal length, so the lens
//! forms an upright, magnified virtual image behind it. The eye is treated
//! as a pinhole `eye_relief` in front of the lens.
//!
//! All lengths are in meters, angles in degrees.

use std::fmt;
use std::str::FromStr;

use glam::{DMat4, DVec4};
use log::debug;

use crate::error::{ConfigFault, FrustumAxis, HmdError, Result};
use crate::eye::{Eye, EyePair};

/// Identifier for each editable optical parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpticalParameter {
    FocalLength,
    Ipd,
    EyeRelief,
    DistLens2Display,
    DisplayWidth,
    DisplayHeight,
    FarFromNear,
}

/// Slider bounds for a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ParameterRange {
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl OpticalParameter {
    pub const ALL: [OpticalParameter; 7] = [
        OpticalParameter::FocalLength,
        OpticalParameter::Ipd,
        OpticalParameter::EyeRelief,
        OpticalParameter::DistLens2Display,
        OpticalParameter::DisplayWidth,
        OpticalParameter::DisplayHeight,
        OpticalParameter::FarFromNear,
    ];

    /// Short name used by slider surfaces
    pub fn name(self) -> &'static str {
        match self {
            OpticalParameter::FocalLength => "f",
            OpticalParameter::Ipd => "ipd",
            OpticalParameter::EyeRelief => "eyeRelief",
            OpticalParameter::DistLens2Display => "distLens2Display",
            OpticalParameter::DisplayWidth => "displayWidth",
            OpticalParameter::DisplayHeight => "displayHeight",
            OpticalParameter::FarFromNear => "farFromNear",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OpticalParameter::FocalLength => "Focal length",
            OpticalParameter::Ipd => "IPD",
            OpticalParameter::EyeRelief => "Eye relief",
            OpticalParameter::DistLens2Display => "Lens to display",
            OpticalParameter::DisplayWidth => "Display width",
            OpticalParameter::DisplayHeight => "Display height",
            OpticalParameter::FarFromNear => "Far from near",
        }
    }

    pub fn range(self) -> ParameterRange {
        let (min, max, step) = match self {
            OpticalParameter::FocalLength => (0.02, 0.1, 0.0005),
            OpticalParameter::Ipd => (0.05, 0.08, 0.0005),
            OpticalParameter::EyeRelief => (0.005, 0.04, 0.0005),
            OpticalParameter::DistLens2Display => (0.02, 0.1, 0.0005),
            OpticalParameter::DisplayWidth => (0.05, 0.2, 0.001),
            OpticalParameter::DisplayHeight => (0.03, 0.15, 0.001),
            OpticalParameter::FarFromNear => (0.1, 10.0, 0.1),
        };
        ParameterRange { min, max, step }
    }
}

impl fmt::Display for OpticalParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OpticalParameter {
    type Err = HmdError;

    fn from_str(s: &str) -> Result<Self> {
        let param = match s {
            "f" | "focal_length" => OpticalParameter::FocalLength,
            "ipd" => OpticalParameter::Ipd,
            "eyeRelief" | "eye_relief" => OpticalParameter::EyeRelief,
            "distLens2Display" | "dist_lens_to_display" => OpticalParameter::DistLens2Display,
            "displayWidth" | "display_width" => OpticalParameter::DisplayWidth,
            "displayHeight" | "display_height" => OpticalParameter::DisplayHeight,
            "farFromNear" | "far_from_near" => OpticalParameter::FarFromNear,
            other => return Err(HmdError::UnknownParameter(other.to_string())),
        };
        Ok(param)
    }
}

/// Physical description of the lens/display pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpticalConfig {
    /// Lens focal length
    pub f: f64,
    /// Inter-pupillary distance
    pub ipd: f64,
    /// Eye to lens
    pub eye_relief: f64,
    pub dist_lens_to_display: f64,
    pub display_width: f64,
    pub display_height: f64,
    /// Depth of the frustum beyond the near plane
    pub far_from_near: f64,
}

impl OpticalConfig {
    /// Cardboard-style viewer with a ~5.5" phone
    pub const fn cardboard() -> Self {
        Self {
            f: 0.043,
            ipd: 0.065,
            eye_relief: 0.018,
            dist_lens_to_display: 0.042,
            display_width: 0.12096,
            display_height: 0.068,
            far_from_near: 1.5,
        }
    }

    pub fn get(&self, param: OpticalParameter) -> f64 {
        match param {
            OpticalParameter::FocalLength => self.f,
            OpticalParameter::Ipd => self.ipd,
            OpticalParameter::EyeRelief => self.eye_relief,
            OpticalParameter::DistLens2Display => self.dist_lens_to_display,
            OpticalParameter::DisplayWidth => self.display_width,
            OpticalParameter::DisplayHeight => self.display_height,
            OpticalParameter::FarFromNear => self.far_from_near,
        }
    }

    fn slot(&mut self, param: OpticalParameter) -> &mut f64 {
        match param {
            OpticalParameter::FocalLength => &mut self.f,
            OpticalParameter::Ipd => &mut self.ipd,
            OpticalParameter::EyeRelief => &mut self.eye_relief,
            OpticalParameter::DistLens2Display => &mut self.dist_lens_to_display,
            OpticalParameter::DisplayWidth => &mut self.display_width,
            OpticalParameter::DisplayHeight => &mut self.display_height,
            OpticalParameter::FarFromNear => &mut self.far_from_near,
        }
    }

    /// Copy of this config with one parameter replaced. Not validated.
    pub fn with(mut self, param: OpticalParameter, value: f64) -> Self {
        *self.slot(param) = value;
        self
    }

    /// Checks the field-level invariants: finite, strictly positive, and an
    /// upright virtual image (`f > dist_lens_to_display`).
    pub fn validate(&self) -> Result<()> {
        for param in OpticalParameter::ALL {
            let value = self.get(param);
            if !value.is_finite() {
                return Err(ConfigFault::NonFinite { parameter: param }.into());
            }
            if value <= 0.0 {
                return Err(ConfigFault::NonPositive { parameter: param, value }.into());
            }
        }

        if self.f == self.dist_lens_to_display {
            return Err(ConfigFault::UndefinedMagnification {
                f: self.f,
                dist_lens_to_display: self.dist_lens_to_display,
            }
            .into());
        }
        if self.f < self.dist_lens_to_display {
            return Err(ConfigFault::InvertedImage {
                f: self.f,
                dist_lens_to_display: self.dist_lens_to_display,
            }
            .into());
        }
        Ok(())
    }
}

impl Default for OpticalConfig {
    fn default() -> Self {
        Self::cardboard()
    }
}

/// Clip-space depth range targeted by the projection matrices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipDepth {
    /// OpenGL / WebGL style
    #[default]
    NegativeOneToOne,
    /// Vulkan / wgpu / D3D style
    ZeroToOne,
}

impl ClipDepth {
    /// NDC z of the near and far planes
    pub fn ndc_range(self) -> (f64, f64) {
        match self {
            ClipDepth::NegativeOneToOne => (-1.0, 1.0),
            ClipDepth::ZeroToOne => (0.0, 1.0),
        }
    }
}

/// Off-axis frustum planes in eye space, measured at the near plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumPlanes {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub near: f64,
    pub far: f64,
}

impl FrustumPlanes {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width() / self.height()
    }
}

/// Scalars derived from an `OpticalConfig`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedOptics {
    pub magnification: f64,
    pub img_height: f64,
    pub dist_lens_to_img: f64,
    pub dist_eye_to_display: f64,
    pub dist_eye_to_img: f64,
    pub near: f64,
    pub far: f64,
    pub fov_vertical: f64,
    pub fov_h_nasal: f64,
    pub fov_h_temporal: f64,
    pub fov_horizontal: f64,
    pub top: f64,
    pub bottom: f64,
    pub left_for_left_eye: f64,
    pub right_for_left_eye: f64,
    pub left_for_right_eye: f64,
    pub right_for_right_eye: f64,
    pub aspect_ratio_eye: f64,
}

impl DerivedOptics {
    pub fn planes(&self, eye: Eye) -> FrustumPlanes {
        let (left, right) = match eye {
            Eye::Left => (self.left_for_left_eye, self.right_for_left_eye),
            Eye::Right => (self.left_for_right_eye, self.right_for_right_eye),
        };
        FrustumPlanes {
            left,
            right,
            top: self.top,
            bottom: self.bottom,
            near: self.near,
            far: self.far,
        }
    }
}

/// Frozen per-eye projection matrices
pub type EyeProjection = EyePair<DMat4>;

/// Output of `solve`: derived optics plus the two projections built from them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpticalSolution {
    pub optics: DerivedOptics,
    pub projection: EyeProjection,
    pub clip_depth: ClipDepth,
}

/// Solve with the default `[-1, 1]` clip depth
pub fn solve(config: &OpticalConfig) -> Result<OpticalSolution> {
    solve_with(config, ClipDepth::default())
}

pub fn solve_with(config: &OpticalConfig, clip_depth: ClipDepth) -> Result<OpticalSolution> {
    let optics = derive_optics(config)?;
    let projection =
        EyePair::try_from_fn(|eye| off_axis_projection(&optics.planes(eye), clip_depth))?;

    debug!(
        "Solved optics: M={:.3} near={:.4} far={:.4} aspect={:.4} fov_v={:.1} fov_h={:.1}",
        optics.magnification,
        optics.near,
        optics.far,
        optics.aspect_ratio_eye,
        optics.fov_vertical,
        optics.fov_horizontal,
    );

    Ok(OpticalSolution {
        optics,
        projection,
        clip_depth,
    })
}

/// Thin-lens derivation of every scalar the renderer needs
pub fn derive_optics(config: &OpticalConfig) -> Result<DerivedOptics> {
    config.validate()?;

    let OpticalConfig {
        f,
        ipd,
        eye_relief,
        dist_lens_to_display,
        display_width,
        display_height,
        far_from_near,
    } = *config;

    // 1. Eye sits behind the lens by the eye relief
    let dist_eye_to_display = eye_relief + dist_lens_to_display;

    // 2. Positive magnification: upright virtual image
    let magnification = f / (f - dist_lens_to_display);

    // 3-4. Virtual image size and placement
    let img_height = display_height * magnification;
    let dist_lens_to_img = (1.0 / (1.0 / f - 1.0 / dist_lens_to_display)).abs();
    let dist_eye_to_img = dist_lens_to_img + eye_relief;

    // 5. Clip planes
    let near = dist_eye_to_display;
    let far = near + far_from_near;

    // 6. Field of view, horizontal split about the lens axis
    let img_width_nasal = magnification * ipd / 2.0;
    let img_width_temporal = magnification * (display_width - ipd) / 2.0;

    let fov_vertical = 2.0 * ((img_height / 2.0) / dist_eye_to_img).atan().to_degrees();
    let fov_h_nasal = (img_width_nasal / dist_eye_to_img).atan().to_degrees();
    let fov_h_temporal = (img_width_temporal / dist_eye_to_img).atan().to_degrees();

    // 7. Scale the virtual image back onto the near plane
    let scale = near / dist_eye_to_img;
    let top = img_height / 2.0 * scale;
    let bottom = -top;
    let right_for_left_eye = img_width_nasal * scale;
    let left_for_left_eye = -img_width_temporal * scale;
    let right_for_right_eye = img_width_temporal * scale;
    let left_for_right_eye = -img_width_nasal * scale;

    if right_for_left_eye <= left_for_left_eye {
        return Err(ConfigFault::DegenerateFrustum {
            axis: FrustumAxis::Horizontal,
        }
        .into());
    }
    if top <= bottom {
        return Err(ConfigFault::DegenerateFrustum {
            axis: FrustumAxis::Vertical,
        }
        .into());
    }

    let aspect_ratio_eye = (right_for_left_eye - left_for_left_eye) / (top - bottom);

    Ok(DerivedOptics {
        magnification,
        img_height,
        dist_lens_to_img,
        dist_eye_to_display,
        dist_eye_to_img,
        near,
        far,
        fov_vertical,
        fov_h_nasal,
        fov_h_temporal,
        fov_horizontal: fov_h_nasal + fov_h_temporal,
        top,
        bottom,
        left_for_left_eye,
        right_for_left_eye,
        left_for_right_eye,
        right_for_right_eye,
        aspect_ratio_eye,
    })
}

/// Left-handed off-center perspective projection.
///
/// Eye space looks down +Z. The classic formulation is row-vector
/// (`v * M`); glam is column-vector (`M * v`), so the matrix built here is its
/// transpose and maps points identically. Only the two depth entries differ
/// between `ClipDepth` conventions.
pub fn off_axis_projection(planes: &FrustumPlanes, clip_depth: ClipDepth) -> Result<DMat4> {
    let FrustumPlanes {
        left,
        right,
        top,
        bottom,
        near,
        far,
    } = *planes;

    if right == left {
        return Err(ConfigFault::DegenerateFrustum {
            axis: FrustumAxis::Horizontal,
        }
        .into());
    }
    if top == bottom {
        return Err(ConfigFault::DegenerateFrustum {
            axis: FrustumAxis::Vertical,
        }
        .into());
    }

    let x_scale = 2.0 * near / (right - left);
    let y_scale = 2.0 * near / (top - bottom);
    let x_offset = -(right + left) / (right - left);
    let y_offset = -(top + bottom) / (top - bottom);

    let (z_scale, z_offset) = match clip_depth {
        ClipDepth::NegativeOneToOne => (
            (far + near) / (far - near),
            -2.0 * far * near / (far - near),
        ),
        ClipDepth::ZeroToOne => (far / (far - near), -far * near / (far - near)),
    };

    Ok(DMat4::from_cols(
        DVec4::new(x_scale, 0.0, 0.0, 0.0),
        DVec4::new(0.0, y_scale, 0.0, 0.0),
        DVec4::new(x_offset, y_offset, z_scale, 1.0),
        DVec4::new(0.0, 0.0, z_offset, 0.0),
    ))
}
