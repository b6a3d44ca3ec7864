//! Error types for the HMD optics core
//!
//! Configuration faults are rejected at the `solve` / `set_parameter`
//! boundary so that no partially built projection ever escapes.

use thiserror::Error;

use crate::optics::OpticalParameter;

/// Which frustum axis collapsed to zero width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumAxis {
    Horizontal,
    Vertical,
}

impl std::fmt::Display for FrustumAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrustumAxis::Horizontal => write!(f, "horizontal"),
            FrustumAxis::Vertical => write!(f, "vertical"),
        }
    }
}

/// Which matrix failed to invert during frustum reconstruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixKind {
    Projection,
    View,
}

impl std::fmt::Display for MatrixKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatrixKind::Projection => write!(f, "projection"),
            MatrixKind::View => write!(f, "view"),
        }
    }
}

/// The specific reason an optical configuration was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigFault {
    #[error("{parameter} must be strictly positive (got {value})")]
    NonPositive {
        parameter: OpticalParameter,
        value: f64,
    },
    #[error("{parameter} must be a finite number")]
    NonFinite { parameter: OpticalParameter },
    #[error("focal length {f} equals lens-to-display distance {dist_lens_to_display}: magnification is undefined")]
    UndefinedMagnification { f: f64, dist_lens_to_display: f64 },
    #[error("focal length {f} is shorter than lens-to-display distance {dist_lens_to_display}: image would be real and inverted")]
    InvertedImage { f: f64, dist_lens_to_display: f64 },
    #[error("{axis} frustum extent collapsed to zero width")]
    DegenerateFrustum { axis: FrustumAxis },
}

/// Errors surfaced by the HMD optics core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HmdError {
    #[error("invalid optical configuration: {0}")]
    InvalidOpticalConfig(#[from] ConfigFault),

    #[error("singular {which} matrix: determinant={determinant:.6e}")]
    SingularMatrix { which: MatrixKind, determinant: f64 },

    #[error("unknown optical parameter: {0:?}")]
    UnknownParameter(String),
}

pub type Result<T> = std::result::Result<T, HmdError>;
