//! Frustum geometry reconstruction
//!
//! Unprojects the clip-space cube through a projection/view pair to get the
//! world-space frustum. Used for the overlay line meshes and to check solver
//! output against the matrices actually handed to the renderer.

use glam::{DMat4, DVec3};

use crate::error::{HmdError, MatrixKind, Result};
use crate::optics::{ClipDepth, FrustumPlanes};

/// Threshold for considering a determinant as zero
const DETERMINANT_EPSILON: f64 = 1e-12;

/// Corner index pairs: near ring, far ring, then the four connecting edges.
/// Corners 0..4 are the near plane, 4..8 the far plane, both wound
/// bottom-left, bottom-right, top-right, top-left.
pub const EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

const NDC_RING: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

/// Eight world-space corners of a view frustum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumGeometry {
    pub corners: [DVec3; 8],
}

impl FrustumGeometry {
    pub fn from_matrices(proj: &DMat4, view: &DMat4) -> Result<Self> {
        Self::from_matrices_with(proj, view, ClipDepth::default())
    }

    pub fn from_matrices_with(proj: &DMat4, view: &DMat4, clip_depth: ClipDepth) -> Result<Self> {
        Ok(Self {
            corners: corners_with(proj, view, clip_depth)?,
        })
    }

    pub fn near_corners(&self) -> &[DVec3] {
        &self.corners[..4]
    }

    pub fn far_corners(&self) -> &[DVec3] {
        &self.corners[4..]
    }

    /// World-space line segments, one per edge
    pub fn segments(&self) -> impl Iterator<Item = (DVec3, DVec3)> + '_ {
        EDGES
            .iter()
            .map(move |&(a, b)| (self.corners[a], self.corners[b]))
    }

    /// Measure the frustum back in eye space: the near-plane rectangle plus
    /// near/far distances.
    pub fn eye_space_planes(&self, view: &DMat4) -> FrustumPlanes {
        let near: Vec<DVec3> = self
            .near_corners()
            .iter()
            .map(|&c| view.transform_point3(c))
            .collect();
        let far_z = self
            .far_corners()
            .iter()
            .map(|&c| view.transform_point3(c).z)
            .sum::<f64>()
            / 4.0;

        let min_by = |f: fn(&DVec3) -> f64| near.iter().map(f).fold(f64::INFINITY, f64::min);
        let max_by = |f: fn(&DVec3) -> f64| near.iter().map(f).fold(f64::NEG_INFINITY, f64::max);

        FrustumPlanes {
            left: min_by(|p| p.x),
            right: max_by(|p| p.x),
            top: max_by(|p| p.y),
            bottom: min_by(|p| p.y),
            near: near.iter().map(|p| p.z).sum::<f64>() / 4.0,
            far: far_z,
        }
    }
}

/// Corners for the default `[-1, 1]` clip depth
pub fn corners(proj: &DMat4, view: &DMat4) -> Result<[DVec3; 8]> {
    corners_with(proj, view, ClipDepth::default())
}

pub fn corners_with(proj: &DMat4, view: &DMat4, clip_depth: ClipDepth) -> Result<[DVec3; 8]> {
    let inv_proj = checked_inverse(proj, MatrixKind::Projection)?;
    let inv_view = checked_inverse(view, MatrixKind::View)?;

    let (near_z, far_z) = clip_depth.ndc_range();
    let mut out = [DVec3::ZERO; 8];
    for (plane, z) in [near_z, far_z].into_iter().enumerate() {
        for (i, &(x, y)) in NDC_RING.iter().enumerate() {
            let eye_space = inv_proj.project_point3(DVec3::new(x, y, z));
            let world = inv_view.transform_point3(eye_space);
            if !world.is_finite() {
                // w collapsed to zero: the projection is degenerate even if invertible
                return Err(HmdError::SingularMatrix {
                    which: MatrixKind::Projection,
                    determinant: proj.determinant(),
                });
            }
            out[plane * 4 + i] = world;
        }
    }
    Ok(out)
}

pub fn edges() -> [(usize, usize); 12] {
    EDGES
}

fn checked_inverse(m: &DMat4, which: MatrixKind) -> Result<DMat4> {
    let determinant = m.determinant();
    if !determinant.is_finite() || determinant.abs() < DETERMINANT_EPSILON {
        return Err(HmdError::SingularMatrix { which, determinant });
    }
    let inverse = m.inverse();
    if !inverse.is_finite() {
        return Err(HmdError::SingularMatrix { which, determinant });
    }
    Ok(inverse)
}
