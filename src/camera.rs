//! Per-eye camera state handed to the renderer
//!
//! The core only ever writes three things into a camera: a frozen
//! projection, a view matrix, and a viewport. Everything else about drawing
//! belongs to the renderer.

use bytemuck::{Pod, Zeroable};
use glam::{DMat4, DVec3};

use crate::error::Result;
use crate::eye::Eye;
use crate::eye_rig::EyePose;
use crate::frustum::FrustumGeometry;
use crate::optics::ClipDepth;
use crate::viewport::{CanvasSize, PixelRect, ViewportRect};

/// Exclusive content-routing tag.
///
/// View-dependent translucent content (sorted splats, point clouds) can only
/// be sorted for one viewpoint at a time, so each active camera gets its own
/// bit and is paired with its own sorted copy of that content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Spectator / desktop camera
    pub const MAIN: Self = Self(1 << 0);
    pub const LEFT_EYE: Self = Self(1 << 1);
    pub const RIGHT_EYE: Self = Self(1 << 2);
    /// Shared opaque content every camera draws
    pub const SHARED: Self = Self(1 << 3);

    pub fn for_eye(eye: Eye) -> Self {
        match eye {
            Eye::Left => Self::LEFT_EYE,
            Eye::Right => Self::RIGHT_EYE,
        }
    }

    pub fn contains(self, other: LayerMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: LayerMask) -> Self {
        Self(self.0 | other.0)
    }

    pub fn is_exclusive_with(self, other: LayerMask) -> bool {
        self.0 & other.0 == 0
    }
}

// Camera uniforms
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub eye_position: [f32; 4], // w = layer mask bits
}

/// Renderer-facing camera for one eye
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeCamera {
    pub eye: Eye,
    pub projection: DMat4,
    pub view: DMat4,
    pub position: DVec3,
    pub viewport: ViewportRect,
    pub pixel_viewport: PixelRect,
    pub layer_mask: LayerMask,
}

impl EyeCamera {
    pub fn new(eye: Eye) -> Self {
        Self {
            eye,
            projection: DMat4::IDENTITY,
            view: DMat4::IDENTITY,
            position: DVec3::ZERO,
            viewport: ViewportRect::FULL,
            pixel_viewport: ViewportRect::FULL.to_pixels(CanvasSize::default()),
            layer_mask: LayerMask::for_eye(eye),
        }
    }

    pub fn set_projection(&mut self, projection: DMat4) {
        self.projection = projection;
    }

    pub fn set_pose(&mut self, pose: &EyePose) {
        self.position = pose.position;
        self.view = pose.view;
    }

    /// Pixel rect is always derived from the canvas passed in now
    pub fn set_viewport(&mut self, viewport: ViewportRect, canvas: CanvasSize) {
        self.viewport = viewport;
        self.pixel_viewport = viewport.to_pixels(canvas);
    }

    pub fn view_proj(&self) -> DMat4 {
        self.projection * self.view
    }

    pub fn uniforms(&self) -> CameraUniforms {
        let p = self.position.as_vec3();
        CameraUniforms {
            view_proj: self.view_proj().as_mat4().to_cols_array_2d(),
            eye_position: [p.x, p.y, p.z, self.layer_mask.0 as f32],
        }
    }

    pub fn frustum(&self, clip_depth: ClipDepth) -> Result<FrustumGeometry> {
        FrustumGeometry::from_matrices_with(&self.projection, &self.view, clip_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eye_masks_are_exclusive() {
        let left = LayerMask::for_eye(Eye::Left);
        let right = LayerMask::for_eye(Eye::Right);
        assert!(left.is_exclusive_with(right));
        assert!(left.is_exclusive_with(LayerMask::MAIN));
        assert!(right.is_exclusive_with(LayerMask::MAIN));

        let both = left.union(LayerMask::SHARED);
        assert!(both.contains(LayerMask::SHARED));
        assert!(!both.contains(right));
    }

    #[test]
    fn test_viewport_pixels_follow_canvas() {
        let mut camera = EyeCamera::new(Eye::Right);
        let rect = ViewportRect {
            x: 0.5,
            y: 0.25,
            width: 0.25,
            height: 0.5,
        };
        camera.set_viewport(rect, CanvasSize::new(800, 600));
        assert_eq!(camera.pixel_viewport.x, 400.0);
        assert_eq!(camera.pixel_viewport.height, 300.0);

        camera.set_viewport(rect, CanvasSize::new(1920, 1080));
        assert_eq!(camera.pixel_viewport.width, 480.0);
        assert_eq!(camera.pixel_viewport.y, 270.0);
    }

    #[test]
    fn test_uniforms_are_pod() {
        let camera = EyeCamera::new(Eye::Left);
        let uniforms = camera.uniforms();
        let bytes = bytemuck::bytes_of(&uniforms);
        assert_eq!(bytes.len(), std::mem::size_of::<CameraUniforms>());
        assert_eq!(uniforms.view_proj, glam::Mat4::IDENTITY.to_cols_array_2d());
        assert_eq!(uniforms.eye_position[3], LayerMask::LEFT_EYE.0 as f32);
    }
}
