//! Frustum visualization overlay
//!
//! Line meshes for each eye's frustum, owned by the controller and torn down
//! explicitly when the environment changes. The renderer uploads
//! `vertex_bytes` as a line list.

use bytemuck::{Pod, Zeroable};
use log::{info, warn};

use crate::camera::EyeCamera;
use crate::eye::{Eye, EyePair};
use crate::frustum::EDGES;
use crate::optics::ClipDepth;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

/// Overlay colors (linear RGBA)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub colors: EyePair<[f32; 4]>,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            colors: EyePair::new([1.0, 0.35, 0.3, 1.0], [0.3, 0.6, 1.0, 1.0]),
        }
    }
}

pub struct OverlayResources {
    pub visible: bool,
    style: OverlayStyle,
    lines: EyePair<Vec<LineVertex>>,
}

impl OverlayResources {
    pub fn new(style: OverlayStyle) -> Self {
        Self {
            visible: true,
            style,
            lines: EyePair::default(),
        }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Rebuild both eyes' line meshes from the current cameras. An eye whose
    /// matrices cannot be inverted is skipped and its mesh cleared.
    pub fn rebuild(&mut self, cameras: &EyePair<EyeCamera>, clip_depth: ClipDepth) {
        if !self.visible {
            return;
        }

        for eye in Eye::BOTH {
            let lines = &mut self.lines[eye];
            lines.clear();

            let geometry = match cameras[eye].frustum(clip_depth) {
                Ok(geometry) => geometry,
                Err(e) => {
                    warn!("Skipping {} eye frustum overlay: {}", eye.name(), e);
                    continue;
                }
            };

            let color = self.style.colors[eye];
            lines.reserve(EDGES.len() * 2);
            for (a, b) in geometry.segments() {
                lines.push(LineVertex {
                    position: a.as_vec3().to_array(),
                    color,
                });
                lines.push(LineVertex {
                    position: b.as_vec3().to_array(),
                    color,
                });
            }
        }
    }

    pub fn lines(&self, eye: Eye) -> &[LineVertex] {
        &self.lines[eye]
    }

    pub fn vertex_bytes(&self, eye: Eye) -> &[u8] {
        bytemuck::cast_slice(&self.lines[eye])
    }

    pub fn is_empty(&self) -> bool {
        self.lines.left.is_empty() && self.lines.right.is_empty()
    }

    /// Release all mesh data
    pub fn teardown(&mut self) {
        self.lines = EyePair::default();
        info!("Frustum overlay released");
    }
}

impl Default for OverlayResources {
    fn default() -> Self {
        Self::new(OverlayStyle::default())
    }
}
