//! Perspective camera for the geometry pass.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Camera uniform buffer data sent to the GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    /// Combined view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// World-space camera position (xyz, w unused).
    pub position: [f32; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            position: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Perspective camera.
///
/// The engine only reads the camera's transform at the start of each
/// geometry pass; an external controller may mutate position and
/// target between ticks through [`crate::engine::RenderEngine::camera_mut`].
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    fov_y_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl Camera {
    /// Creates a camera with the viewer defaults: 75 degree vertical
    /// field of view, near 0.1, far 1000, positioned at z = 5 looking
    /// at the origin.
    pub fn new(aspect: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_degrees: 75.0,
            aspect,
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Current aspect ratio (width / height).
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Updates the aspect ratio, typically after a viewport resize.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Updates the aspect ratio from pixel dimensions.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// View matrix (world → view space).
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Projection matrix (view → clip space, 0..1 depth).
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }

    /// Uniform data for the GPU.
    pub fn uniform(&self) -> CameraUniform {
        let view_proj = self.projection_matrix() * self.view_matrix();
        CameraUniform {
            view_proj: view_proj.to_cols_array_2d(),
            position: [self.position.x, self.position.y, self.position.z, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn set_viewport_updates_aspect() {
        let mut camera = Camera::new(800.0 / 600.0);
        camera.set_viewport(1024, 768);
        assert_relative_eq!(camera.aspect(), 1024.0 / 768.0);
    }

    #[test]
    fn set_viewport_guards_zero_height() {
        let mut camera = Camera::new(1.0);
        camera.set_viewport(800, 0);
        assert!(camera.aspect().is_finite());
    }

    #[test]
    fn uniform_projects_target_to_clip_center() {
        let camera = Camera::new(1.0);
        let view_proj = camera.projection_matrix() * camera.view_matrix();
        let clip = view_proj * camera.target.extend(1.0);
        let ndc = clip / clip.w;
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-6);
    }
}
