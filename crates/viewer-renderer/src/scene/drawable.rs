//! Drawable definition.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use uuid::Uuid;

use crate::materials::TextureHandle;
use crate::mesh::MeshHandle;
use crate::pipeline::ProgramHandle;
use crate::uniform::{U_TIME, UniformSet, UniformValue};

/// The unit of renderable state: geometry, shader program, uniform
/// values, transform, and shadow flags.
///
/// Drawables are created by the geometry factory, owned by the scene
/// that holds them, and persist for the engine's lifetime. GPU buffers
/// are addressed through handles so the scene itself stays plain data.
#[derive(Debug, Clone)]
pub struct Drawable {
    /// Unique identifier for this drawable.
    pub id: Uuid,

    /// Human-readable name used in diagnostics and events.
    pub name: String,

    /// Handle to the mesh buffers in the mesh manager.
    pub mesh: MeshHandle,

    /// Handle to the shader program in the program manager.
    pub program: ProgramHandle,

    /// CPU-side uniform values, flushed to the GPU each frame.
    pub uniforms: UniformSet,

    /// World transform.
    pub transform: Mat4,

    /// Diffuse texture, if any. The handle is valid to bind even while
    /// its pixel data is still loading.
    pub material: Option<TextureHandle>,

    /// Whether this drawable casts shadows.
    pub cast_shadow: bool,

    /// Whether this drawable receives shadows.
    pub receive_shadow: bool,
}

impl Drawable {
    /// Creates a drawable with an identity transform and no material.
    pub fn new(name: &str, mesh: MeshHandle, program: ProgramHandle, uniforms: UniformSet) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            mesh,
            program,
            uniforms,
            transform: Mat4::IDENTITY,
            material: None,
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    /// Sets the world transform.
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Sets the diffuse texture.
    pub fn with_material(mut self, material: TextureHandle) -> Self {
        self.material = Some(material);
        self
    }

    /// Sets the shadow flags.
    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.cast_shadow = cast;
        self.receive_shadow = receive;
        self
    }

    /// Packs the per-object uniform block from the current state.
    pub fn object_uniform(&self) -> ObjectUniform {
        let color = match self.uniforms.get("u_color") {
            Some(UniformValue::Vec3(c)) => [c[0], c[1], c[2], 1.0],
            _ => [1.0, 1.0, 1.0, 1.0],
        };
        let time = self.uniforms.scalar(U_TIME).unwrap_or(0.0);
        let use_texture = if self.material.is_some() { 1.0 } else { 0.0 };
        ObjectUniform {
            model: self.transform.to_cols_array_2d(),
            color,
            params: [time, use_texture, 0.0, 0.0],
        }
    }
}

/// Per-drawable uniform block for the geometry shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ObjectUniform {
    /// Model (world) matrix.
    pub model: [[f32; 4]; 4],
    /// Base color used when no texture is bound.
    pub color: [f32; 4],
    /// x = elapsed seconds, y = texture flag, zw unused.
    pub params: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_drawable() -> Drawable {
        let uniforms = UniformSet::new()
            .declare(U_TIME, UniformValue::Scalar(0.0))
            .declare("u_color", UniformValue::Vec3([0.0, 1.0, 0.0]));
        Drawable::new("cube", MeshHandle::default(), ProgramHandle::default(), uniforms)
    }

    #[test]
    fn object_uniform_reflects_time_and_color() {
        let mut drawable = test_drawable();
        drawable.uniforms.set_time(2.5).unwrap();

        let packed = drawable.object_uniform();
        assert_eq!(packed.params[0], 2.5);
        assert_eq!(packed.color, [0.0, 1.0, 0.0, 1.0]);
        // No material bound, so the texture flag is off.
        assert_eq!(packed.params[1], 0.0);
    }

    #[test]
    fn shadow_flags_default_off() {
        let drawable = test_drawable();
        assert!(!drawable.cast_shadow);
        assert!(!drawable.receive_shadow);

        let drawable = drawable.with_shadows(true, true);
        assert!(drawable.cast_shadow);
        assert!(drawable.receive_shadow);
    }
}
