//! Geometry factory: builds fully initialized drawables.

use glam::{Mat4, Vec3};

use crate::error::RendererError;
use crate::materials::MaterialCache;
use crate::mesh::{MeshData, MeshManager};
use crate::pipeline::{ProgramHandle, ProgramManager};
use crate::scene::Drawable;
use crate::uniform::{U_TIME, UniformSet, UniformValue};
use crate::vertex::{MeshVertex, VertexAttributeKind};

/// Resources the factory draws on when assembling a drawable.
pub struct FactoryContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub meshes: &'a mut MeshManager,
    pub programs: &'a ProgramManager,
    pub materials: &'a mut MaterialCache,
}

/// Builds immutable drawables for the small fixed set of primitives.
///
/// Every returned drawable is complete: mesh buffers uploaded, program
/// attributes validated against the mesh, and a default uniform set
/// declared. Unimplemented shapes return an explicit error instead of
/// a partially constructed object.
pub struct GeometryFactory {
    program: ProgramHandle,
}

impl GeometryFactory {
    /// Creates a factory that assembles drawables against the given
    /// geometry-pass shader program.
    pub fn new(program: ProgramHandle) -> Self {
        Self { program }
    }

    /// A green unit cube floating at (0, 2, 0), casting and receiving
    /// shadows. Pass a texture path to sample a diffuse map instead of
    /// the solid color; the handle is bound before the pixels arrive.
    pub fn create_cube(
        &self,
        ctx: &mut FactoryContext<'_>,
        texture: Option<&str>,
    ) -> Result<Drawable, RendererError> {
        let data = cube_mesh();
        self.validate_attributes(ctx.programs, &data)?;
        let mesh = ctx.meshes.create(ctx.device, &data);

        let mut uniforms = UniformSet::new()
            .declare(U_TIME, UniformValue::Scalar(0.0))
            .declare("u_color", UniformValue::Vec3([0.0, 1.0, 0.0]));

        let mut drawable = Drawable::new("cube", mesh, self.program, UniformSet::default());
        if let Some(path) = texture {
            let handle = ctx.materials.load(ctx.device, ctx.queue, path);
            uniforms = uniforms.declare("u_texture", UniformValue::Texture(handle));
            drawable = drawable.with_material(handle);
        }
        drawable.uniforms = uniforms;

        Ok(drawable
            .with_transform(Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)))
            .with_shadows(true, true))
    }

    /// A yellow 10x10 ground plane at the origin, receiving shadows.
    pub fn create_plane(&self, ctx: &mut FactoryContext<'_>) -> Result<Drawable, RendererError> {
        let data = plane_mesh(10.0, 10.0);
        self.validate_attributes(ctx.programs, &data)?;
        let mesh = ctx.meshes.create(ctx.device, &data);

        let uniforms = UniformSet::new()
            .declare(U_TIME, UniformValue::Scalar(0.0))
            .declare("u_color", UniformValue::Vec3([1.0, 1.0, 0.0]));

        Ok(Drawable::new("plane", mesh, self.program, uniforms).with_shadows(false, true))
    }

    /// Spheres have no mesh builder yet.
    pub fn create_sphere(&self, _ctx: &mut FactoryContext<'_>) -> Result<Drawable, RendererError> {
        Err(RendererError::UnimplementedShape("sphere"))
    }

    fn validate_attributes(
        &self,
        programs: &ProgramManager,
        data: &MeshData,
    ) -> Result<(), RendererError> {
        let program = programs
            .get(self.program)
            .ok_or(RendererError::UnknownProgram(self.program.raw()))?;
        ensure_attributes_match(&program.label, &program.attributes, data.attributes())
    }
}

/// Checks that a shader program declares exactly the attributes the
/// mesh buffers provide. A mismatch is a configuration error, not a
/// silent no-op.
pub fn ensure_attributes_match(
    shader_label: &str,
    program_attrs: &[VertexAttributeKind],
    mesh_attrs: &[VertexAttributeKind],
) -> Result<(), RendererError> {
    let mut program_sorted: Vec<_> = program_attrs.to_vec();
    let mut mesh_sorted: Vec<_> = mesh_attrs.to_vec();
    program_sorted.sort();
    mesh_sorted.sort();

    if program_sorted != mesh_sorted {
        return Err(RendererError::AttributeMismatch {
            shader: shader_label.to_string(),
            detail: format!("shader declares {program_attrs:?}, mesh provides {mesh_attrs:?}"),
        });
    }
    Ok(())
}

/// Unit cube centered at the origin: 24 vertices (4 per face so each
/// face keeps its own normal), 36 indices.
pub fn cube_mesh() -> MeshData {
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        // (normal, tangent u, tangent v)
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, u, v) in faces {
        let base = vertices.len() as u32;
        for (du, dv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            let position = normal * 0.5 + u * du + v * dv;
            vertices.push(MeshVertex {
                position: position.to_array(),
                normal: normal.to_array(),
                uv: [du + 0.5, 0.5 - dv],
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData::new(vertices, indices)
}

/// Flat plane in the XZ plane with a +Y normal, centered at the origin.
pub fn plane_mesh(width: f32, depth: f32) -> MeshData {
    let hw = width / 2.0;
    let hd = depth / 2.0;
    let normal = [0.0, 1.0, 0.0];

    let vertices = vec![
        MeshVertex {
            position: [-hw, 0.0, hd],
            normal,
            uv: [0.0, 1.0],
        },
        MeshVertex {
            position: [hw, 0.0, hd],
            normal,
            uv: [1.0, 1.0],
        },
        MeshVertex {
            position: [hw, 0.0, -hd],
            normal,
            uv: [1.0, 0.0],
        },
        MeshVertex {
            position: [-hw, 0.0, -hd],
            normal,
            uv: [0.0, 0.0],
        },
    ];
    let indices = vec![0, 1, 2, 0, 2, 3];

    MeshData::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_24_vertices_and_36_indices() {
        let cube = cube_mesh();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
    }

    #[test]
    fn cube_spans_the_unit_box() {
        let cube = cube_mesh();
        for axis in 0..3 {
            let min = cube
                .vertices
                .iter()
                .map(|v| v.position[axis])
                .fold(f32::INFINITY, f32::min);
            let max = cube
                .vertices
                .iter()
                .map(|v| v.position[axis])
                .fold(f32::NEG_INFINITY, f32::max);
            assert_eq!(min, -0.5);
            assert_eq!(max, 0.5);
        }
    }

    #[test]
    fn cube_normals_are_unit_and_axis_aligned() {
        for v in cube_mesh().vertices {
            let n = Vec3::from(v.normal);
            assert!((n.length() - 1.0).abs() < 1e-6);
            assert_eq!(n.abs().max_element(), 1.0);
        }
    }

    #[test]
    fn plane_is_flat_with_up_normal() {
        let plane = plane_mesh(10.0, 10.0);
        assert_eq!(plane.vertices.len(), 4);
        assert_eq!(plane.indices.len(), 6);
        for v in &plane.vertices {
            assert_eq!(v.position[1], 0.0);
            assert_eq!(v.normal, [0.0, 1.0, 0.0]);
        }
        let xs: Vec<f32> = plane.vertices.iter().map(|v| v.position[0]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::INFINITY, f32::min), -5.0);
        assert_eq!(xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max), 5.0);
    }

    #[test]
    fn attribute_mismatch_is_a_configuration_error() {
        let shader_attrs = [VertexAttributeKind::Position, VertexAttributeKind::Normal];
        let mesh_attrs = MeshVertex::KINDS;
        let err = ensure_attributes_match("Geometry", &shader_attrs, &mesh_attrs).unwrap_err();
        assert!(matches!(err, RendererError::AttributeMismatch { .. }));
    }

    #[test]
    fn matching_attributes_pass_in_any_order() {
        let shader_attrs = [
            VertexAttributeKind::TexCoord,
            VertexAttributeKind::Position,
            VertexAttributeKind::Normal,
        ];
        ensure_attributes_match("Geometry", &shader_attrs, &MeshVertex::KINDS).unwrap();
    }
}
