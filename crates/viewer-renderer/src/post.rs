//! Post-processing stage: the isolated full-screen quad pass.
//!
//! The stage owns everything the composite pass needs and nothing the
//! geometry pass can see: a clip-space quad, a fixed -1..1 orthographic
//! projection, the effect pipeline, and the effect uniform set. The
//! quad's transform is fixed at construction and never mutated.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::error::RendererError;
use crate::pipeline::PipelineConfig;
use crate::uniform::{U_RESOLUTION, U_TIME, UniformSet, UniformValue};
use crate::vertex::ScreenVertex;

/// Master scale for the screen-space effects.
pub const U_EFFECT_INTENSITY: &str = "u_effect_intensity";

const EFFECT_SHADER: &str = include_str!("shaders/post.wgsl");

/// Effect uniform block for the post-process shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct EffectUniform {
    /// Orthographic projection for the quad (fixed -1..1 on both axes).
    pub proj: [[f32; 4]; 4],
    /// Viewport resolution in pixels.
    pub resolution: [f32; 2],
    /// Elapsed seconds.
    pub time: f32,
    /// Master effect scale.
    pub intensity: f32,
}

/// The full-screen quad: two triangles whose corners sit exactly on
/// the clip-space square, UVs covering 0..1.
pub fn quad_vertices() -> ([ScreenVertex; 4], [u16; 6]) {
    let vertices = [
        ScreenVertex {
            position: [-1.0, -1.0],
            uv: [0.0, 1.0],
        },
        ScreenVertex {
            position: [1.0, -1.0],
            uv: [1.0, 1.0],
        },
        ScreenVertex {
            position: [1.0, 1.0],
            uv: [1.0, 0.0],
        },
        ScreenVertex {
            position: [-1.0, 1.0],
            uv: [0.0, 0.0],
        },
    ];
    let indices = [0, 1, 2, 0, 2, 3];
    (vertices, indices)
}

/// The fixed orthographic projection mapping -1..1 to the viewport on
/// both axes with no perspective distortion.
pub fn orthographic_projection() -> Mat4 {
    Mat4::orthographic_rh(-1.0, 1.0, -1.0, 1.0, 0.0, 1.0)
}

/// GPU resources and uniform state for the composite pass.
pub struct PostProcessStage {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    input_layout: wgpu::BindGroupLayout,
    input_bind_group: Option<wgpu::BindGroup>,
    uniforms: UniformSet,
}

impl PostProcessStage {
    /// Builds the stage for the given output surface format.
    ///
    /// Constructed once per engine; only the input binding changes
    /// afterwards (when the off-screen target is recreated).
    pub fn build(device: &wgpu::Device, output_format: wgpu::TextureFormat) -> Self {
        let (vertices, indices) = quad_vertices();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Post Quad Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Post Quad Index Buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let initial = EffectUniform {
            proj: orthographic_projection().to_cols_array_2d(),
            resolution: [0.0, 0.0],
            time: 0.0,
            intensity: 1.0,
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Effect Uniform Buffer"),
            contents: bytemuck::cast_slice(&[initial]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Post Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let input_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Post Input Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        // No depth attachment: the quad is not part of the 3D scene, so
        // there is nothing to depth-test it against.
        let pipeline = PipelineConfig::new(
            "Post Process",
            EFFECT_SHADER,
            output_format,
            None,
            &[&input_layout],
        )
        .with_vertex_layouts(vec![ScreenVertex::layout()])
        .double_sided()
        .build(device);

        let uniforms = UniformSet::new()
            .declare(U_TIME, UniformValue::Scalar(0.0))
            .declare(U_RESOLUTION, UniformValue::Vec2([0.0, 0.0]))
            .declare(U_EFFECT_INTENSITY, UniformValue::Scalar(1.0));

        Self {
            pipeline,
            vertex_buffer,
            index_buffer,
            index_count: 6,
            uniform_buffer,
            sampler,
            input_layout,
            input_bind_group: None,
            uniforms,
        }
    }

    /// Rebinds the geometry pass's color output as the effect shader's
    /// source texture. Called after the off-screen target is (re)created.
    pub fn set_input(&mut self, device: &wgpu::Device, source: &wgpu::TextureView) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Post Input Bind Group"),
            layout: &self.input_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        });
        self.input_bind_group = Some(bind_group);
    }

    /// Pushes this tick's elapsed time and viewport resolution into the
    /// effect uniform set and flushes the block to the GPU.
    pub fn update(
        &mut self,
        queue: &wgpu::Queue,
        seconds: f32,
        width: u32,
        height: u32,
    ) -> Result<(), RendererError> {
        self.uniforms.set_time(seconds)?;
        self.uniforms.set_resolution(width, height)?;

        let intensity = self.uniforms.scalar(U_EFFECT_INTENSITY).unwrap_or(1.0);
        let block = EffectUniform {
            proj: orthographic_projection().to_cols_array_2d(),
            resolution: [width as f32, height as f32],
            time: seconds,
            intensity,
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[block]));
        Ok(())
    }

    /// Records the full-screen quad draw into the composite pass.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(bind_group) = &self.input_bind_group else {
            // No source bound yet; nothing sensible to composite.
            return;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    /// The effect uniform set.
    pub fn uniforms(&self) -> &UniformSet {
        &self.uniforms
    }

    /// Mutable access for host-driven tuning (e.g. effect intensity).
    pub fn uniforms_mut(&mut self) -> &mut UniformSet {
        &mut self.uniforms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quad_spans_exactly_the_clip_space_square() {
        let (vertices, indices) = quad_vertices();
        let xs: Vec<f32> = vertices.iter().map(|v| v.position[0]).collect();
        let ys: Vec<f32> = vertices.iter().map(|v| v.position[1]).collect();

        assert_eq!(xs.iter().cloned().fold(f32::INFINITY, f32::min), -1.0);
        assert_eq!(xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max), 1.0);
        assert_eq!(ys.iter().cloned().fold(f32::INFINITY, f32::min), -1.0);
        assert_eq!(ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max), 1.0);

        // Two triangles, consistent winding.
        assert_eq!(indices.len(), 6);
    }

    #[test]
    fn quad_uvs_cover_the_unit_square() {
        let (vertices, _) = quad_vertices();
        for v in &vertices {
            assert!((0.0..=1.0).contains(&v.uv[0]));
            assert!((0.0..=1.0).contains(&v.uv[1]));
        }
    }

    #[test]
    fn orthographic_projection_is_identity_on_the_quad_plane() {
        let proj = orthographic_projection();
        for corner in [[-1.0f32, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]] {
            let clip = proj * glam::Vec4::new(corner[0], corner[1], 0.0, 1.0);
            assert_relative_eq!(clip.x, corner[0]);
            assert_relative_eq!(clip.y, corner[1]);
            assert_relative_eq!(clip.w, 1.0);
        }
    }

    #[test]
    fn effect_uniform_block_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<EffectUniform>() % 16, 0);
    }
}
