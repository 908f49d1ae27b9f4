//! Render pipeline construction and shader program storage.

use std::collections::HashMap;

use crate::vertex::VertexAttributeKind;

/// Handle to a shader program stored in the [`ProgramManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProgramHandle(u64);

impl ProgramHandle {
    /// Returns the raw handle value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A compiled render pipeline plus the vertex attributes its shader
/// declares, kept for validation against mesh buffers.
pub struct ShaderProgram {
    pub pipeline: wgpu::RenderPipeline,
    pub attributes: Vec<VertexAttributeKind>,
    pub label: String,
}

/// Manager for shader programs, handle-addressed like meshes.
pub struct ProgramManager {
    programs: HashMap<ProgramHandle, ShaderProgram>,
    next_handle: u64,
}

impl ProgramManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self {
            programs: HashMap::new(),
            next_handle: 1,
        }
    }

    /// Stores a program and returns its handle.
    pub fn insert(&mut self, program: ShaderProgram) -> ProgramHandle {
        let handle = ProgramHandle(self.next_handle);
        self.next_handle += 1;
        self.programs.insert(handle, program);
        handle
    }

    /// Gets a program by handle.
    pub fn get(&self, handle: ProgramHandle) -> Option<&ShaderProgram> {
        self.programs.get(&handle)
    }

    /// Drops all programs.
    pub fn clear(&mut self) {
        self.programs.clear();
    }
}

impl Default for ProgramManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for render pipelines.
pub struct PipelineConfig<'a> {
    label: &'a str,
    shader_source: &'a str,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
    bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    vertex_layouts: Vec<wgpu::VertexBufferLayout<'a>>,
    topology: wgpu::PrimitiveTopology,
    cull_mode: Option<wgpu::Face>,
}

impl<'a> PipelineConfig<'a> {
    /// Creates a pipeline config with sensible defaults: triangle list,
    /// back-face culling, depth test enabled when a depth format is given.
    pub fn new(
        label: &'a str,
        shader_source: &'a str,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
        bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    ) -> Self {
        Self {
            label,
            shader_source,
            color_format,
            depth_format,
            bind_group_layouts,
            vertex_layouts: Vec::new(),
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
        }
    }

    /// Sets the vertex buffer layouts.
    pub fn with_vertex_layouts(mut self, layouts: Vec<wgpu::VertexBufferLayout<'a>>) -> Self {
        self.vertex_layouts = layouts;
        self
    }

    /// Sets the primitive topology.
    pub fn with_topology(mut self, topology: wgpu::PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Disables back-face culling (double-sided geometry).
    pub fn double_sided(mut self) -> Self {
        self.cull_mode = None;
        self
    }

    /// Builds the render pipeline.
    pub fn build(self, device: &wgpu::Device) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(self.label),
            source: wgpu::ShaderSource::Wgsl(self.shader_source.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(self.label),
            bind_group_layouts: self.bind_group_layouts,
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(self.label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &self.vertex_layouts,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: self.topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: self.cull_mode,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: self.depth_format.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}
