//! Mesh resource management.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::vertex::{MeshVertex, VertexAttributeKind};

/// Handle to a mesh stored in the [`MeshManager`].
///
/// Handles are lightweight and can be copied freely; the buffers live
/// in the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MeshHandle(u64);

impl MeshHandle {
    /// Returns the raw handle value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// CPU mesh data for uploading to the GPU.
#[derive(Debug, Clone)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Creates indexed mesh data.
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Attribute kinds the vertex buffers provide.
    pub fn attributes(&self) -> &'static [VertexAttributeKind] {
        &MeshVertex::KINDS
    }
}

/// GPU-resident mesh buffers.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

/// Manager for GPU mesh resources.
///
/// Provides handle-based access so scene data stays free of GPU types.
pub struct MeshManager {
    meshes: HashMap<MeshHandle, GpuMesh>,
    next_handle: u64,
}

impl MeshManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self {
            meshes: HashMap::new(),
            next_handle: 1,
        }
    }

    /// Uploads mesh data to the GPU and returns a handle.
    pub fn create(&mut self, device: &wgpu::Device, data: &MeshData) -> MeshHandle {
        let handle = MeshHandle(self.next_handle);
        self.next_handle += 1;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        self.meshes.insert(
            handle,
            GpuMesh {
                vertex_buffer,
                index_buffer,
                index_count: data.indices.len() as u32,
            },
        );
        handle
    }

    /// Gets a mesh by handle.
    pub fn get(&self, handle: MeshHandle) -> Option<&GpuMesh> {
        self.meshes.get(&handle)
    }

    /// Returns the number of meshes in the manager.
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Returns true if the manager is empty.
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Drops all meshes, releasing their buffers.
    pub fn clear(&mut self) {
        self.meshes.clear();
    }
}

impl Default for MeshManager {
    fn default() -> Self {
        Self::new()
    }
}
