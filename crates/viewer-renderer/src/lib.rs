//! Real-Time Viewer Renderer
//!
//! WGPU-based two-pass rendering engine with a typed event bus.
//!
//! # Architecture
//!
//! Each frame runs two passes in one submission: the geometry pass
//! rasterizes the scene into an off-screen color target, then the
//! composite pass samples that target onto a full-screen quad with
//! screen-space effects applied.
//!
//! - [`engine::RenderEngine`] - Lifecycle, frame loop, and both passes
//! - [`events::EventBus`] - Typed publish/subscribe bus
//! - [`scene::Scene`] - Drawables and lights as plain data
//! - [`geometry::GeometryFactory`] - Primitive drawable construction
//! - [`post::PostProcessStage`] - The isolated composite pass
//! - [`materials::MaterialCache`] - Asynchronous texture loading
//! - [`context::RenderContext`] - GPU context abstraction
//!
//! # Example
//!
//! ```ignore
//! use viewer_renderer::{EngineConfig, RenderEngine};
//!
//! let mut engine = RenderEngine::create(EngineConfig::default());
//!
//! // GPU resources are allocated exactly once, against a window.
//! engine.attach(window)?;
//! engine.build_scene(None)?;
//! engine.start()?;
//!
//! // Driven from the window loop's redraw events.
//! engine.render_frame()?;
//! ```

// Core abstractions
pub mod context;
pub mod engine;
pub mod error;
pub mod events;
pub mod scene;

// Supporting modules
pub mod camera;
pub mod clock;
pub mod geometry;
pub mod lights;
pub mod materials;
pub mod mesh;
pub mod pipeline;
pub mod post;
pub mod target;
pub mod uniform;
pub mod vertex;

// Re-exports for convenience
pub use camera::{Camera, CameraUniform};
pub use context::RenderContext;
pub use engine::{AttachStatus, Diagnostics, EngineConfig, FrameOutcome, RenderEngine};
pub use error::RendererError;
pub use events::{
    ChangeRecord, ErrorRecord, EventBus, EventCallback, EventKey, EventPayload, ObjectRecord,
    Subscription,
};
pub use geometry::GeometryFactory;
pub use lights::{Light, LightRig, MAX_POINT_LIGHTS};
pub use materials::{MaterialCache, TextureHandle};
pub use mesh::{GpuMesh, MeshData, MeshHandle, MeshManager};
pub use post::PostProcessStage;
pub use scene::{Drawable, Scene};
pub use uniform::{UniformSet, UniformValue};
pub use vertex::MeshVertex;
