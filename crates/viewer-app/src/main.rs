//! Viewer main entry point: window loop driving the render engine.

use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

use viewer_renderer::{
    EngineConfig, EventCallback, EventKey, EventPayload, RenderEngine, RendererError,
};

struct ViewerApp {
    engine: RenderEngine,
    window: Option<Arc<Window>>,
}

impl ViewerApp {
    fn new() -> Self {
        let engine = RenderEngine::create(EngineConfig::default());

        // Host policy: engine reports, the app decides what surfaces to
        // the user. Here everything goes to the log.
        let on_error: EventCallback = Arc::new(|payload| {
            if let EventPayload::ObjectError(record) = payload {
                tracing::error!(message = record.message, "scene object error");
            }
        });
        let on_loaded: EventCallback = Arc::new(|payload| {
            if let EventPayload::ObjectLoaded(record) = payload {
                tracing::info!(name = record.name, id = %record.id, "scene object loaded");
            }
        });
        engine.event_bus().subscribe(EventKey::ObjectError, on_error);
        engine.event_bus().subscribe(EventKey::ObjectLoaded, on_loaded);

        Self {
            engine,
            window: None,
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let (width, height) = self.engine.surface_size();
        let attributes = Window::default_attributes()
            .with_title("Viewer")
            .with_inner_size(LogicalSize::new(width, height));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                tracing::error!(%err, "window creation failed");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        if let Err(err) = self.bring_up(window.clone(), size.width, size.height) {
            tracing::error!(%err, "engine startup failed");
            event_loop.exit();
            return;
        }
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::Resized(size) => {
                if let Err(err) = self.engine.resize(size.width, size.height) {
                    tracing::error!(%err, "resize failed");
                }
            }
            WindowEvent::Occluded(occluded) => {
                self.engine.set_visible(!occluded);
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.engine.render_frame() {
                    tracing::error!(%err, "frame failed");
                }
            }
            WindowEvent::CloseRequested => {
                self.engine.dispose();
                event_loop.exit();
            }
            _ => {}
        }
    }
}

impl ViewerApp {
    fn bring_up(&mut self, window: Arc<Window>, width: u32, height: u32) -> Result<(), RendererError> {
        self.engine.attach(window)?;
        self.engine.resize(width, height)?;
        self.engine.build_scene(None)?;
        self.engine.start()
    }
}

fn main() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "viewer=debug,viewer_renderer=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Viewer");

    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut app = ViewerApp::new();
    event_loop
        .run_app(&mut app)
        .context("winit event loop terminated with error")?;

    Ok(())
}
