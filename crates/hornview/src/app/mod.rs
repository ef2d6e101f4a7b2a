//! The windowed viewer.

mod controls;
mod input;

pub use controls::{command_for_key, ParameterCommand};

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use glam::{Mat4, Vec2};
use hornview_core::{sensor_rotation_from_euler, Options, RedrawQueue, RedrawSender, ViewerState};
use hornview_render::{RenderEngine, RenderError, Renderer};
use winit::event_loop::{EventLoop, EventLoopProxy};
use winit::window::Window;

use crate::error::{Result, ViewerError};
use crate::orbit::{TrackballController, ViewMatrixSource};
use crate::texture_loader::{spawn_texture_load, TextureLoad};

/// Events delivered to the loop from other threads.
#[derive(Debug)]
pub enum UserEvent {
    /// A background texture decode finished.
    TextureLoaded(TextureLoad),
    /// A device-orientation reading, or `None` to clear the overlay.
    SensorRotation(Option<Mat4>),
}

/// Cloneable sender for feeding the running viewer from other threads.
#[derive(Clone)]
pub struct ViewerHandle {
    proxy: EventLoopProxy<UserEvent>,
}

impl ViewerHandle {
    /// Sets the sensor overlay. Returns `false` once the viewer has closed.
    pub fn set_sensor_rotation(&self, rotation: Option<Mat4>) -> bool {
        self.proxy
            .send_event(UserEvent::SensorRotation(rotation))
            .is_ok()
    }

    /// Sets the sensor overlay from device-orientation angles in degrees.
    pub fn set_sensor_euler(&self, alpha: f32, beta: f32, gamma: f32) -> bool {
        self.set_sensor_rotation(Some(sensor_rotation_from_euler(alpha, beta, gamma)))
    }

    /// Decodes an image in the background and applies it as the texture.
    pub fn load_texture(&self, path: impl Into<PathBuf>) -> JoinHandle<()> {
        let proxy = self.proxy.clone();
        spawn_texture_load(path, move |load| {
            if proxy.send_event(UserEvent::TextureLoaded(load)).is_err() {
                log::debug!("viewer closed before the texture finished loading");
            }
        })
    }
}

/// An interactive stereo viewer window.
pub struct Viewer {
    event_loop: EventLoop<UserEvent>,
    app: App,
}

impl Viewer {
    /// Validates `options` and creates the event loop. The window opens in
    /// [`Viewer::run`].
    pub fn new(options: Options) -> Result<Self> {
        let state = ViewerState::new(options)?;
        let event_loop = EventLoop::<UserEvent>::with_user_event().build()?;
        let proxy = event_loop.create_proxy();
        Ok(Self {
            event_loop,
            app: App::new(state, proxy),
        })
    }

    #[must_use]
    pub fn handle(&self) -> ViewerHandle {
        ViewerHandle {
            proxy: self.app.proxy.clone(),
        }
    }

    /// Runs until the window is closed. Blocks the calling thread.
    pub fn run(mut self) -> Result<()> {
        self.event_loop.run_app(&mut self.app)?;
        match self.app.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Loop state shared by the event handlers.
pub(crate) struct App {
    window: Option<Arc<Window>>,
    engine: Option<RenderEngine>,
    renderer: Option<Renderer>,
    state: ViewerState,
    orbit: TrackballController,
    redraw_tx: RedrawSender,
    redraw_queue: RedrawQueue,
    proxy: EventLoopProxy<UserEvent>,
    cursor: Vec2,
    left_mouse_down: bool,
    /// Setup or render failure that ended the loop.
    fatal: Option<ViewerError>,
}

impl App {
    fn new(state: ViewerState, proxy: EventLoopProxy<UserEvent>) -> Self {
        let (redraw_tx, redraw_queue) = RedrawQueue::new();
        Self {
            window: None,
            engine: None,
            renderer: None,
            state,
            orbit: TrackballController::new(),
            redraw_tx,
            redraw_queue,
            proxy,
            cursor: Vec2::ZERO,
            left_mouse_down: false,
            fatal: None,
        }
    }

    fn viewport(&self) -> Vec2 {
        self.engine
            .as_ref()
            .map_or(Vec2::ONE, |e| Vec2::new(e.width as f32, e.height as f32))
    }

    fn window_title(&self) -> String {
        format!("hornview ({})", self.state.options().mode.name())
    }

    /// Draws one full frame to the window.
    ///
    /// A lost, outdated or timed-out surface skips the frame.
    fn render(&mut self) -> Result<()> {
        let (Some(engine), Some(renderer)) = (self.engine.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };
        let frame_params = self.state.snapshot(self.orbit.view_matrix());

        let frame = match engine.acquire_frame() {
            Ok(frame) => frame,
            Err(
                e @ (RenderError::SurfaceLost | RenderError::SurfaceOutdated | RenderError::Timeout),
            ) => {
                log::debug!("skipping frame: {e}");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        renderer.render_frame(engine, &view, &frame_params)?;

        if let Some(window) = &self.window {
            window.pre_present_notify();
        }
        frame.present();
        Ok(())
    }

    /// Renders once per queued request, in arrival order.
    fn drain_redraws(&mut self) -> Result<()> {
        for reason in self.redraw_queue.drain() {
            log::trace!("redraw: {reason:?}");
            self.render()?;
        }
        Ok(())
    }
}

/// Opens the viewer window and blocks until it is closed.
pub fn run_app(options: Options) -> Result<()> {
    Viewer::new(options)?.run()
}
