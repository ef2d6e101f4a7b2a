use std::sync::Arc;

use glam::Vec2;
use hornview_core::RedrawReason;
use hornview_render::{RenderEngine, Renderer};
use pollster::FutureExt;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use super::controls::command_for_key;
use super::{App, UserEvent};
use crate::error::{Result, ViewerError};
use crate::texture_loader::spawn_texture_load;

impl App {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: ViewerError) {
        log::error!("{err}");
        self.fatal = Some(err);
        event_loop.exit();
    }

    /// Creates the window, the engine and the renderer.
    fn setup(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let options = self.state.options();
        let window_attributes = Window::default_attributes()
            .with_title(self.window_title())
            .with_inner_size(LogicalSize::new(options.window_width, options.window_height));

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let engine = RenderEngine::new_windowed(window.clone()).block_on()?;
        let renderer = Renderer::new(&engine, options)?;

        if let Some(path) = options.texture_path.clone() {
            let proxy = self.proxy.clone();
            spawn_texture_load(path, move |load| {
                if proxy.send_event(UserEvent::TextureLoaded(load)).is_err() {
                    log::debug!("viewer closed before the texture finished loading");
                }
            });
        }

        self.window = Some(window);
        self.engine = Some(engine);
        self.renderer = Some(renderer);
        self.redraw_tx.request(RedrawReason::InitialLoad);
        log::info!("hornview window ready");
        Ok(())
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode) {
        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::KeyR => {
                self.orbit.reset();
                self.redraw_tx.request(RedrawReason::OrbitMoved);
            }
            _ => {
                let Some(command) = command_for_key(code) else {
                    return;
                };
                match command.apply(&mut self.state) {
                    Ok(()) => {
                        if let Some(window) = &self.window {
                            window.set_title(&self.window_title());
                        }
                        self.redraw_tx.request(RedrawReason::ParameterChanged);
                    }
                    Err(e) => log::warn!("ignoring {command:?}: {e}"),
                }
            }
        }
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.setup(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::TextureLoaded(load) => {
                let image = match load.result {
                    Ok(image) => image,
                    Err(e) => {
                        log::warn!(
                            "texture {} failed to load, keeping current texture: {e}",
                            load.path.display()
                        );
                        return;
                    }
                };
                let (Some(engine), Some(renderer)) = (&self.engine, self.renderer.as_mut()) else {
                    return;
                };
                match renderer.set_texture(engine, &image) {
                    Ok(()) => self.redraw_tx.request(RedrawReason::TextureLoaded),
                    Err(e) => log::warn!("texture {} rejected: {e}", load.path.display()),
                }
            }
            UserEvent::SensorRotation(rotation) => {
                self.state.set_sensor_rotation(rotation);
                self.redraw_tx.request(RedrawReason::SensorReading);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(engine) = &mut self.engine {
                    engine.resize(size.width, size.height);
                    self.redraw_tx.request(RedrawReason::Resized);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                self.handle_key(event_loop, code);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.left_mouse_down = state == ElementState::Pressed;
                if self.left_mouse_down {
                    let viewport = self.viewport();
                    self.orbit.begin_drag(self.cursor, viewport);
                } else {
                    self.orbit.end_drag();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                if self.left_mouse_down {
                    let viewport = self.viewport();
                    if self.orbit.drag_to(self.cursor, viewport) {
                        self.redraw_tx.request(RedrawReason::OrbitMoved);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                // Exposed by the OS, not a queued trigger.
                if let Err(e) = self.render() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(e) = self.drain_redraws() {
            self.fail(event_loop, e);
        }
    }
}
