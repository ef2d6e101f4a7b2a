//! Headless rendering API.
//!
//! Renders the horn surface to an image buffer or file without opening a
//! window. Useful for integration tests, batch processing and automated
//! screenshots.

use std::path::Path;

use glam::Mat4;
use hornview_core::{FrameParams, Options, ViewerState};
use hornview_render::{save_image, to_rgba_image, RenderEngine, Renderer};
use image::RgbaImage;
use pollster::FutureExt;

use crate::error::Result;
use crate::texture_loader::load_texture;

/// An offscreen engine and renderer that can draw many frames.
pub struct HeadlessViewer {
    engine: RenderEngine,
    renderer: Renderer,
    state: ViewerState,
}

impl HeadlessViewer {
    /// Creates a headless GPU context and uploads the surface.
    ///
    /// A texture named in `options` is decoded synchronously; if that fails
    /// the surface stays untextured.
    pub fn new(options: Options, width: u32, height: u32) -> Result<Self> {
        let state = ViewerState::new(options)?;
        let engine = RenderEngine::new_headless(width, height).block_on()?;
        let mut renderer = Renderer::new(&engine, state.options())?;

        if let Some(path) = &state.options().texture_path {
            match load_texture(path) {
                Ok(image) => renderer.set_texture(&engine, &image)?,
                Err(e) => log::warn!("rendering untextured: {e}"),
            }
        }

        Ok(Self {
            engine,
            renderer,
            state,
        })
    }

    /// Parameters between frames.
    pub fn state_mut(&mut self) -> &mut ViewerState {
        &mut self.state
    }

    /// Replaces the surface texture.
    pub fn set_texture(&mut self, image: &RgbaImage) -> Result<()> {
        self.renderer.set_texture(&self.engine, image)?;
        Ok(())
    }

    /// Renders the current state seen through `orbit_view`.
    pub fn render(&mut self, orbit_view: Mat4) -> Result<RgbaImage> {
        let frame = self.state.snapshot(orbit_view);
        self.render_frame(&frame)
    }

    /// Renders an explicit snapshot.
    pub fn render_frame(&mut self, frame: &FrameParams) -> Result<RgbaImage> {
        let target = self.engine.create_capture_target();
        self.renderer.render_frame(&self.engine, &target, frame)?;
        let data = self.engine.capture()?;
        let image = to_rgba_image(
            &data,
            self.engine.width,
            self.engine.height,
            self.engine.color_format(),
        )?;
        Ok(image)
    }
}

/// Renders one frame to a raw RGBA pixel buffer.
///
/// The buffer holds `width * height * 4` bytes, row by row from the top left.
///
/// # Example
/// ```no_run
/// use hornview::*;
///
/// let pixels = render_to_image(&Options::default(), 800, 600).unwrap();
/// assert_eq!(pixels.len(), 800 * 600 * 4);
/// ```
pub fn render_to_image(options: &Options, width: u32, height: u32) -> Result<Vec<u8>> {
    let mut viewer = HeadlessViewer::new(options.clone(), width, height)?;
    Ok(viewer.render(Mat4::IDENTITY)?.into_raw())
}

/// Renders one frame and saves it as PNG or JPEG, chosen by extension.
pub fn render_to_file(
    path: impl AsRef<Path>,
    options: &Options,
    width: u32,
    height: u32,
) -> Result<()> {
    let mut viewer = HeadlessViewer::new(options.clone(), width, height)?;
    let image = viewer.render(Mat4::IDENTITY)?;
    save_image(path, &image)?;
    Ok(())
}
