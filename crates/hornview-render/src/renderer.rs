//! Frame rendering: pass planning and per-pass uniform updates.

use hornview_core::{
    generate_marker_sphere, generate_surface, DrawRange, FrameParams, MarkerParams, MeshGroup,
    Options, RenderMode, SurfaceParams,
};

use crate::buffer::pack_mesh_group;
use crate::camera::{mono_transforms, Eye, EyeTransforms, StereoCamera};
use crate::engine::RenderEngine;
use crate::error::RenderResult;
use crate::shader::{ShaderBuilder, ShaderProgram};

/// Color channels a pass may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMask {
    All,
    /// Left eye of an anaglyph.
    RedAlpha,
    /// Right eye of an anaglyph.
    GreenBlueAlpha,
}

impl ColorMask {
    #[must_use]
    pub fn writes(self) -> wgpu::ColorWrites {
        match self {
            ColorMask::All => wgpu::ColorWrites::ALL,
            ColorMask::RedAlpha => wgpu::ColorWrites::RED | wgpu::ColorWrites::ALPHA,
            ColorMask::GreenBlueAlpha => {
                wgpu::ColorWrites::GREEN | wgpu::ColorWrites::BLUE | wgpu::ColorWrites::ALPHA
            }
        }
    }
}

/// Pixel rectangle of a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }
}

/// One draw pass of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyePass {
    pub eye: Eye,
    pub mask: ColorMask,
    pub viewport: Viewport,
    /// Clear color before drawing instead of loading it.
    pub clear_color: bool,
    /// Clear depth before drawing.
    pub clear_depth: bool,
}

/// Passes needed to render `mode` into a `width` x `height` target.
///
/// Every pass clears depth so the second eye is not occluded by the first.
#[must_use]
pub fn plan_passes(mode: RenderMode, width: u32, height: u32) -> Vec<EyePass> {
    let full = Viewport {
        x: 0.0,
        y: 0.0,
        width: width as f32,
        height: height as f32,
    };

    match mode {
        RenderMode::Mono => vec![EyePass {
            eye: Eye::Center,
            mask: ColorMask::All,
            viewport: full,
            clear_color: true,
            clear_depth: true,
        }],
        RenderMode::SideBySide => {
            let half = width as f32 * 0.5;
            vec![
                EyePass {
                    eye: Eye::Left,
                    mask: ColorMask::All,
                    viewport: Viewport { width: half, ..full },
                    clear_color: true,
                    clear_depth: true,
                },
                EyePass {
                    eye: Eye::Right,
                    mask: ColorMask::All,
                    viewport: Viewport {
                        x: half,
                        width: half,
                        ..full
                    },
                    clear_color: false,
                    clear_depth: true,
                },
            ]
        }
        RenderMode::Anaglyph => vec![
            EyePass {
                eye: Eye::Left,
                mask: ColorMask::RedAlpha,
                viewport: full,
                clear_color: true,
                clear_depth: true,
            },
            EyePass {
                eye: Eye::Right,
                mask: ColorMask::GreenBlueAlpha,
                viewport: full,
                clear_color: false,
                clear_depth: true,
            },
        ],
    }
}

/// Transforms for one pass of `frame`.
pub fn pass_transforms(frame: &FrameParams, pass: &EyePass) -> RenderResult<EyeTransforms> {
    let aspect = pass.viewport.aspect_ratio();
    if pass.eye == Eye::Center {
        return Ok(mono_transforms(
            &frame.ortho,
            aspect,
            &frame.scene,
            frame.orbit_view,
            frame.sensor_rotation,
        ));
    }
    let camera = StereoCamera::new(frame.stereo, aspect)?;
    Ok(camera.eye_transforms(
        pass.eye,
        &frame.scene,
        frame.orbit_view,
        frame.sensor_rotation,
    ))
}

/// Builds the surface and marker meshes into one group.
pub fn build_mesh_group(surface: &SurfaceParams, marker: &MarkerParams) -> RenderResult<MeshGroup> {
    let mut group = MeshGroup::new().with_mesh(generate_surface(surface)?);
    if marker.enabled {
        group.push(generate_marker_sphere(marker)?);
    }
    Ok(group)
}

/// Draws the horn surface with one program.
pub struct Renderer {
    program: ShaderProgram,
    draw_ranges: Vec<DrawRange>,
}

impl Renderer {
    /// Generates the meshes, builds the program and uploads the vertices.
    pub fn new(engine: &RenderEngine, options: &Options) -> RenderResult<Self> {
        let group = build_mesh_group(&options.surface, &options.marker)?;
        let packed = pack_mesh_group(&group)?;

        let mut program =
            ShaderBuilder::surface().build(&engine.device, &engine.queue, engine.color_format())?;
        program.upload_interleaved_buffer(
            &engine.device,
            packed.bytes(),
            &packed.attribute_bindings(),
        )?;

        Ok(Self {
            program,
            draw_ranges: packed.draw_ranges().to_vec(),
        })
    }

    #[must_use]
    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    /// Replaces the surface texture.
    pub fn set_texture(&mut self, engine: &RenderEngine, image: &image::RgbaImage) -> RenderResult<()> {
        self.program.set_texture(&engine.device, &engine.queue, image)?;
        let (width, height) = self.program.texture_size();
        log::debug!("surface texture is now {width}x{height}");
        Ok(())
    }

    fn push_uniforms(&mut self, frame: &FrameParams, transforms: &EyeTransforms) -> RenderResult<()> {
        let material = &frame.material;
        let program = &mut self.program;
        program.set_uniform("model_view_matrix", transforms.model_view)?;
        program.set_uniform("projection_matrix", transforms.projection)?;
        program.set_uniform("normal_matrix", transforms.normal_matrix)?;
        program.set_uniform("light_position", material.light_position)?;
        program.set_uniform("u_texture_scale", material.texture_scale)?;
        program.set_uniform("u_texture_center", material.texture_center)?;
        program.set_uniform("u_texture_rot_axis", material.texture_rot_axis)?;
        program.set_uniform("u_texture_rot_angle_deg", material.texture_rot_angle_deg)?;
        Ok(())
    }

    /// Renders a full frame into `target`, which must match the engine size.
    ///
    /// Each pass is submitted on its own so it sees its own uniforms.
    pub fn render_frame(
        &mut self,
        engine: &RenderEngine,
        target: &wgpu::TextureView,
        frame: &FrameParams,
    ) -> RenderResult<()> {
        let passes = plan_passes(frame.mode, engine.width, engine.height);
        log::debug!("rendering {:?} frame in {} passes", frame.mode, passes.len());

        let background = wgpu::Color {
            r: f64::from(frame.background_color.x),
            g: f64::from(frame.background_color.y),
            b: f64::from(frame.background_color.z),
            a: 1.0,
        };

        for pass in &passes {
            let transforms = pass_transforms(frame, pass)?;
            self.push_uniforms(frame, &transforms)?;
            self.program.flush_uniforms(&engine.queue);
            let writes = pass.mask.writes();
            self.program.prepare(&engine.device, writes)?;

            let mut encoder = engine
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("surface encoder"),
                });
            {
                let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("surface pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: if pass.clear_color {
                                wgpu::LoadOp::Clear(background)
                            } else {
                                wgpu::LoadOp::Load
                            },
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &engine.depth_view,
                        depth_ops: Some(wgpu::Operations {
                            load: if pass.clear_depth {
                                wgpu::LoadOp::Clear(1.0)
                            } else {
                                wgpu::LoadOp::Load
                            },
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    ..Default::default()
                });

                let v = pass.viewport;
                render_pass.set_viewport(v.x, v.y, v.width, v.height, 0.0, 1.0);
                self.program.draw(&mut render_pass, writes, &self.draw_ranges)?;
            }
            engine.queue.submit(std::iter::once(encoder.finish()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec4};
    use hornview_core::{Options, ViewerState};

    fn channels(mask: ColorMask) -> (bool, bool, bool, bool) {
        let w = mask.writes();
        (
            w.contains(wgpu::ColorWrites::RED),
            w.contains(wgpu::ColorWrites::GREEN),
            w.contains(wgpu::ColorWrites::BLUE),
            w.contains(wgpu::ColorWrites::ALPHA),
        )
    }

    #[test]
    fn test_anaglyph_splits_channels() {
        let passes = plan_passes(RenderMode::Anaglyph, 800, 600);
        assert_eq!(passes.len(), 2);
        assert_eq!(passes[0].eye, Eye::Left);
        assert_eq!(channels(passes[0].mask), (true, false, false, true));
        assert_eq!(passes[1].eye, Eye::Right);
        assert_eq!(channels(passes[1].mask), (false, true, true, true));

        // Second pass keeps the red channel and starts with fresh depth.
        assert!(passes[0].clear_color);
        assert!(!passes[1].clear_color);
        assert!(passes.iter().all(|p| p.clear_depth));
    }

    #[test]
    fn test_side_by_side_viewports() {
        let passes = plan_passes(RenderMode::SideBySide, 800, 600);
        assert_eq!(passes.len(), 2);
        let (l, r) = (passes[0].viewport, passes[1].viewport);
        assert_eq!((l.x, l.width, l.height), (0.0, 400.0, 600.0));
        assert_eq!((r.x, r.width, r.height), (400.0, 400.0, 600.0));
        assert!((l.aspect_ratio() - 400.0 / 600.0).abs() < 1e-6);
        assert!(passes.iter().all(|p| p.mask == ColorMask::All));
    }

    #[test]
    fn test_mono_is_single_full_pass() {
        let passes = plan_passes(RenderMode::Mono, 640, 480);
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].eye, Eye::Center);
        assert_eq!(passes[0].viewport.width, 640.0);
    }

    #[test]
    fn test_eye_passes_differ_only_by_shift() {
        let state = ViewerState::new(Options::default()).unwrap();
        let frame = state.snapshot(Mat4::IDENTITY);
        let passes = plan_passes(RenderMode::Anaglyph, 800, 600);
        let left = pass_transforms(&frame, &passes[0]).unwrap();
        let right = pass_transforms(&frame, &passes[1]).unwrap();

        let origin = Vec4::new(0.0, 0.0, 0.0, 1.0);
        let dl = left.model_view * origin;
        let dr = right.model_view * origin;
        let sep = frame.stereo.eye_separation;
        assert!(((dl.x - dr.x) - sep).abs() < 1e-5);
        assert_ne!(left.projection, right.projection);
    }

    #[test]
    fn test_mesh_group_contains_marker_when_enabled() {
        let options = Options::default();
        let group = build_mesh_group(&options.surface, &options.marker).unwrap();
        assert_eq!(group.meshes().len(), 2);
        assert_eq!(
            group.meshes()[0].vertex_count(),
            options.surface.vertex_count()
        );

        let mut marker = options.marker;
        marker.enabled = false;
        let group = build_mesh_group(&options.surface, &marker).unwrap();
        assert_eq!(group.meshes().len(), 1);
    }
}
