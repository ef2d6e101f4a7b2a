//! Shader program buffer and pipeline misuse, on a headless device.
//!
//! Every test returns early when no adapter is available.

use hornview_core::{DrawRange, MarkerParams, MeshGroup, SurfaceParams};
use hornview_render::renderer::build_mesh_group;
use hornview_render::*;
use pollster::FutureExt;

fn engine() -> Option<RenderEngine> {
    match RenderEngine::new_headless(64, 64).block_on() {
        Ok(engine) => Some(engine),
        Err(e) => {
            eprintln!("Skipping GPU test (no adapter): {e}");
            None
        }
    }
}

fn surface_program(engine: &RenderEngine) -> ShaderProgram {
    ShaderBuilder::surface()
        .build(&engine.device, &engine.queue, engine.color_format())
        .expect("surface program should build")
}

fn packed_surface() -> PackedMeshGroup {
    let group: MeshGroup =
        build_mesh_group(&SurfaceParams::default(), &MarkerParams::default()).unwrap();
    pack_mesh_group(&group).unwrap()
}

/// Records into one surface pass on a fresh capture target.
fn in_pass<R>(engine: &mut RenderEngine, record: impl FnOnce(&mut wgpu::RenderPass<'_>) -> R) -> R {
    let target = engine.create_capture_target();
    let mut encoder = engine
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("test encoder"),
        });
    let result = {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("test pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &engine.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });
        record(&mut pass)
    };
    engine.queue.submit(std::iter::once(encoder.finish()));
    result
}

#[test]
fn second_upload_is_rejected() {
    let Some(engine) = engine() else { return };
    let mut program = surface_program(&engine);
    let packed = packed_surface();

    program
        .upload_interleaved_buffer(&engine.device, packed.bytes(), &packed.attribute_bindings())
        .unwrap();
    let err = program
        .upload_interleaved_buffer(&engine.device, packed.bytes(), &packed.attribute_bindings())
        .unwrap_err();
    assert!(matches!(err, RenderError::BufferAlreadyUploaded));
}

#[test]
fn draw_before_upload_has_no_vertex_buffer() {
    let Some(mut engine) = engine() else { return };
    let mut program = surface_program(&engine);
    let packed = packed_surface();

    let err = program
        .prepare(&engine.device, wgpu::ColorWrites::ALL)
        .unwrap_err();
    assert!(matches!(err, RenderError::NoVertexBuffer));

    let result = in_pass(&mut engine, |pass| {
        program.draw(pass, wgpu::ColorWrites::ALL, packed.draw_ranges())
    });
    assert!(matches!(result, Err(RenderError::NoVertexBuffer)));
}

#[test]
fn draw_with_unprepared_mask_is_rejected() {
    let Some(mut engine) = engine() else { return };
    let mut program = surface_program(&engine);
    let packed = packed_surface();
    program
        .upload_interleaved_buffer(&engine.device, packed.bytes(), &packed.attribute_bindings())
        .unwrap();
    program.prepare(&engine.device, wgpu::ColorWrites::ALL).unwrap();

    let red = wgpu::ColorWrites::RED | wgpu::ColorWrites::ALPHA;
    let result = in_pass(&mut engine, |pass| program.draw(pass, red, packed.draw_ranges()));
    assert!(matches!(result, Err(RenderError::PipelineNotPrepared(w)) if w == red));

    // The prepared mask still draws.
    let result = in_pass(&mut engine, |pass| {
        program.draw(pass, wgpu::ColorWrites::ALL, packed.draw_ranges())
    });
    assert!(result.is_ok());
}

#[test]
fn draw_past_truncated_upload_is_rejected() {
    let Some(mut engine) = engine() else { return };
    let mut program = surface_program(&engine);
    let packed = packed_surface();

    // Keep every position but only the first uv.
    let truncated = &packed.bytes()[..packed.uv_byte_offset() as usize + 8];
    program
        .upload_interleaved_buffer(&engine.device, truncated, &packed.attribute_bindings())
        .unwrap();
    program.prepare(&engine.device, wgpu::ColorWrites::ALL).unwrap();

    let result = in_pass(&mut engine, |pass| {
        program.draw(pass, wgpu::ColorWrites::ALL, packed.draw_ranges())
    });
    match result {
        Err(RenderError::BufferSizeMismatch { expected, actual }) => {
            assert_eq!(actual, truncated.len());
            assert!(expected > actual);
        }
        other => panic!("expected a buffer size mismatch, got {other:?}"),
    }

    // A range inside what was uploaded is fine.
    let first = [DrawRange { offset: 0, count: 1 }];
    let result = in_pass(&mut engine, |pass| program.draw(pass, wgpu::ColorWrites::ALL, &first));
    assert!(result.is_ok());
}

#[test]
fn ragged_upload_is_rejected() {
    let Some(engine) = engine() else { return };
    let mut program = surface_program(&engine);
    let packed = packed_surface();

    let ragged = &packed.bytes()[..packed.bytes().len() - 1];
    let err = program
        .upload_interleaved_buffer(&engine.device, ragged, &packed.attribute_bindings())
        .unwrap_err();
    assert!(matches!(err, RenderError::BufferSizeMismatch { .. }));
}

#[test]
fn texture_size_follows_set_texture() {
    let Some(engine) = engine() else { return };
    let mut program = surface_program(&engine);
    assert_eq!(program.texture_size(), (1, 1));

    let image = image::RgbaImage::from_pixel(2, 3, image::Rgba([255, 0, 0, 255]));
    program.set_texture(&engine.device, &engine.queue, &image).unwrap();
    assert_eq!(program.texture_size(), (2, 3));
}
