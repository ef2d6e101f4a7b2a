//! Procedural meshes: the horn revolution surface and the marker sphere.
//!
//! Both generators emit a single triangle strip. For every sample on the
//! parameter grid the strip receives the sample itself followed immediately by
//! its diagonal neighbour one step further along both parameters, so one draw
//! call covers the whole surface.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::error::Result;
use crate::mesh::Mesh;
use crate::options::{MarkerParams, SurfaceParams};

const FULL_TURN_DEG: f32 = 360.0;

/// Profile radius `r(z) = (|z| - H)^2 / (2P)`.
#[must_use]
pub fn profile_radius(params: &SurfaceParams, z: f32) -> f32 {
    (z.abs() - params.height).powi(2) / (2.0 * params.profile)
}

/// Surface position at height `z` and azimuth `b` (degrees).
#[must_use]
pub fn to_vertex(params: &SurfaceParams, z: f32, b: f32) -> Vec3 {
    let r = profile_radius(params, z);
    let b = b.to_radians();
    Vec3::new(r * b.cos(), r * b.sin(), z)
}

/// Texture coordinate at height `z` and azimuth `b` (degrees).
#[must_use]
pub fn to_uv(params: &SurfaceParams, z: f32, b: f32) -> Vec2 {
    let u = (z + params.height) / (2.0 * params.height);
    let v = b / FULL_TURN_DEG;
    Vec2::new(u, v)
}

/// Generates the horn surface as one triangle strip.
///
/// Emits `2 * z_steps * (azimuth_steps + 1)` vertices. The diagonal
/// neighbour of the last azimuth sample is clamped to 360 degrees so the
/// seam closes and `v` stays within `[0, 1]`.
pub fn generate_surface(params: &SurfaceParams) -> Result<Mesh> {
    params.validate()?;

    // Sample positions come from integer step indices so no float drift accumulates.
    let z_at = |i: u32| {
        -params.height + 2.0 * params.height * (i as f32 / params.z_steps as f32)
    };
    let b_at = |j: u32| {
        (FULL_TURN_DEG * (j as f32 / params.azimuth_steps as f32)).min(FULL_TURN_DEG)
    };
    let count = params.vertex_count();
    let mut positions = Vec::with_capacity(count);
    let mut uvs = Vec::with_capacity(count);

    for zi in 0..params.z_steps {
        let z = z_at(zi);
        let z_next = z_at(zi + 1);

        for bi in 0..=params.azimuth_steps {
            let b = b_at(bi);
            let b_next = b_at(bi + 1);

            positions.push(to_vertex(params, z, b));
            uvs.push(to_uv(params, z, b));

            positions.push(to_vertex(params, z_next, b_next));
            uvs.push(to_uv(params, z_next, b_next));
        }
    }

    log::debug!(
        "generated horn surface: {} vertices (H={}, P={})",
        positions.len(),
        params.height,
        params.profile
    );
    Mesh::new(positions, uvs)
}

/// Generates the marker sphere as one triangle strip.
///
/// Uses the same doubled-vertex emission as the surface over a
/// `stacks x slices` latitude/longitude grid, producing
/// `2 * stacks * (slices + 1)` vertices.
pub fn generate_marker_sphere(params: &MarkerParams) -> Result<Mesh> {
    params.validate()?;

    let center = Vec3::new(params.offset, 0.0, 0.0);
    let point = |stack: u32, slice: u32| {
        let phi = PI * stack as f32 / params.stacks as f32;
        let theta = 2.0 * PI * slice as f32 / params.slices as f32;
        let dir = Vec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos());
        let uv = Vec2::new(
            slice as f32 / params.slices as f32,
            stack as f32 / params.stacks as f32,
        );
        (center + dir * params.radius, uv)
    };

    let count = params.vertex_count();
    let mut positions = Vec::with_capacity(count);
    let mut uvs = Vec::with_capacity(count);

    for stack in 0..params.stacks {
        for slice in 0..=params.slices {
            let (p, uv) = point(stack, slice);
            positions.push(p);
            uvs.push(uv);

            let (p, uv) = point(stack + 1, (slice + 1).min(params.slices));
            positions.push(p);
            uvs.push(uv);
        }
    }

    Mesh::new(positions, uvs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn reference_params() -> SurfaceParams {
        SurfaceParams {
            height: 1.0,
            profile: 0.5,
            z_steps: 20,
            azimuth_steps: 72,
        }
    }

    #[test]
    fn test_reference_surface_first_vertex_and_count() {
        let params = reference_params().with_azimuth_step_degrees(5.0).unwrap();
        let mesh = generate_surface(&params).unwrap();

        assert_eq!(mesh.vertex_count(), 2 * 20 * (72 + 1));
        assert_eq!(mesh.positions()[0], to_vertex(&params, -1.0, 0.0));
        assert_eq!(mesh.uvs()[0], Vec2::new(0.0, 0.0));
    }

    #[test]
    fn test_sample_is_followed_by_diagonal_neighbour() {
        let params = reference_params();
        let mesh = generate_surface(&params).unwrap();
        let dz = params.z_step();
        let db = params.azimuth_step_degrees();

        for (i, pair) in mesh.positions().chunks(2).take(10).enumerate() {
            let b = i as f32 * db;
            let expected_current = to_vertex(&params, -1.0, b);
            let expected_next = to_vertex(&params, -1.0 + dz, b + db);
            assert!(pair[0].abs_diff_eq(expected_current, 1e-5));
            assert!(pair[1].abs_diff_eq(expected_next, 1e-5));
        }
    }

    #[test]
    fn test_profile_radius_vanishes_at_the_tips() {
        let params = reference_params();
        assert!(profile_radius(&params, -1.0).abs() < 1e-6);
        assert!(profile_radius(&params, 1.0).abs() < 1e-6);
        assert!((profile_radius(&params, 0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_last_row_reaches_the_upper_tip() {
        let params = reference_params();
        let mesh = generate_surface(&params).unwrap();
        let last = *mesh.positions().last().unwrap();
        assert!((last.z - params.height).abs() < 1e-5);
        assert!((mesh.uvs().last().unwrap().x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_invalid_profile_is_rejected() {
        let params = SurfaceParams {
            profile: 0.0,
            ..reference_params()
        };
        assert!(generate_surface(&params).is_err());
    }

    #[test]
    fn test_marker_sphere_lies_on_its_radius() {
        let params = MarkerParams::default();
        let mesh = generate_marker_sphere(&params).unwrap();
        let center = Vec3::new(params.offset, 0.0, 0.0);

        assert_eq!(
            mesh.vertex_count(),
            2 * params.stacks as usize * (params.slices as usize + 1)
        );
        for p in mesh.positions() {
            assert!(((*p - center).length() - params.radius).abs() < 1e-5);
        }
        for uv in mesh.uvs() {
            assert!((0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y));
        }
    }

    proptest! {
        #[test]
        fn surface_count_and_uv_range(
            height in 0.1f32..5.0,
            profile in 0.05f32..3.0,
            z_steps in 1u32..40,
            azimuth_steps in 1u32..100,
        ) {
            let params = SurfaceParams { height, profile, z_steps, azimuth_steps };
            let mesh = generate_surface(&params).unwrap();

            prop_assert_eq!(mesh.vertex_count(), 2 * z_steps as usize * (azimuth_steps as usize + 1));
            for uv in mesh.uvs() {
                prop_assert!((0.0..=1.0).contains(&uv.x));
                prop_assert!((0.0..=1.0).contains(&uv.y));
            }
        }
    }
}
