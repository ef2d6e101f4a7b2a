//! Trackball orbit controller.

use glam::{Mat4, Quat, Vec2, Vec3};

/// Something that reports the current orbit view matrix.
///
/// The renderer composes this matrix with the scene rotation every frame.
pub trait ViewMatrixSource {
    fn view_matrix(&self) -> Mat4;
}

/// Rotates the scene by dragging a virtual sphere under the cursor.
///
/// Cursor positions are in window pixels with the origin at the top left.
#[derive(Debug, Clone)]
pub struct TrackballController {
    rotation: Quat,
    drag_anchor: Option<Vec3>,
    /// Multiplier on the arc swept by the cursor.
    pub rotate_speed: f32,
}

impl Default for TrackballController {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackballController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rotation: Quat::IDENTITY,
            drag_anchor: None,
            rotate_speed: 1.0,
        }
    }

    /// Current accumulated rotation.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    /// Starts a drag at `cursor`.
    pub fn begin_drag(&mut self, cursor: Vec2, viewport: Vec2) {
        self.drag_anchor = Some(project_to_sphere(cursor, viewport));
    }

    /// Continues a drag; returns `true` when the rotation changed.
    pub fn drag_to(&mut self, cursor: Vec2, viewport: Vec2) -> bool {
        let Some(anchor) = self.drag_anchor else {
            return false;
        };
        let current = project_to_sphere(cursor, viewport);

        let axis = anchor.cross(current);
        if axis.length_squared() < 1e-12 {
            return false;
        }
        let angle = anchor.angle_between(current) * self.rotate_speed;
        let delta = Quat::from_axis_angle(axis.normalize(), angle);

        self.rotation = (delta * self.rotation).normalize();
        self.drag_anchor = Some(current);
        true
    }

    pub fn end_drag(&mut self) {
        self.drag_anchor = None;
    }

    /// Returns to the initial orientation.
    pub fn reset(&mut self) {
        self.rotation = Quat::IDENTITY;
        self.drag_anchor = None;
    }
}

impl ViewMatrixSource for TrackballController {
    fn view_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rotation)
    }
}

/// Maps a cursor onto a unit sphere, blending into a hyperbolic sheet
/// outside its silhouette.
fn project_to_sphere(cursor: Vec2, viewport: Vec2) -> Vec3 {
    let size = viewport.max(Vec2::ONE);
    let radius = size.x.min(size.y) * 0.5;
    let x = (cursor.x - size.x * 0.5) / radius;
    let y = (size.y * 0.5 - cursor.y) / radius;

    let d2 = x * x + y * y;
    let z = if d2 <= 0.5 {
        (1.0 - d2).sqrt()
    } else {
        0.5 / d2.sqrt()
    };
    Vec3::new(x, y, z).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);

    #[test]
    fn test_center_projects_to_front() {
        let p = project_to_sphere(VIEWPORT * 0.5, VIEWPORT);
        assert!((p - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_drag_right_turns_front_right() {
        let mut orbit = TrackballController::new();
        orbit.begin_drag(Vec2::new(400.0, 300.0), VIEWPORT);
        assert!(orbit.drag_to(Vec2::new(500.0, 300.0), VIEWPORT));

        let front = orbit.view_matrix().transform_vector3(Vec3::Z);
        assert!(front.x > 0.1);
        assert!(front.y.abs() < 1e-5);
    }

    #[test]
    fn test_drag_up_turns_front_up() {
        let mut orbit = TrackballController::new();
        orbit.begin_drag(Vec2::new(400.0, 300.0), VIEWPORT);
        orbit.drag_to(Vec2::new(400.0, 200.0), VIEWPORT);

        let front = orbit.view_matrix().transform_vector3(Vec3::Z);
        assert!(front.y > 0.1);
    }

    #[test]
    fn test_drag_without_begin_is_ignored() {
        let mut orbit = TrackballController::new();
        assert!(!orbit.drag_to(Vec2::new(10.0, 10.0), VIEWPORT));
        assert_eq!(orbit.view_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_end_and_reset() {
        let mut orbit = TrackballController::new();
        orbit.begin_drag(Vec2::new(400.0, 300.0), VIEWPORT);
        orbit.drag_to(Vec2::new(450.0, 320.0), VIEWPORT);
        orbit.end_drag();
        assert!(!orbit.is_dragging());
        assert_ne!(orbit.rotation(), Quat::IDENTITY);

        orbit.reset();
        assert_eq!(orbit.view_matrix(), Mat4::IDENTITY);
    }

    proptest! {
        #[test]
        fn prop_view_matrix_stays_rigid(
            moves in prop::collection::vec((0.0f32..800.0, 0.0f32..600.0), 1..20)
        ) {
            let mut orbit = TrackballController::new();
            orbit.begin_drag(Vec2::new(400.0, 300.0), VIEWPORT);
            for (x, y) in moves {
                orbit.drag_to(Vec2::new(x, y), VIEWPORT);
            }
            let m = orbit.view_matrix();
            let should_be_identity = m * m.transpose();
            prop_assert!(should_be_identity.abs_diff_eq(Mat4::IDENTITY, 1e-4));
            prop_assert!((m.determinant() - 1.0).abs() < 1e-4);
        }
    }
}
