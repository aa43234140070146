//! Orbit camera for the demo scene.

use glam::{Mat4, Vec3};

/// Orbit camera: yaw/pitch around a target point at a fixed distance.
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.3,
            distance: 3.0,
            target: Vec3::ZERO,
        }
    }

    /// The camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// World -> view transform.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// View -> clip transform for the given aspect ratio.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(45.0_f32.to_radians(), aspect, 0.1, 1000.0)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_respects_distance() {
        let camera = Camera::new();
        let offset = camera.position() - camera.target;
        assert!((offset.length() - camera.distance).abs() < 1e-4);
    }

    #[test]
    fn test_view_matrix_moves_target_onto_forward_axis() {
        let camera = Camera::new();
        let target_view = camera.view_matrix() * camera.target.extend(1.0);
        // Looking down -Z in view space.
        assert!(target_view.x.abs() < 1e-4);
        assert!(target_view.y.abs() < 1e-4);
        assert!((target_view.z + camera.distance).abs() < 1e-4);
    }
}
