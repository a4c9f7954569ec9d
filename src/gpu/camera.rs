//! Orbit camera for the sprite sink.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Where the demo camera starts, looking at the origin.
pub const DEFAULT_EYE: Vec3 = Vec3::new(3.0, 3.0, 5.0);

/// Vertical field of view in degrees.
pub const DEFAULT_FOV_DEGREES: f32 = 30.0;

const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 20.0;
const PITCH_LIMIT: f32 = 1.5;

/// Orbit camera around a target point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
}

impl Camera {
    pub fn new() -> Self {
        Self::looking_from(DEFAULT_EYE, Vec3::ZERO)
    }

    /// Camera placed at `eye`, orbiting `target`.
    pub fn looking_from(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let distance = offset.length().max(MIN_DISTANCE);
        Self {
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            distance,
            target,
            fov_y: DEFAULT_FOV_DEGREES.to_radians(),
        }
    }

    /// The camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, 0.01, 100.0)
    }

    /// Rotate by a mouse drag of `dx`, `dy` pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * 0.005;
        self.pitch = (self.pitch + dy * 0.005).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Move toward (positive) or away from the target.
    pub fn zoom(&mut self, amount: f32) {
        self.distance = (self.distance - amount * 0.3).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Uniform block consumed by the sprite shader.
    pub(crate) fn uniforms(&self, aspect: f32) -> CameraUniforms {
        let view = self.view_matrix();
        // Rows of the view rotation are the camera basis in world space.
        let right = view.row(0).truncate();
        let up = view.row(1).truncate();
        CameraUniforms {
            view_proj: (self.projection_matrix(aspect) * view).to_cols_array_2d(),
            right: right.extend(0.0).to_array(),
            up: up.extend(0.0).to_array(),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub right: [f32; 4],
    pub up: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera_position() {
        let camera = Camera::new();
        assert!((camera.position() - DEFAULT_EYE).length() < 1e-4);
        assert!((camera.fov_y - 30f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = Camera::new();
        camera.zoom(1000.0);
        assert_eq!(camera.distance, MIN_DISTANCE);
        camera.zoom(-1000.0);
        assert_eq!(camera.distance, MAX_DISTANCE);
    }

    #[test]
    fn test_orbit_pitch_is_clamped() {
        let mut camera = Camera::new();
        camera.orbit(0.0, 10_000.0);
        assert_eq!(camera.pitch, PITCH_LIMIT);
    }

    #[test]
    fn test_billboard_basis_is_orthonormal() {
        let u = Camera::new().uniforms(16.0 / 9.0);
        let right = Vec3::from_slice(&u.right[..3]);
        let up = Vec3::from_slice(&u.up[..3]);
        assert!((right.length() - 1.0).abs() < 1e-5);
        assert!((up.length() - 1.0).abs() < 1e-5);
        assert!(right.dot(up).abs() < 1e-5);
    }
}
