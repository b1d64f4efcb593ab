//! World and camera frame conventions used by the AR session.
//!
//! # World Frame (Y-up, gravity aligned)
//! ```text
//!        +Y (up)
//!         |
//!         |
//!         +------ +X (right)
//!        /
//!       /
//!      +Z (toward the viewer at session start)
//! ```
//! Heights are measured along +Y. Horizontal planes have their local +Y
//! axis as the surface normal; their polygon lives in the local XZ plane.
//!
//! # Camera Frame (GL convention)
//! - X: Right
//! - Y: Up
//! - Z: Backward (the camera looks down -Z)
//!
//! Camera poses are `T_world_cam`. The view matrix handed to the renderer is
//! its inverse.
//!
//! # Screen Coordinates
//! Taps arrive in pixels with the origin at the top-left corner, X to the
//! right and Y down.

use nalgebra::{Matrix4, Perspective3, Vector3};
use serde::Deserialize;

use super::SE3;

/// Index of the vertical (height) coordinate in world-frame vectors.
pub const HEIGHT_AXIS: usize = 1;

/// Unit up vector in the world frame.
pub const WORLD_UP: Vector3<f64> = Vector3::new(0.0, 1.0, 0.0);

/// Below this |cos| a ray is treated as parallel to a plane.
const PARALLEL_EPSILON: f64 = 1e-9;

/// Size of the rendering surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplayGeometry {
    pub width: f64,
    pub height: f64,
}

impl DisplayGeometry {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    /// Both sides finite and strictly positive; anything else has no usable aspect ratio.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl Default for DisplayGeometry {
    fn default() -> Self {
        // Portrait 1080p phone.
        Self::new(1080.0, 1920.0)
    }
}

/// Half-line in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vector3<f64>,
    /// Unit length.
    pub direction: Vector3<f64>,
}

impl Ray {
    /// Ray from the camera center through pixel `(x, y)`.
    pub fn through_pixel(
        camera_pose: &SE3,
        display: &DisplayGeometry,
        fov_y_rad: f64,
        x: f64,
        y: f64,
    ) -> Self {
        let ndc_x = 2.0 * x / display.width - 1.0;
        let ndc_y = 1.0 - 2.0 * y / display.height;
        let tan_half = (fov_y_rad * 0.5).tan();

        let dir_cam = Vector3::new(ndc_x * tan_half * display.aspect(), ndc_y * tan_half, -1.0);
        let direction = camera_pose.rotation.transform_vector(&dir_cam).normalize();

        Self {
            origin: camera_pose.translation,
            direction,
        }
    }

    #[inline]
    pub fn point_at(&self, t: f64) -> Vector3<f64> {
        self.origin + self.direction * t
    }

    /// Distance along the ray to the plane through `center` whose normal is
    /// the local +Y axis of `center`. `None` if parallel or behind the origin.
    pub fn intersect_plane(&self, center: &SE3) -> Option<f64> {
        let normal = center.rotation.transform_vector(&WORLD_UP);
        let denom = normal.dot(&self.direction);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = normal.dot(&(center.translation - self.origin)) / denom;
        (t > 0.0).then_some(t)
    }

    /// Returns `(t, perpendicular distance)` of the closest approach to `p`,
    /// or `None` if `p` lies behind the origin.
    pub fn closest_approach(&self, p: &Vector3<f64>) -> Option<(f64, f64)> {
        let v = p - self.origin;
        let t = v.dot(&self.direction);
        if t <= 0.0 {
            return None;
        }
        Some((t, (v - self.direction * t).norm()))
    }
}

/// OpenGL-style perspective projection for the given display.
pub fn perspective(display: &DisplayGeometry, fov_y_rad: f64, near: f64, far: f64) -> Matrix4<f64> {
    Perspective3::new(display.aspect(), fov_y_rad, near, far).to_homogeneous()
}
