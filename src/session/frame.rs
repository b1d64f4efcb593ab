//! Per-frame snapshot returned by `ArSession::update`.

use nalgebra::{Matrix4, Vector3};

use crate::geometry::SE3;
use crate::tracking::TrackingState;

/// State of the session at one camera frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub timestamp_ns: u64,
    pub tracking_state: TrackingState,
    /// Camera pose (`T_world_cam`).
    pub camera_pose: SE3,
    /// Average pixel intensity of the camera image, in [0, 1].
    pub light_intensity: f32,
    /// Tracked feature points in world coordinates.
    pub point_cloud: Vec<Vector3<f64>>,
}

impl Frame {
    #[inline]
    pub fn is_tracking(&self) -> bool {
        self.tracking_state.is_tracking()
    }

    /// World-to-camera matrix for the renderer.
    pub fn view_matrix(&self) -> Matrix4<f64> {
        self.camera_pose.inverse().to_matrix()
    }
}
