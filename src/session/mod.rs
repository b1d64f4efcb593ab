//! The AR session as seen by this crate.
//!
//! `ArSession` is the seam to the external tracker: it produces per-frame
//! snapshots, answers hit tests and creates or releases anchors. `sim`
//! provides an in-memory implementation for tests and the demo.

pub mod frame;
pub mod hit;
pub mod sim;

use anyhow::Result;
use nalgebra::Matrix4;

use crate::geometry::SE3;
use crate::input::Tap;
use crate::tracking::{Anchor, Plane};

pub use frame::Frame;
pub use hit::{HitResult, PlaneHit, closest_plane_hit};
pub use sim::{SimAnchor, SimPlane, SimSession};

/// External AR tracking session.
pub trait ArSession {
    type Anchor: Anchor;
    type Plane: Plane;

    /// Advance to the latest camera frame. Errors are transient; the caller
    /// skips the frame and tries again on the next one.
    fn update(&mut self) -> Result<Frame>;

    /// Cast a ray from the tapped pixel into the tracked scene.
    /// Results are ordered nearest first.
    fn hit_test(&self, frame: &Frame, tap: &Tap) -> Vec<HitResult<Self::Plane>>;

    /// Ask the session to start tracking a fixed point at `pose`.
    fn add_anchor(&mut self, pose: &SE3) -> Result<Self::Anchor>;

    /// Stop tracking the given anchors and release their resources.
    fn remove_anchors(&mut self, anchors: &[Self::Anchor]);

    /// All planes detected so far, whatever their tracking state.
    fn all_planes(&self) -> Vec<Self::Plane>;

    /// Projection matrix for the current display geometry.
    fn projection_matrix(&self, near: f64, far: f64) -> Matrix4<f64>;

    /// Notify the session that the rendering surface changed size.
    fn set_display_geometry(&mut self, width: f64, height: f64);
}
