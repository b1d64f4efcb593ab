//! The 3D engine, seen only as a consumer of matrices.

use nalgebra::{Matrix4, Vector3};

use crate::attachment::AttachmentId;
use crate::session::Frame;
use crate::tracking::Plane;

/// Camera state shared by every draw call of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewContext {
    /// World-to-camera.
    pub view: Matrix4<f64>,
    pub projection: Matrix4<f64>,
    pub light_intensity: f32,
}

/// Receiver of per-frame draw calls.
pub trait RenderSink {
    /// Camera image behind everything. Called for every frame the session
    /// produced, tracking or not.
    fn draw_background(&mut self, frame: &Frame);

    fn draw_point_cloud(&mut self, points: &[Vector3<f64>], ctx: &ViewContext);

    fn draw_planes<P: Plane>(&mut self, planes: &[P], ctx: &ViewContext);

    /// One placed object. `model` is column-major, object-to-world, scaled.
    fn draw_object(&mut self, id: AttachmentId, model: &Matrix4<f32>, ctx: &ViewContext);
}
