//! `RenderSink` that reports draw calls through `tracing` instead of a GPU.
//!
//! Used by the demo binary to make the frame loop observable:
//!     frame       - background draws (one per session frame)
//!     point_cloud - feature point counts
//!     planes      - tracked / total planes
//!     object      - world position of each placed object

use nalgebra::{Matrix4, Vector3};
use tracing::{debug, trace};

use crate::attachment::AttachmentId;
use crate::render::{RenderSink, ViewContext};
use crate::session::Frame;
use crate::tracking::Plane;

/// Totals over every draw call received.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogSinkTotals {
    pub backgrounds: u64,
    pub plane_draws: u64,
    pub object_draws: u64,
}

#[derive(Debug, Default)]
pub struct LogSink {
    totals: LogSinkTotals,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn totals(&self) -> &LogSinkTotals {
        &self.totals
    }
}

impl RenderSink for LogSink {
    fn draw_background(&mut self, frame: &Frame) {
        self.totals.backgrounds += 1;
        trace!(timestamp_ns = frame.timestamp_ns, state = %frame.tracking_state, "frame");
    }

    fn draw_point_cloud(&mut self, points: &[Vector3<f64>], _ctx: &ViewContext) {
        trace!(points = points.len(), "point_cloud");
    }

    fn draw_planes<P: Plane>(&mut self, planes: &[P], _ctx: &ViewContext) {
        self.totals.plane_draws += 1;
        let tracked = planes
            .iter()
            .filter(|p| p.tracking_state().is_tracking())
            .count();
        trace!(tracked, total = planes.len(), "planes");
    }

    fn draw_object(&mut self, id: AttachmentId, model: &Matrix4<f32>, ctx: &ViewContext) {
        self.totals.object_draws += 1;
        debug!(
            object = %id,
            x = model[(0, 3)],
            y = model[(1, 3)],
            z = model[(2, 3)],
            light = ctx.light_intensity,
            "object"
        );
    }
}
