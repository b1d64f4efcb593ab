//! What happened during one call to `FrameLoop::on_draw_frame`.

use crate::attachment::AttachOutcome;

/// Result of one display frame.
#[derive(Debug)]
pub enum FrameOutcome {
    /// 3D content was drawn.
    Rendered(FrameReport),
    /// No 3D content this frame; the next frame tries again.
    Skipped(SkipReason),
}

#[derive(Debug)]
pub enum SkipReason {
    /// The session could not produce a frame (paused, transient tracker error).
    UpdateFailed(anyhow::Error),
    /// A frame was produced but the camera is not tracking. The background
    /// was still drawn.
    NotTracking,
}

/// Summary of a rendered frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub timestamp_ns: u64,
    pub tap: TapOutcome,
    /// Tracking attachments drawn this frame.
    pub objects_drawn: usize,
    /// Attachments kept but skipped because their plane or anchor is not tracking.
    pub stale_objects: usize,
    /// True on the frame that ended the surface search.
    pub surface_found: bool,
}

/// Fate of the tap handled this frame, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum TapOutcome {
    /// No tap was queued.
    None,
    /// A tap was taken from the queue while the camera was not tracking.
    Discarded,
    /// The tap hit no tracked plane inside its polygon.
    Missed,
    Attached(AttachOutcome),
    /// A plane was hit but no object could be anchored there.
    Rejected(String),
}
