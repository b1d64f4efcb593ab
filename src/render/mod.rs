//! Per-frame driver between the AR session and the 3D engine.
//!
//! `FrameLoop::on_draw_frame` is the one entry point called per display
//! frame. It is the only code that mutates the attachment list or consumes
//! taps, and it reports what happened as a `FrameOutcome` instead of
//! swallowing errors.

pub mod frame_loop;
pub mod outcome;
pub mod sink;

pub use frame_loop::{FrameLoop, FrameLoopStats, SurfaceSearch};
pub use outcome::{FrameOutcome, FrameReport, SkipReason, TapOutcome};
pub use sink::{RenderSink, ViewContext};
