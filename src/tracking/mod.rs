//! Read-only views of externally tracked entities.
//!
//! Anchors and planes are owned by the AR session. This crate only holds
//! handles to them and reads their current pose and tracking state; it never
//! transitions that state itself.

pub mod handles;
pub mod state;
pub mod types;

pub use handles::{Anchor, Plane, PlaneType};
pub use state::TrackingState;
pub use types::{AnchorId, PlaneId};
