//! Capability traits for session-owned anchors and planes.
//!
//! Implementors are cheap handles (typically an id plus a shared reference to
//! session state). Cloning a handle never duplicates the tracked entity.

use std::str::FromStr;

use anyhow::bail;

use crate::geometry::SE3;

use super::{AnchorId, PlaneId, TrackingState};

/// Orientation class of a detected plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaneType {
    /// Floors, table tops.
    HorizontalUpwardFacing,
    /// Ceilings.
    HorizontalDownwardFacing,
    Vertical,
}

impl FromStr for PlaneType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "horizontal_upward_facing" => Ok(Self::HorizontalUpwardFacing),
            "down" | "horizontal_downward_facing" => Ok(Self::HorizontalDownwardFacing),
            "vertical" => Ok(Self::Vertical),
            other => bail!("unknown plane type '{}'", other),
        }
    }
}

/// A fixed point in the physical world whose pose the session keeps refining.
pub trait Anchor: Clone {
    fn id(&self) -> AnchorId;

    fn tracking_state(&self) -> TrackingState;

    /// Current pose estimate (`T_world_anchor`).
    ///
    /// Only meaningful while `tracking_state()` is `Tracking`.
    fn pose(&self) -> SE3;
}

/// A detected flat surface.
pub trait Plane: Clone {
    fn id(&self) -> PlaneId;

    fn plane_type(&self) -> PlaneType;

    fn tracking_state(&self) -> TrackingState;

    /// Pose of the plane center; local +Y is the surface normal.
    fn center_pose(&self) -> SE3;

    /// Whether `pose` lies inside the detected boundary polygon.
    fn is_pose_in_polygon(&self, pose: &SE3) -> bool;
}
