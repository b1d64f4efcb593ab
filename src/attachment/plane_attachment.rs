//! Binding of an anchor to the plane it was placed on.

use crate::geometry::SE3;
use crate::tracking::{Anchor, Plane};

use super::AttachmentId;

/// One placed object: the anchor that positions it and its parent plane.
///
/// The rendered pose follows the anchor horizontally and in rotation, but
/// keeps the plane's height so the object stays on the surface while the
/// anchor's vertical estimate drifts.
#[derive(Debug, Clone)]
pub struct PlaneAttachment<P, A> {
    id: AttachmentId,
    plane: P,
    anchor: A,
}

impl<P: Plane, A: Anchor> PlaneAttachment<P, A> {
    pub fn new(id: AttachmentId, plane: P, anchor: A) -> Self {
        Self { id, plane, anchor }
    }

    pub fn id(&self) -> AttachmentId {
        self.id
    }

    pub fn plane(&self) -> &P {
        &self.plane
    }

    pub fn anchor(&self) -> &A {
        &self.anchor
    }

    /// True only while both the plane and the anchor are tracking.
    pub fn is_tracking(&self) -> bool {
        self.plane.tracking_state().is_tracking() && self.anchor.tracking_state().is_tracking()
    }

    /// Effective pose, or `None` while the attachment is stale.
    ///
    /// Poses of non-tracking handles are never read.
    pub fn pose(&self) -> Option<SE3> {
        if !self.is_tracking() {
            return None;
        }
        let plane_height = self.plane.center_pose().height();
        Some(self.anchor.pose().with_height(plane_height))
    }
}
