//! Bounded, insertion-ordered collection of plane attachments.
//!
//! At capacity the oldest attachment is evicted and its anchor released back
//! to the session before the new one is appended. Stale attachments are kept;
//! they are skipped when rendering and may resume tracking later.

use std::collections::VecDeque;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::geometry::SE3;
use crate::session::ArSession;
use crate::tracking::{Anchor, Plane};

use super::{AttachmentId, PlaneAttachment};

/// Default cap on placed objects. Keeps both the renderer and the tracker
/// from being overloaded with anchors.
pub const MAX_ATTACHMENTS: usize = 16;

/// Result of a successful `try_attach`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachOutcome {
    pub id: AttachmentId,
    /// Attachment evicted to make room, if the list was full.
    pub evicted: Option<AttachmentId>,
}

/// Placed objects, oldest first.
#[derive(Debug)]
pub struct AttachmentList<P, A> {
    entries: VecDeque<PlaneAttachment<P, A>>,
    capacity: usize,
    next_id: u64,
}

impl<P: Plane, A: Anchor> AttachmentList<P, A> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 0,
        }
    }

    /// Anchor a new object at `hit_pose` on `plane`.
    ///
    /// The caller has already checked that the hit lies inside the plane
    /// polygon. Fails without touching the list if the plane is not tracking
    /// or the session refuses to create the anchor.
    pub fn try_attach<S>(&mut self, session: &mut S, plane: P, hit_pose: &SE3) -> Result<AttachOutcome>
    where
        S: ArSession<Plane = P, Anchor = A>,
    {
        if !plane.tracking_state().is_tracking() {
            bail!("plane {} is {}", plane.id(), plane.tracking_state());
        }
        let anchor = session
            .add_anchor(hit_pose)
            .with_context(|| format!("failed to anchor object on plane {}", plane.id()))?;

        let evicted = if self.entries.len() >= self.capacity {
            self.evict_oldest(session)
        } else {
            None
        };

        let id = AttachmentId::new(self.next_id);
        self.next_id += 1;
        debug!(
            attachment = %id,
            plane = %plane.id(),
            anchor = %anchor.id(),
            x = hit_pose.translation.x,
            y = hit_pose.translation.y,
            z = hit_pose.translation.z,
            "Object attached"
        );
        self.entries.push_back(PlaneAttachment::new(id, plane, anchor));

        Ok(AttachOutcome { id, evicted })
    }

    fn evict_oldest<S>(&mut self, session: &mut S) -> Option<AttachmentId>
    where
        S: ArSession<Plane = P, Anchor = A>,
    {
        let oldest = self.entries.pop_front()?;
        session.remove_anchors(std::slice::from_ref(oldest.anchor()));
        debug!(attachment = %oldest.id(), anchor = %oldest.anchor().id(), "Evicted oldest object");
        Some(oldest.id())
    }

    /// Every tracking attachment with its effective pose, oldest first.
    ///
    /// Stale attachments are skipped for this frame but stay in the list.
    pub fn active_poses(&self) -> Vec<(&PlaneAttachment<P, A>, SE3)> {
        self.entries
            .iter()
            .filter_map(|attachment| attachment.pose().map(|pose| (attachment, pose)))
            .collect()
    }

    /// Drop every attachment and release all their anchors in one call.
    pub fn clear<S>(&mut self, session: &mut S)
    where
        S: ArSession<Plane = P, Anchor = A>,
    {
        if self.entries.is_empty() {
            return;
        }
        let anchors: Vec<A> = self.entries.drain(..).map(|a| a.anchor().clone()).collect();
        session.remove_anchors(&anchors);
        info!(released = anchors.len(), "Released all placed objects");
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlaneAttachment<P, A>> {
        self.entries.iter()
    }

    pub fn get(&self, id: AttachmentId) -> Option<&PlaneAttachment<P, A>> {
        self.entries.iter().find(|a| a.id() == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<P: Plane, A: Anchor> Default for AttachmentList<P, A> {
    fn default() -> Self {
        Self::new(MAX_ATTACHMENTS)
    }
}
