//! ID types for session-owned entities.

/// Identifier of an anchor.
///
/// Handed out by the session when `add_anchor` succeeds and never reused
/// within that session, even after the anchor is removed. Ordered so the
/// simulated world can keep anchors in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub u64);

impl AnchorId {
    /// Wrap a raw session id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AnchorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "A{}", self.0)
    }
}

/// Identifier of a detected plane.
///
/// The session assigns it when the surface is first detected. It stays the
/// same while the plane grows, moves or loses tracking. Ordered like
/// `AnchorId`, so planes are listed in detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaneId(pub u64);

impl PlaneId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for PlaneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PL{}", self.0)
    }
}
