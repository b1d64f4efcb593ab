/// Identifier of a placed object.
///
/// Unlike anchor and plane ids this one is ours: `AttachmentList` counts up
/// from zero on every successful attach, so an evicted id is never handed out
/// again. The renderer may key per-object state on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentId(pub u64);

impl AttachmentId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OBJ{}", self.0)
    }
}
