//! Virtual objects pinned to detected surfaces.
//!
//! A `PlaneAttachment` binds one anchor to the plane it was created on.
//! `AttachmentList` keeps a bounded, insertion-ordered set of them and hands
//! out render-ready poses once per frame.

pub mod list;
pub mod plane_attachment;
pub mod types;

pub use list::{AttachOutcome, AttachmentList, MAX_ATTACHMENTS};
pub use plane_attachment::PlaneAttachment;
pub use types::AttachmentId;
