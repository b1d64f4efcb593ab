//! User input handed from the UI thread to the frame loop.

pub mod tap_queue;

pub use tap_queue::{TAP_QUEUE_CAPACITY, Tap, TapConsumer, TapProducer, tap_queue};
