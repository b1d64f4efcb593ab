//! Bounded single-producer/single-consumer queue of screen taps.
//!
//! The UI callback offers taps, the frame loop polls at most one per frame.
//! When the queue is full the incoming tap is dropped; queued taps are never
//! evicted, so FIFO order of what was accepted is preserved.

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError, bounded};
use tracing::debug;

/// Default capacity. Taps are low frequency compared to the frame rate.
pub const TAP_QUEUE_CAPACITY: usize = 16;

/// A single tap in screen pixels (origin top-left, Y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tap {
    pub x: f64,
    pub y: f64,
}

impl Tap {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Input side of the tap queue. Owned by the UI thread.
#[derive(Debug)]
pub struct TapProducer {
    sender: Sender<Tap>,
}

/// Output side of the tap queue. Owned by the frame loop.
#[derive(Debug)]
pub struct TapConsumer {
    receiver: Receiver<Tap>,
}

/// Create a tap queue holding at most `capacity` pending taps.
pub fn tap_queue(capacity: usize) -> (TapProducer, TapConsumer) {
    // A zero-capacity crossbeam channel is a rendezvous channel, which would
    // reject every offer from a non-blocking producer.
    let (sender, receiver) = bounded(capacity.max(1));
    (TapProducer { sender }, TapConsumer { receiver })
}

impl TapProducer {
    /// Queue a tap if there is room. Returns `false` if the tap was dropped.
    pub fn offer(&self, tap: Tap) -> bool {
        match self.sender.try_send(tap) {
            Ok(()) => true,
            Err(TrySendError::Full(tap)) => {
                debug!(x = tap.x, y = tap.y, "Tap queue full, dropping tap");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!("Tap consumer gone, dropping tap");
                false
            }
        }
    }
}

impl TapConsumer {
    /// Take the oldest pending tap, if any. Never blocks.
    pub fn poll(&self) -> Option<Tap> {
        match self.receiver.try_recv() {
            Ok(tap) => Some(tap),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.receiver.capacity().unwrap_or(0)
    }
}
