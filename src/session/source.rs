use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::foundation::core::{Frame, Size};

/// Supplies the most recent video frame on each tick.
pub trait FrameSource {
    /// The newest frame not yet consumed, or `None` if nothing new arrived (a stall).
    fn latest_frame(&mut self) -> Option<Frame>;

    /// `false` once the stream has ended; the frame loop then goes idle.
    fn is_active(&self) -> bool {
        true
    }
}

/// Supplies the container's bounding box at geometry time.
pub trait ContainerBounds {
    /// Width and height of the box the canvas must fit in.
    fn bounding_box(&self) -> Size;
}

impl ContainerBounds for Size {
    fn bounding_box(&self) -> Size {
        *self
    }
}

/// A finite, in-memory stream that yields one frame per tick and then ends.
#[derive(Clone, Debug, Default)]
pub struct SequenceSource {
    frames: VecDeque<Frame>,
}

impl SequenceSource {
    /// Stream of `frames`, delivered in order.
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Frames not yet delivered.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for SequenceSource {
    fn latest_frame(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }

    fn is_active(&self) -> bool {
        !self.frames.is_empty()
    }
}

#[derive(Debug, Default)]
struct Slot {
    frame: Option<Frame>,
    ended: bool,
    overwritten: u64,
}

/// Single-frame mailbox between a producer thread and the frame loop.
///
/// Publishing replaces any frame the loop has not consumed yet: older frames are discarded, never
/// queued, so each tick sees the most recent frame available.
#[derive(Clone, Debug, Default)]
pub struct LatestFrameSlot {
    inner: Arc<Mutex<Slot>>,
}

/// Producer side of a [`LatestFrameSlot`].
#[derive(Clone, Debug)]
pub struct FramePublisher {
    inner: Arc<Mutex<Slot>>,
}

impl LatestFrameSlot {
    /// An empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// A producer handle; clone it freely.
    pub fn publisher(&self) -> FramePublisher {
        FramePublisher {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Frames that were replaced before the loop consumed them.
    pub fn overwritten(&self) -> u64 {
        lock(&self.inner).overwritten
    }
}

impl FramePublisher {
    /// Offer `frame`, replacing any frame still waiting.
    pub fn publish(&self, frame: Frame) {
        let mut slot = lock(&self.inner);
        if slot.frame.replace(frame).is_some() {
            slot.overwritten += 1;
        }
    }

    /// Mark the stream as finished. A frame already waiting is still delivered.
    pub fn end(&self) {
        lock(&self.inner).ended = true;
    }
}

impl FrameSource for LatestFrameSlot {
    fn latest_frame(&mut self) -> Option<Frame> {
        lock(&self.inner).frame.take()
    }

    fn is_active(&self) -> bool {
        let slot = lock(&self.inner);
        !slot.ended || slot.frame.is_some()
    }
}

fn lock(m: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
#[path = "../../tests/unit/session/source.rs"]
mod tests;
