use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;

/// Host primitive that invokes the frame callback before the next display refresh.
///
/// The host is responsible for calling back into the scheduler once a
/// requested frame fires; a returned handle cancels that request.
pub trait FrameRequester {
    type Handle;

    fn request_frame(&mut self) -> Result<Self::Handle>;
    fn cancel_frame(&mut self, handle: Self::Handle);
}

/// Identifier of a pending [`ManualFrames`] request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(u64);

impl FrameId {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
struct ManualFramesState {
    next_id: u64,
    pending: Vec<FrameId>,
    requested: u64,
    cancelled: u64,
}

/// Frame requester driven by hand: requests are queued until a driver fires them.
///
/// Used by the headless binary and by tests. Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct ManualFrames {
    state: Arc<RwLock<ManualFramesState>>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests that have neither fired nor been cancelled.
    pub fn pending(&self) -> usize {
        self.state.read().pending.len()
    }

    pub fn is_pending(&self) -> bool {
        self.pending() > 0
    }

    /// Removes the oldest pending request, returning whether there was one to fire.
    pub fn fire(&self) -> bool {
        let mut state = self.state.write();
        if state.pending.is_empty() {
            return false;
        }
        state.pending.remove(0);
        true
    }

    pub fn requests(&self) -> u64 {
        self.state.read().requested
    }

    pub fn cancellations(&self) -> u64 {
        self.state.read().cancelled
    }
}

impl FrameRequester for ManualFrames {
    type Handle = FrameId;

    fn request_frame(&mut self) -> Result<FrameId> {
        let mut state = self.state.write();
        state.next_id += 1;
        state.requested += 1;
        let id = FrameId(state.next_id);
        state.pending.push(id);
        Ok(id)
    }

    fn cancel_frame(&mut self, handle: FrameId) {
        let mut state = self.state.write();
        let before = state.pending.len();
        state.pending.retain(|id| *id != handle);
        if state.pending.len() != before {
            state.cancelled += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_queue_until_fired() {
        let mut frames = ManualFrames::new();
        let observer = frames.clone();
        frames.request_frame().unwrap();
        assert!(observer.is_pending());
        assert!(observer.fire());
        assert!(!observer.fire());
        assert_eq!(observer.requests(), 1);
    }

    #[test]
    fn cancel_removes_only_matching_request() {
        let mut frames = ManualFrames::new();
        let first = frames.request_frame().unwrap();
        let second = frames.request_frame().unwrap();
        assert!(first.get() < second.get());
        frames.cancel_frame(first);
        frames.cancel_frame(first);
        assert_eq!(frames.pending(), 1);
        assert_eq!(frames.cancellations(), 1);
    }
}
