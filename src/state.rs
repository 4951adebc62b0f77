//! Latest-frame hand-off slot.
//!
//! Single writer (the capture supervisor), any number of readers (HTTP
//! handlers). The slot holds an `Arc<FrameResult>` behind an `RwLock`,
//! so publishing is one pointer swap and readers can never observe a
//! half-written result: they either see the previous `FrameResult` in
//! its entirety or the new one.

use std::sync::{Arc, RwLock};

use crate::frame::FrameResult;

#[derive(Default)]
pub struct LatestFrameState {
    slot: RwLock<Option<Arc<FrameResult>>>,
}

impl LatestFrameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the visible result. The previous one stays alive as
    /// long as some reader still holds its `Arc`.
    pub fn publish(&self, result: FrameResult) {
        let mut slot = match self.slot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(Arc::new(result));
    }

    /// Most recently published result, or `None` before the first
    /// publish.
    pub fn read(&self) -> Option<Arc<FrameResult>> {
        let slot = match self.slot.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    fn result(people: u32, intruders: u32) -> FrameResult {
        let frame = Frame::new(vec![0u8; 12], 2, 2).unwrap();
        FrameResult::new(frame, people, intruders)
    }

    #[test]
    fn empty_until_first_publish() {
        let state = LatestFrameState::new();
        assert!(state.read().is_none());
    }

    #[test]
    fn read_returns_last_published_result() {
        let state = LatestFrameState::new();
        state.publish(result(2, 1));

        let seen = state.read().expect("published result");
        assert_eq!(seen.people_count, 2);
        assert_eq!(seen.intruder_count, 1);
        assert!(seen.alert);

        // Repeated reads observe the same result until the next publish.
        let again = state.read().expect("published result");
        assert!(Arc::ptr_eq(&seen, &again));

        state.publish(result(1, 0));
        let replaced = state.read().expect("published result");
        assert_eq!(replaced.people_count, 1);
        assert!(!replaced.alert);
    }

    #[test]
    fn old_readers_keep_their_snapshot_across_publishes() {
        let state = LatestFrameState::new();
        state.publish(result(5, 5));
        let held = state.read().expect("published result");
        state.publish(result(0, 0));
        assert_eq!(held.people_count, 5);
        assert!(held.alert);
    }
}
