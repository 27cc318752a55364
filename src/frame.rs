//! Frame-sync dispatch queue.
//!
//! Timer fires do not call `animate()` directly. They park their speed group
//! here, and the whole queue is drained on the next display refresh so every
//! group that ticked updates in the same paint frame.

use crate::platform::TimerHandle;

/// Speed groups waiting for the next display refresh.
///
/// Each entry remembers the timer that ticked. A group torn down and
/// re-created before the frame owns a different timer, and the entry no
/// longer applies to it.
#[derive(Debug, Default)]
pub(crate) struct FrameQueue {
    pending: Vec<(u32, TimerHandle)>,
    /// A refresh callback has been requested and not yet delivered.
    requested: bool,
    /// Incremented on every drain; identifies the frame being dispatched.
    serial: u64,
}

impl FrameQueue {
    /// Queue a tick of `timer` for the group at `speed_ms`. Returns `false`
    /// if the group was already waiting, in which case the tick is coalesced
    /// into the pending one.
    pub fn enqueue(&mut self, speed_ms: u32, timer: TimerHandle) -> bool {
        if self.pending.iter().any(|&(s, _)| s == speed_ms) {
            return false;
        }
        self.pending.push((speed_ms, timer));
        true
    }

    /// Whether a refresh callback must be requested now.
    ///
    /// Returns `true` at most once until the next [`drain`](Self::drain) or
    /// [`cancel_request`](Self::cancel_request).
    pub fn take_request(&mut self) -> bool {
        if self.requested || self.pending.is_empty() {
            return false;
        }
        self.requested = true;
        true
    }

    /// The host refused the refresh request; the next tick asks again.
    pub fn cancel_request(&mut self) {
        self.requested = false;
    }

    /// Take every waiting group, along with the serial of the new frame.
    pub fn drain(&mut self) -> (u64, Vec<(u32, TimerHandle)>) {
        self.requested = false;
        self.serial += 1;
        (self.serial, std::mem::take(&mut self.pending))
    }

    /// Forget a group whose timer was torn down.
    pub fn discard(&mut self, speed_ms: u32) {
        self.pending.retain(|&(s, _)| s != speed_ms);
    }

    /// Number of groups waiting for the next refresh.
    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
