//! Host primitives driven by hand.
//!
//! Useful for headless hosts that own their loop and for deterministic tests:
//! time only moves on [`ManualClock::advance`], and frames only happen on
//! [`ManualFramePump::pump`].

use std::cell::RefCell;
use std::rc::Rc;

use super::{FrameCallback, FrameSync, IntervalTimer, TickCallback, TimerHandle};

struct ManualTimer {
    handle: TimerHandle,
    interval_ms: u64,
    next_due: u64,
    /// Taken out while the callback runs.
    callback: Option<TickCallback>,
}

#[derive(Default)]
struct ClockState {
    now: u64,
    next_handle: u64,
    timers: Vec<ManualTimer>,
}

/// A fake clock implementing [`IntervalTimer`].
///
/// Clones share the same clock, so one clone can be handed to a
/// [`Scheduler`](crate::Scheduler) while another drives time.
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use animatable_core::{IntervalTimer, ManualClock};
///
/// let clock = ManualClock::new();
/// let fired = Rc::new(Cell::new(0));
/// let counter = fired.clone();
/// clock.start(100, Box::new(move || counter.set(counter.get() + 1)));
///
/// clock.advance(250);
/// assert_eq!(fired.get(), 2);
/// ```
#[derive(Clone, Default)]
pub struct ManualClock {
    state: Rc<RefCell<ClockState>>,
}

impl ManualClock {
    /// Create a clock at time zero with no timers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in milliseconds since the clock was created.
    pub fn now(&self) -> u64 {
        self.state.borrow().now
    }

    /// Number of running timers.
    pub fn active_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Intervals of the running timers, in start order.
    pub fn intervals(&self) -> Vec<u32> {
        self.state
            .borrow()
            .timers
            .iter()
            .map(|t| t.interval_ms as u32)
            .collect()
    }

    /// Move time forward by `ms`, firing every timer that comes due.
    ///
    /// Fires happen in due-time order (start order on ties). Timers started
    /// or stopped by a callback take effect immediately. Returns the number
    /// of callbacks run.
    pub fn advance(&self, ms: u64) -> usize {
        let target = self.state.borrow().now + ms;
        let mut fired = 0;

        loop {
            let (handle, mut callback) = {
                let mut state = self.state.borrow_mut();
                let next = state
                    .timers
                    .iter_mut()
                    .filter(|t| t.callback.is_some() && t.next_due <= target)
                    .min_by_key(|t| t.next_due);
                let Some(timer) = next else { break };

                let due = timer.next_due;
                timer.next_due += timer.interval_ms;
                let handle = timer.handle;
                let callback = timer.callback.take();
                state.now = due;
                match callback {
                    Some(cb) => (handle, cb),
                    None => continue,
                }
            };

            callback();
            fired += 1;

            // Put the callback back unless the timer was stopped meanwhile.
            let mut state = self.state.borrow_mut();
            if let Some(timer) = state.timers.iter_mut().find(|t| t.handle == handle) {
                timer.callback = Some(callback);
            }
        }

        self.state.borrow_mut().now = target;
        fired
    }
}

impl IntervalTimer for ManualClock {
    fn start(&self, interval_ms: u32, on_fire: TickCallback) -> TimerHandle {
        let mut state = self.state.borrow_mut();
        state.next_handle += 1;
        let handle = TimerHandle(state.next_handle);
        let interval_ms = u64::from(interval_ms.max(1));
        let next_due = state.now + interval_ms;
        state.timers.push(ManualTimer {
            handle,
            interval_ms,
            next_due,
            callback: Some(on_fire),
        });
        handle
    }

    fn stop(&self, handle: TimerHandle) {
        // Drop the callback outside the borrow; it may own arbitrary state.
        let removed = {
            let mut state = self.state.borrow_mut();
            let index = state.timers.iter().position(|t| t.handle == handle);
            index.map(|i| state.timers.remove(i))
        };
        drop(removed);
    }
}

/// A display-refresh signal pumped by hand, implementing [`FrameSync`].
///
/// Callbacks requested while a pump is running belong to the next frame.
#[derive(Clone, Default)]
pub struct ManualFramePump {
    queue: Rc<RefCell<Vec<FrameCallback>>>,
}

impl ManualFramePump {
    /// Create a pump with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of callbacks waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Simulate one display refresh. Returns the number of callbacks run.
    pub fn pump(&self) -> usize {
        let callbacks = std::mem::take(&mut *self.queue.borrow_mut());
        let count = callbacks.len();
        for callback in callbacks {
            callback();
        }
        count
    }
}

impl FrameSync for ManualFramePump {
    fn request_frame(&self, on_frame: FrameCallback) -> bool {
        self.queue.borrow_mut().push(on_frame);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<u32>>, TickCallback) {
        let count = Rc::new(Cell::new(0));
        let inner = count.clone();
        let cb: TickCallback = Box::new(move || inner.set(inner.get() + 1));
        (count, cb)
    }

    #[test]
    fn test_timers_fire_on_interval() {
        let clock = ManualClock::new();
        let (count, cb) = counter();
        clock.start(500, cb);

        assert_eq!(clock.advance(499), 0);
        assert_eq!(count.get(), 0);
        assert_eq!(clock.advance(1), 1);
        assert_eq!(count.get(), 1);
        clock.advance(1000);
        assert_eq!(count.get(), 3);
        assert_eq!(clock.now(), 1500);
    }

    #[test]
    fn test_stopped_timer_never_fires() {
        let clock = ManualClock::new();
        let (count, cb) = counter();
        let handle = clock.start(100, cb);
        clock.advance(100);
        clock.stop(handle);
        clock.stop(handle);

        clock.advance(1000);
        assert_eq!(count.get(), 1);
        assert_eq!(clock.active_timers(), 0);
    }

    #[test]
    fn test_fires_in_due_order() {
        let clock = ManualClock::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for interval in [300u32, 200] {
            let order = order.clone();
            clock.start(interval, Box::new(move || order.borrow_mut().push(interval)));
        }

        clock.advance(600);
        assert_eq!(*order.borrow(), vec![200, 300, 200, 300, 200]);
    }

    #[test]
    fn test_callback_may_stop_its_own_timer() {
        let clock = ManualClock::new();
        let handle_slot = Rc::new(Cell::new(None));
        let count = Rc::new(Cell::new(0));

        let cb = {
            let clock = clock.clone();
            let handle_slot = handle_slot.clone();
            let count = count.clone();
            Box::new(move || {
                count.set(count.get() + 1);
                if let Some(handle) = handle_slot.get() {
                    clock.stop(handle);
                }
            })
        };
        handle_slot.set(Some(clock.start(10, cb)));

        clock.advance(100);
        assert_eq!(count.get(), 1);
        assert_eq!(clock.active_timers(), 0);
    }

    #[test]
    fn test_frames_requested_during_pump_wait() {
        let pump = ManualFramePump::new();
        let count = Rc::new(Cell::new(0));

        let requeue = {
            let pump = pump.clone();
            let count = count.clone();
            Box::new(move || {
                count.set(count.get() + 1);
                let count = count.clone();
                pump.request_frame(Box::new(move || count.set(count.get() + 1)));
            })
        };
        assert!(pump.request_frame(requeue));

        assert_eq!(pump.pump(), 1);
        assert_eq!(count.get(), 1);
        assert_eq!(pump.pending(), 1);
        assert_eq!(pump.pump(), 1);
        assert_eq!(count.get(), 2);
        assert_eq!(pump.pump(), 0);
    }
}
