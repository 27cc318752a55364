//! Browser host primitives.
//!
//! [`WebIntervalTimer`] wraps `window.setInterval`, [`WebFrameSync`] wraps
//! `window.requestAnimationFrame`. [`scheduler`] hands out the page-wide
//! scheduler built on both, created on first use.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use super::{FrameCallback, FrameSync, IntervalTimer, TickCallback, TimerHandle};
use crate::Scheduler;

struct Interval {
    id: i32,
    /// Must outlive the JS interval that calls it.
    _closure: Closure<dyn FnMut()>,
}

/// Repeating timers backed by `setInterval`.
#[derive(Default)]
pub struct WebIntervalTimer {
    intervals: RefCell<HashMap<TimerHandle, Interval>>,
    next_handle: Cell<u64>,
}

impl WebIntervalTimer {
    /// Create a timer source with no running intervals.
    pub fn new() -> Self {
        Self::default()
    }
}

impl IntervalTimer for WebIntervalTimer {
    fn start(&self, interval_ms: u32, on_fire: TickCallback) -> TimerHandle {
        self.next_handle.set(self.next_handle.get() + 1);
        let handle = TimerHandle(self.next_handle.get());

        let closure = Closure::wrap(on_fire);
        let timeout = i32::try_from(interval_ms).unwrap_or(i32::MAX);
        let started = web_sys::window().ok_or(()).and_then(|window| {
            window
                .set_interval_with_callback_and_timeout_and_arguments_0(
                    closure.as_ref().unchecked_ref(),
                    timeout,
                )
                .map_err(|_| ())
        });

        match started {
            Ok(id) => {
                self.intervals.borrow_mut().insert(
                    handle,
                    Interval {
                        id,
                        _closure: closure,
                    },
                );
            }
            Err(()) => log::error!("setInterval failed for {interval_ms}ms; group will not tick"),
        }
        handle
    }

    fn stop(&self, handle: TimerHandle) {
        let removed = self.intervals.borrow_mut().remove(&handle);
        if let Some(interval) = removed {
            if let Some(window) = web_sys::window() {
                window.clear_interval_with_handle(interval.id);
            }
        }
    }
}

impl Drop for WebIntervalTimer {
    fn drop(&mut self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        for (_, interval) in self.intervals.get_mut().drain() {
            window.clear_interval_with_handle(interval.id);
        }
    }
}

/// Display-refresh callbacks backed by `requestAnimationFrame`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebFrameSync;

impl FrameSync for WebFrameSync {
    fn request_frame(&self, on_frame: FrameCallback) -> bool {
        // Freed by wasm-bindgen after its single invocation.
        let callback = Closure::once_into_js(move || on_frame());
        let requested = web_sys::window()
            .map(|window| window.request_animation_frame(callback.unchecked_ref()).is_ok())
            .unwrap_or(false);
        if !requested {
            log::error!("requestAnimationFrame unavailable; frame dropped");
        }
        requested
    }
}

thread_local! {
    static SCHEDULER: Scheduler = Scheduler::new(WebIntervalTimer::new(), WebFrameSync);
}

/// The page-wide scheduler, shared by every component on this thread.
///
/// ```rust,ignore
/// use animatable_core::{platform::web, AnimationOptions, FrameStepper};
///
/// let handle = web::scheduler().create(
///     AnimationOptions::enabled(120),
///     FrameStepper::new(text.len(), move |i| reveal(i)),
/// )?;
/// ```
pub fn scheduler() -> Scheduler {
    SCHEDULER.with(Scheduler::clone)
}
