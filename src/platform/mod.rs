//! Host primitives the scheduler is built on.
//!
//! Two independent pieces: a coarse repeating timer ([`IntervalTimer`]) that
//! decides *how often* a speed group ticks, and a display-refresh hook
//! ([`FrameSync`]) that decides *when* the resulting `animate()` calls run.
//!
//! Implementations must never invoke a callback synchronously from inside
//! `start`, `stop` or `request_frame`; callbacks run later, from the host's
//! event loop (or from [`ManualClock::advance`] / [`ManualFramePump::pump`]).

mod manual;
#[cfg(feature = "web")]
pub mod web;

pub use manual::{ManualClock, ManualFramePump};

/// Identifies a running repeating timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Callback run on each timer fire.
pub type TickCallback = Box<dyn FnMut()>;

/// Callback run once on the next display refresh.
pub type FrameCallback = Box<dyn FnOnce()>;

/// A source of repeating timers.
pub trait IntervalTimer {
    /// Start a timer that calls `on_fire` every `interval_ms` milliseconds.
    fn start(&self, interval_ms: u32, on_fire: TickCallback) -> TimerHandle;

    /// Stop a timer. Unknown or already stopped handles are ignored.
    fn stop(&self, handle: TimerHandle);
}

/// A source of display-refresh callbacks.
pub trait FrameSync {
    /// Run `on_frame` once, on the next display refresh.
    ///
    /// Returns `false` if the host could not schedule it; `on_frame` is then
    /// dropped without running and the caller may ask again later.
    fn request_frame(&self, on_frame: FrameCallback) -> bool;
}
