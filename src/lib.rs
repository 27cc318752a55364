//! # animatable-core
//!
//! Scheduling core for visual components that animate on a timer.
//!
//! This crate provides platform-agnostic logic for:
//! - Registering animated instances and toggling them on and off
//! - Sharing one repeating timer between all instances of the same speed
//! - Deferring each tick's `animate()` calls to the next display refresh
//! - Isolating failing effects so siblings keep animating
//!
//! Rendering and concrete effects live outside: an effect is anything that
//! implements [`Animatable`].
//!
//! ## Features
//!
//! - `serde` - Enable serialization/deserialization for [`AnimationOptions`]
//! - `toml` - Load [`AnimationOptions`] from TOML
//! - `web` - Browser timers (`setInterval` / `requestAnimationFrame`) via WASM
//!
//! ## Example
//!
//! ```rust
//! use animatable_core::{AnimateResult, AnimationOptions, FrameStepper, Scheduler};
//!
//! // Headless host: time and frames are driven by hand.
//! let (scheduler, clock, frames) = Scheduler::manual();
//!
//! let typewriter = FrameStepper::new(5, |_step| Ok(()));
//! let handle = scheduler.create(AnimationOptions::enabled(100), typewriter).unwrap();
//! let _blink = scheduler
//!     .create(AnimationOptions::enabled(100), || -> AnimateResult { Ok(()) })
//!     .unwrap();
//!
//! // Both share a single 100ms timer.
//! assert_eq!(scheduler.timer_count(), 1);
//!
//! clock.advance(100);
//! frames.pump();
//!
//! handle.disable_animation().unwrap();
//! ```

mod animatable;
mod error;
mod frame;
mod instance;
mod options;
pub mod platform;
mod pool;
mod registry;
mod scheduler;
mod stepper;

pub use animatable::{Animatable, AnimateResult};
pub use error::{Result, SchedulerError};
pub use instance::AnimationHandle;
pub use options::{AnimationOptions, DEFAULT_SPEED_MS};
pub use platform::{FrameSync, IntervalTimer, ManualClock, ManualFramePump, TimerHandle};
pub use registry::InstanceId;
pub use scheduler::Scheduler;
pub use stepper::{FrameStepper, LoopMode, StepperState};

#[cfg(feature = "web")]
pub use platform::web::{WebFrameSync, WebIntervalTimer};
