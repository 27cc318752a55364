//! Construction-time configuration for animated instances.

use crate::{Result, SchedulerError};

/// Default tick interval in milliseconds.
pub const DEFAULT_SPEED_MS: u32 = 500;

/// Options consumed by [`Scheduler::create`](crate::Scheduler::create).
///
/// Missing fields fall back to their defaults, so a partial or empty
/// document is accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnimationOptions {
    /// Subscribe to the shared timer right after construction.
    pub enabled: bool,
    /// Milliseconds between ticks; also the speed group key.
    pub speed_ms: u32,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            speed_ms: DEFAULT_SPEED_MS,
        }
    }
}

impl AnimationOptions {
    /// Options for an instance that starts animating immediately.
    pub fn enabled(speed_ms: u32) -> Self {
        Self {
            enabled: true,
            speed_ms,
        }
    }

    /// Options with a tick interval derived from a frame rate.
    ///
    /// ```rust
    /// use animatable_core::AnimationOptions;
    ///
    /// assert_eq!(AnimationOptions::from_fps(24).speed_ms, 41);
    /// assert_eq!(AnimationOptions::from_fps(0).speed_ms, 1000);
    /// ```
    pub fn from_fps(fps: u32) -> Self {
        Self {
            speed_ms: (1000.0 / fps.max(1) as f64).max(1.0) as u32,
            ..Self::default()
        }
    }

    /// Parse options from a TOML string.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Reject a zero tick interval.
    pub fn validate(&self) -> Result<()> {
        validate_speed(self.speed_ms)
    }
}

pub(crate) fn validate_speed(speed_ms: u32) -> Result<()> {
    if speed_ms == 0 {
        return Err(SchedulerError::InvalidSpeed { speed_ms });
    }
    Ok(())
}
