//! Lifecycle of a single animated instance.

use std::rc::Weak;

use crate::scheduler::{Inner, Scheduler};
use crate::{Animatable, InstanceId, Result, SchedulerError};

/// Owning handle to an instance created by [`Scheduler::create`].
///
/// The instance moves between *disabled* and *enabled* (subscribed to the
/// shared timer of its speed) until it is destroyed, either explicitly with
/// [`destroy`](Self::destroy) or by dropping the handle. Every call on a
/// destroyed handle fails with [`SchedulerError::InvalidState`].
///
/// The handle holds the scheduler weakly, so an effect may keep its own
/// handle (for example to disable itself) without creating a cycle.
#[derive(Debug)]
pub struct AnimationHandle {
    id: InstanceId,
    scheduler: Weak<Inner>,
    destroyed: bool,
}

impl AnimationHandle {
    pub(crate) fn new(id: InstanceId, scheduler: Weak<Inner>) -> Self {
        Self {
            id,
            scheduler,
            destroyed: false,
        }
    }

    /// The instance this handle controls.
    #[inline]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Start receiving `animate()` calls. No-op if already enabled.
    pub fn enable_animation(&self) -> Result<()> {
        self.scheduler()?.subscribe(self.id)
    }

    /// Stop receiving `animate()` calls. No-op if already disabled.
    ///
    /// The instance stays registered and can be enabled again.
    pub fn disable_animation(&self) -> Result<()> {
        self.scheduler()?.unsubscribe(self.id)
    }

    /// Change the tick interval.
    ///
    /// While enabled the instance moves to the new speed group at once;
    /// while disabled the new speed applies on the next enable.
    pub fn set_speed(&self, speed_ms: u32) -> Result<()> {
        self.scheduler()?.reschedule(self.id, speed_ms)
    }

    /// Current tick interval in milliseconds.
    pub fn speed(&self) -> Result<u32> {
        self.scheduler()?.speed_of(self.id)
    }

    /// Whether the instance currently receives `animate()` calls.
    pub fn is_enabled(&self) -> Result<bool> {
        self.scheduler()?.is_enabled(self.id)
    }

    /// Access the effect behind this handle as its concrete type.
    ///
    /// ```rust
    /// use animatable_core::{AnimationOptions, FrameStepper, Scheduler};
    ///
    /// let (scheduler, _clock, _frames) = Scheduler::manual();
    /// let handle = scheduler
    ///     .create(AnimationOptions::enabled(80), FrameStepper::new(12, |_| Ok(())))
    ///     .unwrap();
    ///
    /// handle.with_animatable(|s: &mut FrameStepper| s.pause()).unwrap();
    /// let playing = handle.with_animatable(|s: &mut FrameStepper| s.is_playing());
    /// assert_eq!(playing, Ok(Some(false)));
    /// ```
    pub fn with_animatable<A, R, F>(&self, f: F) -> Result<Option<R>>
    where
        A: Animatable + 'static,
        F: FnOnce(&mut A) -> R,
    {
        self.scheduler()?.with_animatable(self.id, f)
    }

    /// Whether [`destroy`](Self::destroy) already ran.
    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Unsubscribe and unregister the instance.
    ///
    /// Fails with [`SchedulerError::InvalidState`] when already destroyed.
    pub fn destroy(&mut self) -> Result<()> {
        let scheduler = self.scheduler()?;
        self.destroyed = true;
        scheduler.unregister(self.id);
        Ok(())
    }

    fn scheduler(&self) -> Result<Scheduler> {
        if self.destroyed {
            return Err(SchedulerError::InvalidState { id: self.id });
        }
        self.scheduler
            .upgrade()
            .map(Scheduler::from_inner)
            .ok_or(SchedulerError::InvalidState { id: self.id })
    }
}

impl Drop for AnimationHandle {
    fn drop(&mut self) {
        if !self.destroyed {
            // Nothing to clean up once the scheduler itself is gone.
            let _ = self.destroy();
        }
    }
}
