//! The scheduling core: registry, timer pool and frame-sync fan-out.

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use crate::frame::FrameQueue;
use crate::options::validate_speed;
use crate::platform::{FrameSync, IntervalTimer, ManualClock, ManualFramePump, TickCallback, TimerHandle};
use crate::pool::TimerPool;
use crate::registry::{Entry, Registry, SharedAnimatable};
use crate::{Animatable, AnimationHandle, AnimationOptions, InstanceId, Result, SchedulerError};

type FailureHook = Rc<dyn Fn(&SchedulerError)>;

#[derive(Default)]
struct State {
    registry: Registry,
    pool: TimerPool,
    queue: FrameQueue,
}

pub(crate) struct Inner {
    state: RefCell<State>,
    timers: Box<dyn IntervalTimer>,
    frames: Box<dyn FrameSync>,
    failure_hook: RefCell<Option<FailureHook>>,
}

/// Multiplexes animated instances onto one shared timer per speed.
///
/// Each distinct `speed_ms` owns exactly one repeating timer for as long as
/// at least one enabled instance uses it. When that timer fires, the group is
/// queued for frame sync; on the next display refresh every enabled member
/// gets one `animate()` call.
///
/// `Scheduler` is a cheap handle; clones share the same state. All work
/// happens on one thread, and `animate()` implementations may call back into
/// the scheduler (for example to disable themselves).
///
/// ## Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use animatable_core::{AnimateResult, AnimationOptions, Scheduler};
///
/// let (scheduler, clock, frames) = Scheduler::manual();
/// let calls = Rc::new(Cell::new(0));
/// let counter = calls.clone();
///
/// let _handle = scheduler
///     .create(AnimationOptions::enabled(500), move || -> AnimateResult {
///         counter.set(counter.get() + 1);
///         Ok(())
///     })
///     .unwrap();
///
/// clock.advance(500);
/// frames.pump();
/// assert_eq!(calls.get(), 1);
/// ```
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<Inner>,
}

impl Scheduler {
    /// Create a scheduler on top of the given host primitives.
    pub fn new<T, F>(timers: T, frames: F) -> Self
    where
        T: IntervalTimer + 'static,
        F: FrameSync + 'static,
    {
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(State::default()),
                timers: Box::new(timers),
                frames: Box::new(frames),
                failure_hook: RefCell::new(None),
            }),
        }
    }

    /// Create a scheduler driven by a [`ManualClock`] and a [`ManualFramePump`].
    ///
    /// The returned clock and pump share state with the scheduler's copies.
    pub fn manual() -> (Self, ManualClock, ManualFramePump) {
        let clock = ManualClock::new();
        let frames = ManualFramePump::new();
        (Self::new(clock.clone(), frames.clone()), clock, frames)
    }

    pub(crate) fn from_inner(inner: Rc<Inner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<Inner> {
        Rc::downgrade(&self.inner)
    }

    /// Construct an animated instance.
    ///
    /// The instance is registered disabled, then enabled right away when
    /// `options.enabled` is set. Dropping the returned handle destroys it.
    pub fn create<A>(&self, options: AnimationOptions, animatable: A) -> Result<AnimationHandle>
    where
        A: Animatable + 'static,
    {
        let id = self.register(options.speed_ms, animatable)?;
        let handle = AnimationHandle::new(id, self.downgrade());
        if options.enabled {
            self.subscribe(id)?;
        }
        Ok(handle)
    }

    /// Register a disabled instance without a handle.
    ///
    /// The caller owns its removal through [`unregister`](Self::unregister).
    pub fn register<A>(&self, speed_ms: u32, animatable: A) -> Result<InstanceId>
    where
        A: Animatable + 'static,
    {
        validate_speed(speed_ms)?;

        let mut state = self.inner.state.borrow_mut();
        let id = state.registry.next_id();
        state.registry.register(id, Entry::new(speed_ms, animatable));
        log::trace!("registered instance {id} at {speed_ms}ms");
        Ok(id)
    }

    /// Remove an instance, unsubscribing it first.
    ///
    /// Returns `false` if it was not registered.
    pub fn unregister(&self, id: InstanceId) -> bool {
        let removed = {
            let mut state = self.inner.state.borrow_mut();
            self.leave_group(&mut state, id);
            state.registry.unregister(id)
        };
        // The animatable may own handles whose drop re-enters the scheduler.
        let found = removed.is_some();
        drop(removed);
        if found {
            log::trace!("unregistered instance {id}");
        }
        found
    }

    /// Enable an instance and add it to the group for its current speed.
    ///
    /// Starts the group's timer if this is its first subscriber. No-op when
    /// already subscribed.
    pub fn subscribe(&self, id: InstanceId) -> Result<()> {
        let mut state = self.inner.state.borrow_mut();
        let entry = state
            .registry
            .get(id)
            .ok_or(SchedulerError::InvalidState { id })?;
        if entry.subscribed.is_some() {
            return Ok(());
        }
        let speed_ms = entry.speed_ms;

        self.join_group(&mut state, id, speed_ms)?;
        if let Some(entry) = state.registry.get_mut(id) {
            entry.enabled = true;
            entry.subscribed = Some(speed_ms);
        }
        Ok(())
    }

    /// Disable an instance and remove it from its group.
    ///
    /// Stops the group's timer when it was the last subscriber. The instance
    /// stays registered. No-op when not subscribed.
    pub fn unsubscribe(&self, id: InstanceId) -> Result<()> {
        let mut state = self.inner.state.borrow_mut();
        if !state.registry.contains(id) {
            return Err(SchedulerError::InvalidState { id });
        }
        self.leave_group(&mut state, id);
        Ok(())
    }

    /// Change an instance's speed.
    ///
    /// A subscribed instance moves to the new group in one step: it gets no
    /// further calls from the old group, and at most one call per frame. A
    /// disabled instance only records the speed for its next subscription.
    pub fn reschedule(&self, id: InstanceId, new_speed_ms: u32) -> Result<()> {
        validate_speed(new_speed_ms)?;

        let mut state = self.inner.state.borrow_mut();
        let entry = state
            .registry
            .get_mut(id)
            .ok_or(SchedulerError::InvalidState { id })?;
        if entry.speed_ms == new_speed_ms {
            return Ok(());
        }
        let old_speed = entry.speed_ms;
        entry.speed_ms = new_speed_ms;
        if entry.subscribed.is_none() {
            return Ok(());
        }

        self.leave_group(&mut state, id);
        self.join_group(&mut state, id, new_speed_ms)?;
        if let Some(entry) = state.registry.get_mut(id) {
            entry.enabled = true;
            entry.subscribed = Some(new_speed_ms);
        }
        log::debug!("instance {id} moved from {old_speed}ms to {new_speed_ms}ms");
        Ok(())
    }

    /// Run `f` on the instance's animatable, if it is an `A`.
    ///
    /// Returns `Ok(None)` when the type does not match or when called from
    /// inside that instance's own `animate()`.
    pub fn with_animatable<A, R, F>(&self, id: InstanceId, f: F) -> Result<Option<R>>
    where
        A: Animatable + 'static,
        F: FnOnce(&mut A) -> R,
    {
        let concrete = {
            let state = self.inner.state.borrow();
            let entry = state
                .registry
                .get(id)
                .ok_or(SchedulerError::InvalidState { id })?;
            entry.concrete.clone()
        };
        let Ok(cell) = concrete.downcast::<RefCell<A>>() else {
            return Ok(None);
        };
        let result = match cell.try_borrow_mut() {
            Ok(mut target) => Some(f(&mut target)),
            Err(_) => None,
        };
        Ok(result)
    }

    /// Install a callback receiving every [`SchedulerError::CallbackFailure`].
    ///
    /// Failures are logged at `warn` level regardless.
    pub fn set_failure_hook<F>(&self, hook: F)
    where
        F: Fn(&SchedulerError) + 'static,
    {
        *self.inner.failure_hook.borrow_mut() = Some(Rc::new(hook));
    }

    /// Remove the failure hook.
    pub fn clear_failure_hook(&self) {
        self.inner.failure_hook.borrow_mut().take();
    }

    // --- Diagnostics ---

    /// Snapshot of every registered instance, enabled or not.
    pub fn instances(&self) -> Vec<InstanceId> {
        self.inner.state.borrow().registry.all()
    }

    /// Number of registered instances.
    pub fn instance_count(&self) -> usize {
        self.inner.state.borrow().registry.len()
    }

    /// Whether `id` is still registered.
    pub fn is_registered(&self, id: InstanceId) -> bool {
        self.inner.state.borrow().registry.contains(id)
    }

    /// Whether the instance is enabled.
    pub fn is_enabled(&self, id: InstanceId) -> Result<bool> {
        let state = self.inner.state.borrow();
        let entry = state
            .registry
            .get(id)
            .ok_or(SchedulerError::InvalidState { id })?;
        Ok(entry.enabled)
    }

    /// Whether the instance is a member of some speed group.
    pub fn is_subscribed(&self, id: InstanceId) -> bool {
        let state = self.inner.state.borrow();
        match state.registry.get(id).and_then(|e| e.subscribed) {
            Some(speed_ms) => state.pool.contains(speed_ms, id),
            None => false,
        }
    }

    /// The instance's configured speed in milliseconds.
    pub fn speed_of(&self, id: InstanceId) -> Result<u32> {
        let state = self.inner.state.borrow();
        state
            .registry
            .get(id)
            .map(|e| e.speed_ms)
            .ok_or(SchedulerError::InvalidState { id })
    }

    /// Number of live shared timers, one per speed group.
    pub fn timer_count(&self) -> usize {
        self.inner.state.borrow().pool.timer_count()
    }

    /// Speeds that currently own a timer, ascending.
    pub fn speeds(&self) -> Vec<u32> {
        self.inner.state.borrow().pool.speeds()
    }

    /// Members of the group for `speed_ms`, sorted. Empty if there is none.
    pub fn subscribers(&self, speed_ms: u32) -> Vec<InstanceId> {
        self.inner.state.borrow().pool.subscribers(speed_ms)
    }

    /// The shared timer for `speed_ms`, if the group exists.
    pub fn timer_handle(&self, speed_ms: u32) -> Option<TimerHandle> {
        self.inner.state.borrow().pool.timer(speed_ms)
    }

    /// Number of speed groups waiting for the next display refresh.
    pub fn pending_frames(&self) -> usize {
        self.inner.state.borrow().queue.len()
    }

    // --- Internals ---

    fn join_group(&self, state: &mut State, id: InstanceId, speed_ms: u32) -> Result<()> {
        let timers = &self.inner.timers;
        let mut started = false;
        state.pool.join(speed_ms, id, || {
            started = true;
            timers.start(speed_ms, self.tick_callback(speed_ms))
        })?;
        if started {
            log::debug!("started shared timer for {speed_ms}ms");
        }
        Ok(())
    }

    fn leave_group(&self, state: &mut State, id: InstanceId) {
        let Some(entry) = state.registry.get_mut(id) else {
            return;
        };
        entry.enabled = false;
        let Some(speed_ms) = entry.subscribed.take() else {
            return;
        };
        if let Some(timer) = state.pool.leave(speed_ms, id) {
            self.inner.timers.stop(timer);
            state.queue.discard(speed_ms);
            log::debug!("stopped shared timer for {speed_ms}ms");
        }
    }

    fn tick_callback(&self, speed_ms: u32) -> TickCallback {
        let weak = self.downgrade();
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                Scheduler::from_inner(inner).on_timer_fire(speed_ms);
            }
        })
    }

    fn on_timer_fire(&self, speed_ms: u32) {
        let mut state = self.inner.state.borrow_mut();
        let Some(timer) = state.pool.timer(speed_ms) else {
            // A fire the host had already queued before the timer was stopped.
            log::trace!("ignoring stale tick for {speed_ms}ms");
            return;
        };
        if !state.queue.enqueue(speed_ms, timer) {
            log::trace!("tick for {speed_ms}ms coalesced into pending frame");
        }
        if !state.queue.take_request() {
            return;
        }

        let weak = self.downgrade();
        let accepted = self.inner.frames.request_frame(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                Scheduler::from_inner(inner).on_frame();
            }
        }));
        if !accepted {
            // Nothing will drain the queue; let the next tick ask again.
            state.queue.cancel_request();
            log::warn!("display refresh request refused; retrying on next tick");
        }
    }

    fn on_frame(&self) {
        let (serial, groups) = self.inner.state.borrow_mut().queue.drain();
        log::trace!("frame {serial}: dispatching {} group(s)", groups.len());

        for (speed_ms, timer) in groups {
            let Some(members) = self.members_if_current(speed_ms, timer) else {
                log::trace!("frame {serial}: {speed_ms}ms group gone or replaced, skipping");
                continue;
            };
            for id in members {
                // Membership is re-checked per call: earlier callbacks may
                // have disabled, moved or destroyed this instance.
                let Some(animatable) = self.claim(id, speed_ms, serial) else {
                    continue;
                };
                if let Err(err) = invoke(&animatable, id, speed_ms) {
                    self.report(&err);
                }
            }
        }
    }

    /// Members of the group at `speed_ms`, unless the group was torn down
    /// and re-created since `timer` ticked.
    fn members_if_current(&self, speed_ms: u32, timer: TimerHandle) -> Option<Vec<InstanceId>> {
        let state = self.inner.state.borrow();
        if state.pool.timer(speed_ms) != Some(timer) {
            return None;
        }
        Some(state.pool.subscribers(speed_ms))
    }

    /// Mark `id` as animated in frame `serial` and hand out its callback, if
    /// it is still an enabled member of `speed_ms` and was not already
    /// animated in this frame.
    fn claim(&self, id: InstanceId, speed_ms: u32, serial: u64) -> Option<SharedAnimatable> {
        let mut state = self.inner.state.borrow_mut();
        let entry = state.registry.get_mut(id)?;
        if !entry.enabled || entry.subscribed != Some(speed_ms) || entry.last_frame == serial {
            return None;
        }
        entry.last_frame = serial;
        Some(entry.animatable.clone())
    }

    fn report(&self, err: &SchedulerError) {
        log::warn!("{err}");
        let hook = self.inner.failure_hook.borrow().clone();
        if let Some(hook) = hook {
            hook(err);
        }
    }
}

/// Run one `animate()` call, turning errors and panics into a failure.
fn invoke(animatable: &SharedAnimatable, id: InstanceId, speed_ms: u32) -> Result<()> {
    let failure = |message: String| SchedulerError::CallbackFailure {
        id,
        speed_ms,
        message,
    };

    let Ok(mut target) = animatable.try_borrow_mut() else {
        return Err(failure("animate() re-entered while already running".into()));
    };
    match panic::catch_unwind(AssertUnwindSafe(|| target.animate())) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(failure(err.to_string())),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panicked".to_string());
            Err(failure(format!("panic: {message}")))
        }
    }
}
