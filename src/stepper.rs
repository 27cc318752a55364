//! Step sequencing on top of scheduler ticks.

use crate::{Animatable, AnimateResult};

/// What to do after the last step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoopMode {
    /// Stop on the last step
    Once,
    /// Wrap around to step 0
    #[default]
    Loop,
}

/// Playback state of a [`FrameStepper`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepperState {
    /// Ticks are ignored
    Paused,
    /// Each tick runs one step
    Playing,
    /// Last step reached in [`LoopMode::Once`]
    Finished,
}

type StepFn = Box<dyn FnMut(usize) -> AnimateResult>;

/// An [`Animatable`] that turns ticks into a step index.
///
/// Each `animate()` call while playing runs `on_step` with the current index
/// and then advances. This is the shape of most tick-driven effects (reveal
/// one more character, fill one more cell, show the next sprite) without the
/// scheduler knowing about any of them.
///
/// ## Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use animatable_core::{Animatable, FrameStepper, LoopMode, StepperState};
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let log = seen.clone();
/// let mut stepper = FrameStepper::new(3, move |step| {
///     log.borrow_mut().push(step);
///     Ok(())
/// });
/// stepper.set_loop_mode(LoopMode::Once);
///
/// for _ in 0..5 {
///     stepper.animate().unwrap();
/// }
/// assert_eq!(*seen.borrow(), vec![0, 1, 2]);
/// assert_eq!(stepper.state(), StepperState::Finished);
/// ```
pub struct FrameStepper {
    current_step: usize,
    step_count: usize,
    state: StepperState,
    loop_mode: LoopMode,
    on_step: StepFn,
}

impl FrameStepper {
    /// Create a playing stepper over `step_count` steps.
    pub fn new<F>(step_count: usize, on_step: F) -> Self
    where
        F: FnMut(usize) -> AnimateResult + 'static,
    {
        Self {
            current_step: 0,
            step_count,
            state: StepperState::Playing,
            loop_mode: LoopMode::Loop,
            on_step: Box::new(on_step),
        }
    }

    /// Set the number of steps, clamping the current step into range.
    pub fn set_step_count(&mut self, count: usize) {
        self.step_count = count;
        if self.current_step >= count {
            self.current_step = count.saturating_sub(1);
        }
    }

    /// Get the total number of steps.
    #[inline]
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Set whether stepping wraps around or stops at the last step.
    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
        // Switching a finished stepper to Loop lets it resume.
        if mode == LoopMode::Loop && self.state == StepperState::Finished {
            self.state = StepperState::Paused;
        }
    }

    /// Get the loop mode.
    #[inline]
    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    /// Resume stepping. Has no effect once finished; use [`restart`](Self::restart).
    pub fn play(&mut self) {
        if self.state != StepperState::Finished {
            self.state = StepperState::Playing;
        }
    }

    /// Stop stepping until [`play`](Self::play) is called.
    pub fn pause(&mut self) {
        if self.state == StepperState::Playing {
            self.state = StepperState::Paused;
        }
    }

    /// Go back to step 0 and play.
    pub fn restart(&mut self) {
        self.current_step = 0;
        self.state = StepperState::Playing;
    }

    /// Get the playback state.
    #[inline]
    pub fn state(&self) -> StepperState {
        self.state
    }

    /// Whether ticks currently advance the stepper.
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state == StepperState::Playing
    }

    /// Index of the step the next tick will run.
    #[inline]
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Jump to a step, clamped to the last one.
    pub fn set_current_step(&mut self, step: usize) {
        self.current_step = step.min(self.step_count.saturating_sub(1));
    }

    /// Progress through the sequence in 0.0 - 1.0.
    pub fn position(&self) -> f64 {
        if self.step_count <= 1 {
            return 0.0;
        }
        self.current_step as f64 / (self.step_count - 1) as f64
    }

    fn advance(&mut self) {
        if self.current_step + 1 < self.step_count {
            self.current_step += 1;
            return;
        }
        match self.loop_mode {
            LoopMode::Loop => self.current_step = 0,
            LoopMode::Once => self.state = StepperState::Finished,
        }
    }
}

impl Animatable for FrameStepper {
    fn animate(&mut self) -> AnimateResult {
        if self.state != StepperState::Playing || self.step_count == 0 {
            return Ok(());
        }
        let step = self.current_step;
        // A failed step is retried on the next tick.
        (self.on_step)(step)?;
        self.advance();
        Ok(())
    }
}

impl std::fmt::Debug for FrameStepper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameStepper")
            .field("current_step", &self.current_step)
            .field("step_count", &self.step_count)
            .field("state", &self.state)
            .field("loop_mode", &self.loop_mode)
            .finish_non_exhaustive()
    }
}
