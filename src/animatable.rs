//! The per-frame callback contract.

/// Outcome of a single [`Animatable::animate`] call.
pub type AnimateResult = Result<(), Box<dyn std::error::Error>>;

/// A visual effect driven by the scheduler.
///
/// `animate` is called at most once per display frame for every enabled
/// instance whose speed group ticked. Calls carry no elapsed time and no
/// ordering relative to sibling instances is guaranteed.
///
/// Returning an error (or panicking) only skips this instance for the
/// current frame; it stays subscribed.
///
/// Closures implement the trait directly:
///
/// ```rust
/// use animatable_core::{Animatable, AnimateResult};
///
/// let mut frames = 0;
/// let mut effect = || -> AnimateResult {
///     frames += 1;
///     Ok(())
/// };
/// effect.animate().unwrap();
/// ```
pub trait Animatable {
    fn animate(&mut self) -> AnimateResult;
}

impl<F> Animatable for F
where
    F: FnMut() -> AnimateResult,
{
    fn animate(&mut self) -> AnimateResult {
        self()
    }
}
