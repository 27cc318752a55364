//! Shared timers, one per distinct speed.

use std::collections::{HashMap, HashSet};

use crate::options::validate_speed;
use crate::platform::TimerHandle;
use crate::{InstanceId, Result};

/// Instances ticking at the same speed, sharing one timer.
pub(crate) struct SpeedGroup {
    pub timer: TimerHandle,
    pub subscribers: HashSet<InstanceId>,
}

/// Mapping from speed to its speed group.
///
/// A group exists exactly as long as it has subscribers. The pool does not
/// talk to the host itself: `join` asks the caller to start a timer for a new
/// group, and `leave` hands back the timer of a group that just emptied.
#[derive(Default)]
pub(crate) struct TimerPool {
    groups: HashMap<u32, SpeedGroup>,
}

impl TimerPool {
    /// Add `id` to the group for `speed_ms`, creating the group (and its timer,
    /// through `start`) when it is the first subscriber.
    ///
    /// Returns `false` if `id` was already a subscriber.
    pub fn join<F>(&mut self, speed_ms: u32, id: InstanceId, start: F) -> Result<bool>
    where
        F: FnOnce() -> TimerHandle,
    {
        validate_speed(speed_ms)?;
        let group = self.groups.entry(speed_ms).or_insert_with(|| SpeedGroup {
            timer: start(),
            subscribers: HashSet::new(),
        });
        Ok(group.subscribers.insert(id))
    }

    /// Remove `id` from the group for `speed_ms`.
    ///
    /// When that empties the group, the group is discarded and its timer is
    /// returned so the caller can stop it.
    pub fn leave(&mut self, speed_ms: u32, id: InstanceId) -> Option<TimerHandle> {
        let group = self.groups.get_mut(&speed_ms)?;
        group.subscribers.remove(&id);
        if !group.subscribers.is_empty() {
            return None;
        }
        self.groups.remove(&speed_ms).map(|g| g.timer)
    }

    pub fn contains(&self, speed_ms: u32, id: InstanceId) -> bool {
        self.groups
            .get(&speed_ms)
            .map(|g| g.subscribers.contains(&id))
            .unwrap_or(false)
    }

    #[inline]
    pub fn has_group(&self, speed_ms: u32) -> bool {
        self.groups.contains_key(&speed_ms)
    }

    pub fn timer(&self, speed_ms: u32) -> Option<TimerHandle> {
        self.groups.get(&speed_ms).map(|g| g.timer)
    }

    /// Subscribers of a group, sorted. Empty for unknown speeds.
    pub fn subscribers(&self, speed_ms: u32) -> Vec<InstanceId> {
        let mut ids: Vec<_> = self
            .groups
            .get(&speed_ms)
            .map(|g| g.subscribers.iter().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    /// Speeds with a live group, ascending.
    pub fn speeds(&self) -> Vec<u32> {
        let mut speeds: Vec<_> = self.groups.keys().copied().collect();
        speeds.sort_unstable();
        speeds
    }

    #[inline]
    pub fn timer_count(&self) -> usize {
        self.groups.len()
    }
}
