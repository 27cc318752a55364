//! Registry of every live animated instance.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::Animatable;

/// Opaque identity of a registered instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub(crate) u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) type SharedAnimatable = Rc<RefCell<dyn Animatable>>;

/// Per-instance state tracked by the scheduler.
pub(crate) struct Entry {
    pub speed_ms: u32,
    pub enabled: bool,
    /// Speed group the instance currently belongs to, if any.
    pub subscribed: Option<u32>,
    /// Serial of the last frame that invoked this instance.
    pub last_frame: u64,
    pub animatable: SharedAnimatable,
    /// Same allocation as `animatable`, kept for typed access.
    pub concrete: Rc<dyn Any>,
}

impl Entry {
    pub fn new<A>(speed_ms: u32, animatable: A) -> Self
    where
        A: Animatable + 'static,
    {
        let cell = Rc::new(RefCell::new(animatable));
        Self {
            speed_ms,
            enabled: false,
            subscribed: None,
            last_frame: 0,
            animatable: cell.clone(),
            concrete: cell,
        }
    }
}

/// Set of registered instances, keyed by identity.
///
/// Disabled instances stay here; membership in a speed group is tracked
/// separately by the timer pool.
#[derive(Default)]
pub(crate) struct Registry {
    entries: HashMap<InstanceId, Entry>,
    next_id: u64,
}

impl Registry {
    /// Allocate a fresh identity. Ids are never reused.
    pub fn next_id(&mut self) -> InstanceId {
        self.next_id += 1;
        InstanceId(self.next_id)
    }

    /// Add an instance. Returns `false` and leaves the registry unchanged if
    /// the id is already present.
    pub fn register(&mut self, id: InstanceId, entry: Entry) -> bool {
        if self.entries.contains_key(&id) {
            return false;
        }
        self.entries.insert(id, entry);
        true
    }

    /// Remove an instance, handing back its entry.
    ///
    /// Callers drop the entry after releasing any outer borrow: dropping the
    /// animatable may run arbitrary user code.
    pub fn unregister(&mut self, id: InstanceId) -> Option<Entry> {
        self.entries.remove(&id)
    }

    #[inline]
    pub fn contains(&self, id: InstanceId) -> bool {
        self.entries.contains_key(&id)
    }

    #[inline]
    pub fn get(&self, id: InstanceId) -> Option<&Entry> {
        self.entries.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut Entry> {
        self.entries.get_mut(&id)
    }

    /// Snapshot of every registered id, sorted for stable diagnostics.
    pub fn all(&self) -> Vec<InstanceId> {
        let mut ids: Vec<_> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
