//! Handle registry
//!
//! C callers hold opaque pointers that are never dereferenced. Each one packs
//! a slot index (low half of the word, offset by one so it is never null) and
//! the slot's generation (high half). Freeing a handle bumps the generation,
//! so stale and double-freed handles are rejected instead of reaching freed
//! memory.

use parking_lot::Mutex;
use prefkit_store::{Error, Preferences, Result};
use std::ffi::c_void;
use std::sync::Arc;

const INDEX_BITS: u32 = usize::BITS / 2;
const INDEX_MASK: usize = (1 << INDEX_BITS) - 1;
const GENERATION_MASK: usize = INDEX_MASK;

struct Slot<T> {
    generation: usize,
    value: Option<Arc<Mutex<T>>>,
}

/// Generation-checked slot table
pub struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
}

impl<T> HandleTable<T> {
    /// Empty table
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    fn encode(index: usize, generation: usize) -> usize {
        ((generation & GENERATION_MASK) << INDEX_BITS) | (index + 1)
    }

    fn decode(raw: usize) -> Option<(usize, usize)> {
        let index = (raw & INDEX_MASK).checked_sub(1)?;
        Some((index, raw >> INDEX_BITS))
    }

    /// Store `value` and return its non-zero handle.
    pub fn insert(&mut self, value: T) -> Result<usize> {
        let value = Some(Arc::new(Mutex::new(value)));

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.value = value;
            return Ok(Self::encode(index, slot.generation));
        }

        let index = self.slots.len();
        if index >= INDEX_MASK {
            return Err(Error::InvalidArgument("too many open preferences".to_string()));
        }
        self.slots.try_reserve(1)?;
        self.slots.push(Slot {
            generation: 0,
            value,
        });
        Ok(Self::encode(index, 0))
    }

    fn slot(&self, raw: usize) -> Option<(usize, &Slot<T>)> {
        let (index, generation) = Self::decode(raw)?;
        let slot = self.slots.get(index)?;
        (slot.value.is_some() && slot.generation & GENERATION_MASK == generation)
            .then_some((index, slot))
    }

    /// Shared reference to a live entry
    pub fn get(&self, raw: usize) -> Option<Arc<Mutex<T>>> {
        self.slot(raw).and_then(|(_, slot)| slot.value.clone())
    }

    /// Invalidate `raw` and hand back its entry.
    pub fn remove(&mut self, raw: usize) -> Option<Arc<Mutex<T>>> {
        let (index, _) = self.slot(raw)?;
        let slot = &mut self.slots[index];
        slot.generation = slot.generation.wrapping_add(1);
        let value = slot.value.take();
        self.free.push(index);
        value
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// True when no entries are live
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static::lazy_static! {
    /// Open preferences, keyed by handle
    static ref PREFERENCES: Mutex<HandleTable<Preferences>> = Mutex::new(HandleTable::new());
}

fn stale() -> Error {
    Error::InvalidArgument("preferences handle is null or no longer valid".to_string())
}

/// Register an opened store and return its opaque handle.
pub(crate) fn register(preferences: Preferences) -> Result<*mut c_void> {
    let raw = PREFERENCES.lock().insert(preferences)?;
    Ok(raw as *mut c_void)
}

/// Invalidate a handle. The store is dropped once no call is using it.
pub(crate) fn release(handle: *const c_void) -> Result<()> {
    let removed = PREFERENCES.lock().remove(handle as usize).ok_or_else(stale)?;
    drop(removed);
    Ok(())
}

/// Run `f` with exclusive access to the store behind `handle`.
pub(crate) fn with_preferences<R>(
    handle: *const c_void,
    f: impl FnOnce(&mut Preferences) -> Result<R>,
) -> Result<R> {
    let entry = PREFERENCES.lock().get(handle as usize).ok_or_else(stale)?;
    let mut preferences = entry.lock();
    f(&mut preferences)
}
