//! Generational handle registry.
//!
//! Callbacks driven by the host engine carry only a small integer, not a
//! pointer, so they need a safe way to reach a live session object. The
//! registry is a slab of slots tagged with a generation counter: a handle
//! packs its slot index and the generation it was issued under, and any
//! mismatch (unregistered object, recycled slot, garbage input) resolves to
//! `None` rather than a dangling reference. Misses are silent because they
//! are expected during teardown races.
//!
//! `resolve` is the hot path, called from real-time callback contexts: a
//! read lock, an index, a generation compare and an `Arc` clone. It never
//! allocates.

use parking_lot::RwLock;
use std::sync::Arc;

/// Opaque handle to a registered object: slot index in the low 16 bits,
/// generation in the high 16 bits. The zero value is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u32);

impl Handle {
    /// The null handle. Resolving it always yields `None`.
    pub const NONE: Handle = Handle(0);

    fn new(index: usize, generation: u16) -> Self {
        Handle(((generation as u32) << 16) | index as u32)
    }

    fn index(self) -> usize {
        (self.0 & 0xFFFF) as usize
    }

    fn generation(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Raw integer form, for crossing the plugin boundary.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Reconstruct a handle from its raw form. Garbage input is harmless:
    /// it resolves to `None` like any stale handle.
    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        Handle(raw)
    }
}

struct Slot<T> {
    generation: u16,
    value: Option<Arc<T>>,
}

/// Thread-safe mapping between integer handles and live shared objects.
///
/// The registry holds non-owning-in-spirit references: callers keep their own
/// `Arc` and must unregister before dropping an object so that late-arriving
/// callbacks resolve to `None` instead of a freed instance.
pub struct ObjectRegistry<T> {
    slots: RwLock<Vec<Slot<T>>>,
}

/// Slots are indexed by 16 bits.
const MAX_SLOTS: usize = u16::MAX as usize + 1;

impl<T> ObjectRegistry<T> {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(Vec::new()),
        }
    }

    /// Register an object and return its handle.
    ///
    /// Returns [`Handle::NONE`] in the degenerate case of 65536 live
    /// registrations, which no real session population reaches.
    pub fn register(&self, object: Arc<T>) -> Handle {
        let mut slots = self.slots.write();
        if let Some(index) = slots.iter().position(|s| s.value.is_none()) {
            let slot = &mut slots[index];
            slot.value = Some(object);
            return Handle::new(index, slot.generation);
        }
        if slots.len() >= MAX_SLOTS {
            return Handle::NONE;
        }
        let index = slots.len();
        // Generation starts at 1 so no valid handle is ever zero.
        slots.push(Slot {
            generation: 1,
            value: Some(object),
        });
        Handle::new(index, 1)
    }

    /// Remove the object behind `handle`, returning it if it was still
    /// registered. The slot's generation is bumped so stale handles miss.
    pub fn unregister(&self, handle: Handle) -> Option<Arc<T>> {
        let mut slots = self.slots.write();
        let slot = slots.get_mut(handle.index())?;
        if slot.generation != handle.generation() || slot.value.is_none() {
            return None;
        }
        slot.generation = match slot.generation.wrapping_add(1) {
            0 => 1,
            g => g,
        };
        slot.value.take()
    }

    /// Remove an object by identity, returning the handle it held.
    pub fn unregister_object(&self, object: &Arc<T>) -> Option<Handle> {
        let mut slots = self.slots.write();
        for (index, slot) in slots.iter_mut().enumerate() {
            if let Some(value) = &slot.value {
                if Arc::ptr_eq(value, object) {
                    let handle = Handle::new(index, slot.generation);
                    slot.generation = match slot.generation.wrapping_add(1) {
                        0 => 1,
                        g => g,
                    };
                    slot.value = None;
                    return Some(handle);
                }
            }
        }
        None
    }

    /// Resolve a handle to its object. Unknown or stale handles yield `None`.
    pub fn resolve(&self, handle: Handle) -> Option<Arc<T>> {
        let slots = self.slots.read();
        let slot = slots.get(handle.index())?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.value.clone()
    }

    /// Reverse lookup: the handle currently mapped to `object`.
    pub fn handle_of(&self, object: &Arc<T>) -> Option<Handle> {
        let slots = self.slots.read();
        slots.iter().enumerate().find_map(|(index, slot)| {
            slot.value
                .as_ref()
                .filter(|value| Arc::ptr_eq(value, object))
                .map(|_| Handle::new(index, slot.generation))
        })
    }

    /// Remove every registration, returning the objects. Used for explicit
    /// teardown; all outstanding handles become stale.
    pub fn drain(&self) -> Vec<Arc<T>> {
        let mut slots = self.slots.write();
        let mut drained = Vec::new();
        for slot in slots.iter_mut() {
            if let Some(value) = slot.value.take() {
                slot.generation = match slot.generation.wrapping_add(1) {
                    0 => 1,
                    g => g,
                };
                drained.push(value);
            }
        }
        drained
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.slots.read().iter().filter(|s| s.value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for ObjectRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
