// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Handle table binding managed wrapper objects to engine instances.
//
// The managed side stores a `long`. Instead of a raw address it holds a slot
// index plus a generation counter, so a handle that outlived `destroy` is
// detected rather than dereferenced.

use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, PoisonError};

use mapview_core::engine::MapEngine;
use tracing::debug;

use crate::error::{BridgeError, Result};

/// Opaque handle to one live map. Never zero when encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapHandle {
    index: u32,
    generation: NonZeroU32,
}

impl MapHandle {
    /// Encode as the `long` stored by the managed wrapper.
    pub fn to_raw(self) -> i64 {
        ((u64::from(self.generation.get()) << 32) | u64::from(self.index)) as i64
    }

    /// Decode a managed `long`; `None` for zero and other impossible shapes.
    pub fn from_raw(raw: i64) -> Option<Self> {
        let bits = raw as u64;
        let generation = NonZeroU32::new((bits >> 32) as u32)?;
        Some(Self {
            index: bits as u32,
            generation,
        })
    }
}

/// Panic unless `raw` could name a map. A zero handle is a bug in the
/// managed wrapper, not a recoverable condition.
pub fn assert_handle(raw: i64, op: &str) {
    assert!(raw != 0, "{op} called with a null map handle");
}

struct Slot {
    generation: NonZeroU32,
    engine: Option<Arc<dyn MapEngine>>,
}

#[derive(Default)]
struct Slots {
    entries: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

/// Arena of engine instances keyed by [`MapHandle`].
#[derive(Default)]
pub struct HandleTable {
    slots: Mutex<Slots>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an engine and return its handle.
    pub fn insert(&self, engine: Arc<dyn MapEngine>) -> MapHandle {
        let mut slots = self.lock();
        slots.live += 1;
        let handle = match slots.free.pop() {
            Some(index) => {
                let slot = &mut slots.entries[index as usize];
                slot.engine = Some(engine);
                MapHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = slots.entries.len() as u32;
                slots.entries.push(Slot {
                    generation: NonZeroU32::MIN,
                    engine: Some(engine),
                });
                MapHandle {
                    index,
                    generation: NonZeroU32::MIN,
                }
            }
        };
        debug!(handle = handle.to_raw(), live = slots.live, "map instance stored");
        handle
    }

    /// Look up the engine for `raw` without removing it.
    pub fn get(&self, raw: i64) -> Result<Arc<dyn MapEngine>> {
        let handle = MapHandle::from_raw(raw).ok_or(BridgeError::StaleHandle(raw))?;
        let slots = self.lock();
        slots
            .entries
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.engine.clone())
            .ok_or(BridgeError::StaleHandle(raw))
    }

    /// Remove the engine for `raw`. The handle is dead afterwards; a second
    /// removal reports [`BridgeError::StaleHandle`].
    pub fn remove(&self, raw: i64) -> Result<Arc<dyn MapEngine>> {
        let handle = MapHandle::from_raw(raw).ok_or(BridgeError::StaleHandle(raw))?;
        let mut slots = self.lock();
        let slot = slots
            .entries
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .ok_or(BridgeError::StaleHandle(raw))?;
        let engine = slot.engine.take().ok_or(BridgeError::StaleHandle(raw))?;
        // Generation zero is reserved, so wrap from u32::MAX back to one.
        slot.generation = slot.generation.checked_add(1).unwrap_or(NonZeroU32::MIN);
        slots.free.push(handle.index);
        slots.live -= 1;
        debug!(handle = raw, live = slots.live, "map instance removed");
        Ok(engine)
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.lock().live
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every instance, returning them so they drop outside the lock.
    pub fn drain(&self) -> Vec<Arc<dyn MapEngine>> {
        let mut slots = self.lock();
        let mut engines = Vec::with_capacity(slots.live);
        let mut freed = Vec::new();
        for (index, slot) in slots.entries.iter_mut().enumerate() {
            if let Some(engine) = slot.engine.take() {
                slot.generation = slot.generation.checked_add(1).unwrap_or(NonZeroU32::MIN);
                freed.push(index as u32);
                engines.push(engine);
            }
        }
        slots.free.extend(freed);
        slots.live = 0;
        engines
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use mapview_core::StorePaths;
    use mapview_core::engine::EngineFactory;

    use super::*;
    use crate::headless::{HeadlessFactory, NullObserver};

    fn engine() -> Arc<dyn MapEngine> {
        let paths = StorePaths {
            cache: PathBuf::from("/cache"),
            data: PathBuf::from("/data"),
            assets: PathBuf::from("/apk"),
        };
        HeadlessFactory::default()
            .create(paths, Arc::new(NullObserver))
            .expect("headless engine")
    }

    #[test]
    fn handles_are_never_zero() {
        let table = HandleTable::new();
        for _ in 0..4 {
            assert_ne!(table.insert(engine()).to_raw(), 0);
        }
        assert_eq!(MapHandle::from_raw(0), None);
    }

    #[test]
    fn raw_encoding_round_trips() {
        let table = HandleTable::new();
        let handle = table.insert(engine());
        assert_eq!(MapHandle::from_raw(handle.to_raw()), Some(handle));
    }

    #[test]
    fn distinct_handles_are_independent() {
        let table = HandleTable::new();
        let a = table.insert(engine()).to_raw();
        let b = table.insert(engine()).to_raw();
        assert_ne!(a, b);

        table.remove(a).unwrap();
        assert!(table.get(b).is_ok());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn destroyed_handle_is_stale_even_after_slot_reuse() {
        let table = HandleTable::new();
        let old = table.insert(engine()).to_raw();
        table.remove(old).unwrap();

        let new = table.insert(engine()).to_raw();
        assert_ne!(old, new, "reused slot must carry a new generation");
        assert_eq!(table.get(old).err(), Some(BridgeError::StaleHandle(old)));
        assert!(table.get(new).is_ok());
    }

    #[test]
    fn double_remove_is_reported() {
        let table = HandleTable::new();
        let raw = table.insert(engine()).to_raw();
        assert!(table.remove(raw).is_ok());
        assert_eq!(table.remove(raw).err(), Some(BridgeError::StaleHandle(raw)));
    }

    #[test]
    fn forged_handle_is_stale() {
        let table = HandleTable::new();
        table.insert(engine());
        let forged = 0x7777_0000_0003;
        assert_eq!(table.get(forged).err(), Some(BridgeError::StaleHandle(forged)));
    }

    #[test]
    fn drain_empties_the_table() {
        let table = HandleTable::new();
        let raw = table.insert(engine()).to_raw();
        table.insert(engine());
        assert_eq!(table.drain().len(), 2);
        assert!(table.is_empty());
        assert!(table.get(raw).is_err());
    }

    #[test]
    #[should_panic(expected = "null map handle")]
    fn zero_handle_is_fatal() {
        assert_handle(0, "nativeGetZoom");
    }
}
