//! Type-indexed pool registry
//!
//! One [`SlotPool`] per element type for the whole process. A pool is
//! created the first time its type is looked up and lives until the process
//! exits; callers never own it and should always re-resolve it through
//! [`PoolRegistry::pool`] rather than store the reference in long-lived
//! structures of their own.
//!
//! Each pool sits behind a `parking_lot::Mutex`. The pool algorithm itself
//! is single-threaded; the mutex is what makes sharing a `&'static` pool
//! between threads sound.

use core::any::{Any, TypeId};
use std::sync::OnceLock;

use dashmap::DashMap;
use parking_lot::Mutex;

#[cfg(feature = "logging")]
use tracing::debug;

use crate::error::PoolResult;
use crate::pool::{SlotPool, SlotPoolConfig};

/// A registry-owned pool, shared by every user of its element type
pub type SharedPool<T> = Mutex<SlotPool<T>>;

type Entry = &'static (dyn Any + Send + Sync);

/// Process-wide mapping from element type to its singleton pool
///
/// There is no way to construct, clone or move the registry; all access goes
/// through the associated functions.
pub struct PoolRegistry {
    pools: DashMap<TypeId, Entry>,
}

static REGISTRY: OnceLock<PoolRegistry> = OnceLock::new();

impl PoolRegistry {
    fn global() -> &'static Self {
        REGISTRY.get_or_init(|| Self {
            pools: DashMap::new(),
        })
    }

    /// Returns the pool for `T`, creating an empty one on first use
    ///
    /// Safe under concurrent first use: creation runs while holding the
    /// map entry, so racing threads all observe the same instance.
    pub fn pool<T: 'static>() -> &'static SharedPool<T> {
        let registry = Self::global();
        let id = TypeId::of::<T>();

        let existing: Option<Entry> = registry.pools.get(&id).map(|entry| *entry.value());
        if let Some(pool) = existing.and_then(|entry| entry.downcast_ref::<SharedPool<T>>()) {
            return pool;
        }

        let entry = *registry.pools.entry(id).or_insert_with(|| {
            #[cfg(feature = "logging")]
            debug!(
                type_name = core::any::type_name::<T>(),
                slot_size = size_of::<T>(),
                "registering slot pool"
            );

            let pool: Entry = Box::leak(Box::new(Mutex::new(SlotPool::<T>::with_config(
                SlotPoolConfig::shared(),
            ))));
            pool
        });

        match entry.downcast_ref::<SharedPool<T>>() {
            Some(pool) => pool,
            // TypeId keys make a mismatch impossible
            None => unreachable!(
                "registry entry for {} has the wrong type",
                core::any::type_name::<T>()
            ),
        }
    }

    /// Grows the pool for `T` by a block of `n` slots
    pub fn reserve<T: 'static>(n: usize) -> PoolResult<()> {
        Self::pool::<T>().lock().add_memory(n)
    }

    /// Whether a pool for `T` has been created
    pub fn is_registered<T: 'static>() -> bool {
        REGISTRY
            .get()
            .is_some_and(|registry| registry.pools.contains_key(&TypeId::of::<T>()))
    }

    /// Number of pools created so far
    pub fn len() -> usize {
        REGISTRY.get().map_or(0, |registry| registry.pools.len())
    }

    /// Whether no pool has been created yet
    pub fn is_empty() -> bool {
        Self::len() == 0
    }
}
