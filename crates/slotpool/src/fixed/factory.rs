//! Alignment-keyed fixed pool factory

use std::sync::OnceLock;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

#[cfg(feature = "logging")]
use tracing::debug;

use super::{ALIGNMENT_CLASSES, FixedPool};
use crate::error::{PoolError, PoolResult};
use crate::utils::{PowerOfTwo, is_power_of_two};

/// Process-wide mapping from alignment to its single [`FixedPool`]
///
/// A pool is created once per alignment and never re-parameterized. The
/// factory cannot be constructed or cloned; use the associated functions.
pub struct FixedPoolFactory {
    pools: DashMap<usize, &'static FixedPool>,
}

static FACTORY: OnceLock<FixedPoolFactory> = OnceLock::new();

impl FixedPoolFactory {
    fn global() -> &'static Self {
        FACTORY.get_or_init(|| Self {
            pools: DashMap::new(),
        })
    }

    /// Creates the pool for `alignment` with `slot_count` slots
    ///
    /// Repeating the call with the same slot count returns the existing
    /// pool; a different slot count fails with
    /// [`PoolError::FixedPoolExists`].
    pub fn create_pool(alignment: usize, slot_count: usize) -> PoolResult<&'static FixedPool> {
        Self::get_or_create(alignment, slot_count, true)
    }

    /// Like [`create_pool`](Self::create_pool), with the alignment checked
    /// at compile time
    pub fn create<const A: usize>(slot_count: usize) -> PoolResult<&'static FixedPool> {
        const { PowerOfTwo::<A>::ASSERT };
        Self::create_pool(A, slot_count)
    }

    /// Returns the pool for `alignment`, creating a single-slot pool if
    /// none exists yet
    pub fn pool(alignment: usize) -> PoolResult<&'static FixedPool> {
        Self::get_or_create(alignment, 1, false)
    }

    /// Returns the pool for `alignment` if it has been created
    pub fn get(alignment: usize) -> Option<&'static FixedPool> {
        FACTORY
            .get()
            .and_then(|factory| factory.pools.get(&alignment).map(|entry| *entry.value()))
    }

    /// Creates a pool of `slot_count` slots for every alignment class
    ///
    /// A class that already exists is kept as it is, whatever slot count it
    /// was created with, and the remaining classes are still created.
    pub fn create_all(slot_count: usize) -> PoolResult<()> {
        for alignment in ALIGNMENT_CLASSES {
            Self::get_or_create(alignment, slot_count, false)?;
        }
        Ok(())
    }

    /// Number of pools created so far
    pub fn len() -> usize {
        FACTORY.get().map_or(0, |factory| factory.pools.len())
    }

    /// Whether no pool has been created yet
    pub fn is_empty() -> bool {
        Self::len() == 0
    }

    fn get_or_create(
        alignment: usize,
        slot_count: usize,
        strict: bool,
    ) -> PoolResult<&'static FixedPool> {
        if !is_power_of_two(alignment) {
            return Err(PoolError::invalid_alignment(alignment));
        }

        match Self::global().pools.entry(alignment) {
            Entry::Occupied(entry) => {
                let pool = *entry.get();
                if strict && pool.slot_count() != slot_count {
                    return Err(PoolError::fixed_pool_exists(
                        alignment,
                        pool.slot_count(),
                        slot_count,
                    ));
                }
                Ok(pool)
            },
            Entry::Vacant(entry) => {
                let pool: &'static FixedPool = Box::leak(Box::new(FixedPool::new(alignment, slot_count)?));

                #[cfg(feature = "logging")]
                debug!(
                    alignment,
                    slot_count,
                    base = ?pool.base(),
                    "fixed pool created"
                );

                entry.insert(pool);
                Ok(pool)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Unit tests share one process-wide factory; each test owns distinct alignments.

    #[test]
    fn test_create_once() {
        let first = FixedPoolFactory::create_pool(2048, 3).unwrap();
        let again = FixedPoolFactory::create_pool(2048, 3).unwrap();
        assert!(core::ptr::eq(first, again));
        assert!(core::ptr::eq(FixedPoolFactory::get(2048).unwrap(), first));

        assert_eq!(
            FixedPoolFactory::create_pool(2048, 4).unwrap_err(),
            PoolError::FixedPoolExists {
                alignment: 2048,
                existing: 3,
                requested: 4
            }
        );
    }

    #[test]
    fn test_pool_defaults_to_single_slot() {
        let pool = FixedPoolFactory::pool(4096).unwrap();
        assert_eq!(pool.slot_count(), 1);
        // an existing pool is returned whatever slot count it was made with
        assert!(core::ptr::eq(FixedPoolFactory::pool(4096).unwrap(), pool));
    }

    #[test]
    fn test_const_alignment() {
        let pool = FixedPoolFactory::create::<8192>(2).unwrap();
        assert_eq!(pool.alignment(), 8192);
        assert_eq!(pool.size_bytes(), 16384);
    }

    #[test]
    fn test_invalid_alignment() {
        assert_eq!(
            FixedPoolFactory::create_pool(96, 1).unwrap_err(),
            PoolError::InvalidAlignment { alignment: 96 }
        );
        assert!(FixedPoolFactory::get(96).is_none());
    }
}
