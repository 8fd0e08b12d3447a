//! # nebula-slotpool
//!
//! Fixed-size object pools for node-based containers.
//!
//! The crate provides:
//! - [`SlotPool`]: a growable pool of equally sized slots recycled through an
//!   intrusive free list
//! - [`PoolRegistry`]: exactly one shared pool per element type for the process
//! - [`PoolAlloc`]: a stateless container allocator served by the registry
//! - [`FixedPoolFactory`]: pre-reserved, zeroed pools keyed by alignment
//! - [`AllocationGate`] and [`GatedAllocator`]: a process-wide switch that
//!   keeps generic allocations away from the OS once the host is warmed up
//!
//! ## Quick Start
//!
//! ```rust
//! use nebula_slotpool::prelude::*;
//!
//! # fn main() -> PoolResult<()> {
//! let mut pool = SlotPool::<u64>::new();
//! pool.add_memory(16)?;
//!
//! let slot = pool.allocate(1)?;
//! unsafe {
//!     slot.as_ptr().write(42);
//!     pool.deallocate(slot, 1)?;
//! }
//!
//! // Shared pool behind a smart pointer
//! let boxed = PoolBox::new(7u64)?;
//! assert_eq!(*boxed, 7);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `logging` (default): structured logging of pool growth and error
//!   construction via `tracing`
//!
//! ## Architecture
//!
//! - Result-based errors via [`error`]; nothing in the allocation paths panics
//! - Pools never return memory to the OS before they are dropped
//! - The gate and the `GlobalAlloc` front-end never log and never allocate

#![cfg_attr(docsrs, feature(doc_cfg))]
// Pools hand out raw slots; unsafe is the point of the crate and reviewed per-site
#![allow(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::perf)]
#![warn(clippy::pedantic)]
#![warn(rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
// inline(always) on alignment helpers is intentional for hot paths
#![allow(clippy::inline_always)]
// Struct bool fields are configuration
#![allow(clippy::struct_excessive_bools)]
// Free-list links are read and written unaligned, slot pointers are cast per type
#![allow(clippy::cast_ptr_alignment)]
// usize -> u64 counters
#![allow(clippy::cast_possible_truncation)]

// Error types
pub mod error;

// Core modules
pub mod allocator;
pub mod fixed;
pub mod gate;
pub mod pool;
pub mod registry;
pub mod utils;

pub use crate::allocator::{ContainerAllocator, PoolAlloc};
pub use crate::error::{ErrorCategory, PoolError, PoolResult};
pub use crate::fixed::{
    ALIGNMENT_CLASSES, DEFAULT_SLOTS_PER_CLASS, FixedPool, FixedPoolAccess, FixedPoolFactory,
};
pub use crate::gate::{AllocationGate, GateMode, GatedAllocator};
pub use crate::pool::{PoolBox, PoolStats, SlotPool, SlotPoolConfig};
pub use crate::registry::PoolRegistry;

pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::error::{PoolError, PoolResult};

    pub use crate::allocator::{ContainerAllocator, PoolAlloc};
    pub use crate::pool::{PoolBox, SlotPool, SlotPoolConfig};
    pub use crate::registry::PoolRegistry;

    pub use crate::fixed::{FixedPoolAccess, FixedPoolFactory};

    pub use crate::gate::{AllocationGate, GateMode, GatedAllocator};
}

#[cfg(feature = "logging")]
use tracing::{debug, info};

/// Reserves the fixed pools for every alignment class.
///
/// Each class in [`ALIGNMENT_CLASSES`] gets [`DEFAULT_SLOTS_PER_CLASS`]
/// slots. Classes that were already resolved lazily keep their existing
/// pool; every other class is still created. Repeated calls are no-ops.
///
/// # Examples
///
/// ```rust
/// fn main() -> nebula_slotpool::PoolResult<()> {
///     nebula_slotpool::init()?;
///     assert!(nebula_slotpool::FixedPoolFactory::get(8).is_some());
///     Ok(())
/// }
/// ```
pub fn init() -> PoolResult<()> {
    #[cfg(feature = "logging")]
    {
        debug!("Initializing nebula-slotpool fixed pools");
    }

    FixedPoolFactory::create_all(DEFAULT_SLOTS_PER_CLASS)?;

    #[cfg(feature = "logging")]
    {
        info!(
            classes = ALIGNMENT_CLASSES.len(),
            slots = DEFAULT_SLOTS_PER_CLASS,
            "nebula-slotpool initialized"
        );
    }

    Ok(())
}
