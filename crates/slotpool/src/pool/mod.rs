//! Growable slot pool
//!
//! A pool of equally sized slots for one element type, grown block by block
//! and recycled through an intrusive free list. O(1) allocation and
//! deallocation, one slot per request.
//!
//! ## Modules
//! - `slot_pool` - [`SlotPool`] with the intrusive free list
//! - `config` - Configuration variants (production, debug, performance)
//! - `pool_box` - RAII smart pointer backed by the registry pool
//! - `stats` - Statistics snapshot

pub mod config;
pub mod pool_box;
pub mod slot_pool;
pub mod stats;

pub use config::SlotPoolConfig;
pub use pool_box::PoolBox;
pub use slot_pool::SlotPool;
pub use stats::PoolStats;
