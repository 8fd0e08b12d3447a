//! Fixed aligned pools
//!
//! A capacity-bounded alternative to the slot pool: one pre-reserved,
//! zeroed block per alignment class, addressed by index and never recycled.
//! Useful when the arena for each alignment should be set aside up front.
//!
//! ## Modules
//! - `pool` - [`FixedPool`], the block itself
//! - `factory` - [`FixedPoolFactory`], one pool per alignment for the process
//! - `access` - [`FixedPoolAccess`], typed indexing on top of a pool

mod access;
mod factory;
mod pool;

pub use access::FixedPoolAccess;
pub use factory::FixedPoolFactory;
pub use pool::FixedPool;

/// Alignment classes pre-created by [`FixedPoolFactory::create_all`]
pub const ALIGNMENT_CLASSES: [usize; 11] = [1, 2, 4, 8, 16, 32, 64, 128, 256, 512, 1024];

/// Slots per alignment class reserved by [`crate::init`]
pub const DEFAULT_SLOTS_PER_CLASS: usize = 100;
