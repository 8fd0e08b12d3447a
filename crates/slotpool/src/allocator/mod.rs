//! Container allocator adapter
//!
//! [`ContainerAllocator`] is the contract generic containers are written
//! against; [`PoolAlloc`] implements it on top of the [`PoolRegistry`](crate::registry::PoolRegistry).

mod pool_alloc;
mod traits;

pub use pool_alloc::PoolAlloc;
pub use traits::ContainerAllocator;
