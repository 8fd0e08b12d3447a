//! Container allocator contract
//!
//! The boundary a node-based container is written against: allocate and
//! construct one element, later destroy and deallocate that element.
//! Implementations decide where the storage comes from; the container only
//! sees typed, uninitialized slots.
//!
//! # Safety
//!
//! `ContainerAllocator` is an unsafe trait. Implementors promise that:
//! - `allocate(n)` returns storage valid and aligned for `n` values of
//!   `Self::Value`, not aliased by any other live allocation
//! - storage stays valid until passed back to `deallocate` on an allocator
//!   that compares equal
//! - `Rebind<U>` allocators obey the same rules for `U`

use core::ptr::{self, NonNull};

use crate::error::PoolResult;

/// Allocator interface for containers that allocate one element at a time
///
/// Mirrors the classic container-allocator protocol: typed allocation,
/// placement construction and destruction, rebinding to a container's
/// internal node type, a `max_size` bound, and equality meaning "storage from
/// one may be released through the other".
pub unsafe trait ContainerAllocator: Clone {
    /// Element type this allocator hands out storage for
    type Value;

    /// The same allocator family, bound to another element type
    type Rebind<U: 'static>: ContainerAllocator<Value = U>;

    /// Every instance compares equal to every other instance
    const IS_ALWAYS_EQUAL: bool;

    /// A container should take the source allocator on move assignment
    const PROPAGATE_ON_MOVE_ASSIGNMENT: bool;

    /// Allocates uninitialized storage for `n` values
    fn allocate(&self, n: usize) -> PoolResult<NonNull<Self::Value>>;

    /// Releases storage previously returned by [`allocate`](Self::allocate)
    ///
    /// # Safety
    ///
    /// - `ptr` came from `allocate(n)` on an allocator equal to `self`
    /// - the values in it were already destroyed or moved out
    /// - `ptr` is not used afterwards
    unsafe fn deallocate(&self, ptr: NonNull<Self::Value>, n: usize) -> PoolResult<()>;

    /// Largest `n` that `allocate` could ever be asked for
    fn max_size(&self) -> usize;

    /// Produces the allocator for element type `U`
    fn rebind<U: 'static>(&self) -> Self::Rebind<U>;

    /// Constructs `value` in place
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writes and hold no live value.
    unsafe fn construct(&self, ptr: NonNull<Self::Value>, value: Self::Value) {
        // SAFETY: forwarded from the caller
        unsafe { ptr.as_ptr().write(value) };
    }

    /// Runs the destructor of the value at `ptr` without releasing storage
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live value that is not used afterwards.
    unsafe fn destroy(&self, ptr: NonNull<Self::Value>) {
        // SAFETY: forwarded from the caller
        unsafe { ptr::drop_in_place(ptr.as_ptr()) };
    }

    /// Address of a value
    fn address(&self, value: &Self::Value) -> NonNull<Self::Value> {
        NonNull::from(value)
    }
}
