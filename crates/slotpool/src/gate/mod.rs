//! Global allocation gate
//!
//! A process-wide switch that decides whether generic heap requests may
//! reach the operating system. Hosts close the gate once their pools are
//! warmed up, so a stray allocation in a hot path is caught immediately
//! instead of costing latency later.
//!
//! ## Modules
//! - `state` - [`AllocationGate`], its modes and the scoped [`GateGuard`]
//! - `global` - [`GatedAllocator`], the `GlobalAlloc` front-end
//! - `reserved` - [`ReservedMemory`] and the bump-based [`ReservedArena`]

mod global;
mod reserved;
mod state;

pub use global::GatedAllocator;
pub use reserved::{ReservedArena, ReservedMemory};
pub use state::{AllocationGate, GateGuard, GateMode, Route};
