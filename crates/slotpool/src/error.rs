//! Error types for nebula-slotpool
//!
//! Every misuse the pools can detect surfaces as its own [`PoolError`]
//! variant instead of terminating the process. Fields are plain integers or
//! `&'static str`, so building an error never touches the heap; this keeps
//! the errors usable from inside a global allocator.

use core::alloc::Layout;
use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::{error, warn};

// ============================================================================
// Error Categories
// ============================================================================

/// Broad classification of a [`PoolError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The caller broke the pool contract (wrong slot count, bad alignment, ...)
    ContractViolation,
    /// The underlying system allocator could not satisfy a request
    ResourceExhaustion,
    /// The allocation gate refused the request
    PolicyViolation,
}

// ============================================================================
// Main Error Type
// ============================================================================

/// Slot pool, registry, fixed pool and gate errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    // --- Contract Violations ---
    #[error("Unsupported slot count {requested}: pools hand out exactly one slot per request")]
    UnsupportedSlotCount { requested: usize },

    #[error("Cannot create or grow a pool by zero slots")]
    ZeroSlots,

    #[error("Pool has not been created yet: no memory block was ever added")]
    PoolNotCreated,

    #[error("Allocation exceeds maximum size: {requested} elements (max: {max})")]
    ExceedsMaxSize { requested: usize, max: usize },

    #[error(
        "Fixed pool for alignment {alignment} already exists with {existing} slots (requested {requested})"
    )]
    FixedPoolExists {
        alignment: usize,
        existing: usize,
        requested: usize,
    },

    #[error("Invalid alignment: {alignment} is not a power of two")]
    InvalidAlignment { alignment: usize },

    #[error("Slot index {index} out of bounds (capacity: {capacity})")]
    IndexOutOfBounds { index: usize, capacity: usize },

    #[error("Size overflow during operation: {operation}")]
    SizeOverflow { operation: &'static str },

    #[error("Pointer {addr:#x} does not address a slot of this pool")]
    ForeignSlot { addr: usize },

    #[error("A reserved memory path is already installed")]
    ReservedPathInstalled,

    // --- Resource Exhaustion ---
    #[error("Memory allocation failed: {size} bytes with {align} byte alignment")]
    AllocationFailed { size: usize, align: usize },

    // --- Policy Violations ---
    #[error("Allocation prohibited: {size} bytes requested while the gate is closed")]
    AllocationProhibited { size: usize },

    #[error("Allocation of {size} bytes routed to reserved memory, but none is installed")]
    NoReservedPath { size: usize },
}

impl PoolError {
    /// Classify this error
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AllocationFailed { .. } => ErrorCategory::ResourceExhaustion,
            Self::AllocationProhibited { .. } | Self::NoReservedPath { .. } => {
                ErrorCategory::PolicyViolation
            },
            _ => ErrorCategory::ContractViolation,
        }
    }

    /// Check if error is retryable
    ///
    /// Only exhaustion of the system allocator may go away on its own.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AllocationFailed { .. })
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedSlotCount { .. } => "POOL:SLOT:COUNT",
            Self::ZeroSlots => "POOL:SLOT:ZERO",
            Self::PoolNotCreated => "POOL:STATE:UNCREATED",
            Self::ExceedsMaxSize { .. } => "POOL:ALLOC:MAX",
            Self::FixedPoolExists { .. } => "POOL:FIXED:EXISTS",
            Self::InvalidAlignment { .. } => "POOL:ALLOC:ALIGN",
            Self::IndexOutOfBounds { .. } => "POOL:FIXED:INDEX",
            Self::SizeOverflow { .. } => "POOL:ALLOC:OVERFLOW",
            Self::ForeignSlot { .. } => "POOL:SLOT:FOREIGN",
            Self::ReservedPathInstalled => "POOL:GATE:INSTALLED",
            Self::AllocationFailed { .. } => "POOL:ALLOC:FAILED",
            Self::AllocationProhibited { .. } => "POOL:GATE:PROHIBITED",
            Self::NoReservedPath { .. } => "POOL:GATE:NO_RESERVED",
        }
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create unsupported slot count error
    pub fn unsupported_slot_count(requested: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(requested, "slot pool asked for more or less than one slot");

        Self::UnsupportedSlotCount { requested }
    }

    /// Create allocation failed error
    pub fn allocation_failed(size: usize, align: usize) -> Self {
        #[cfg(feature = "logging")]
        error!(
            "Memory allocation failed: {} bytes with {} alignment",
            size, align
        );

        Self::AllocationFailed { size, align }
    }

    /// Create allocation failed error from layout
    pub fn allocation_failed_with_layout(layout: Layout) -> Self {
        Self::allocation_failed(layout.size(), layout.align())
    }

    /// Create size overflow error
    pub fn size_overflow(operation: &'static str) -> Self {
        Self::SizeOverflow { operation }
    }

    /// Create invalid alignment error
    pub fn invalid_alignment(alignment: usize) -> Self {
        Self::InvalidAlignment { alignment }
    }

    /// Create allocation too large error
    pub fn exceeds_max_size(requested: usize, max: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(requested, max, "container requested more elements than addressable");

        Self::ExceedsMaxSize { requested, max }
    }

    /// Create fixed pool re-parameterization error
    pub fn fixed_pool_exists(alignment: usize, existing: usize, requested: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(
            alignment,
            existing, requested, "attempt to re-create fixed pool with different slot count"
        );

        Self::FixedPoolExists {
            alignment,
            existing,
            requested,
        }
    }

    /// Create foreign slot error
    pub fn foreign_slot<T>(ptr: *const T) -> Self {
        #[cfg(feature = "logging")]
        error!("Slot {:p} returned to a pool that does not own it", ptr);

        Self::ForeignSlot { addr: ptr.addr() }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for pool operations
pub type PoolResult<T> = Result<T, PoolError>;

// ============================================================================
// Tests
// ============================================================================
