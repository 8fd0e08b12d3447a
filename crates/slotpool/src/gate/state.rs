//! Allocation gate state

use core::alloc::Layout;
use core::fmt;
use core::ptr;
use core::sync::atomic::{AtomicPtr, AtomicU8, Ordering};
use std::sync::OnceLock;

use parking_lot::{Mutex, MutexGuard};

use super::ReservedMemory;
use crate::error::{PoolError, PoolResult};

/// Policy applied to generic allocation requests
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GateMode {
    /// Requests go to the system allocator
    #[default]
    Permit = 0,
    /// Requests are refused
    Prohibit = 1,
    /// Requests go to the installed reserved memory
    Preallocated = 2,
}

impl GateMode {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Prohibit,
            2 => Self::Preallocated,
            _ => Self::Permit,
        }
    }
}

/// Where an admitted request is served from
#[derive(Clone, Copy)]
pub enum Route {
    /// The system allocator
    System,
    /// The installed reserved memory
    Reserved(&'static dyn ReservedMemory),
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => f.write_str("System"),
            Self::Reserved(_) => f.write_str("Reserved"),
        }
    }
}

/// Process-wide switch deciding whether generic allocations may reach the
/// system allocator
///
/// The host owns the gate, usually as a `static`, and hands references to
/// whoever needs to query or flip it, including a
/// [`GatedAllocator`](super::GatedAllocator). Mode changes are serialized by
/// a spin on a lock that never parks; reading the mode is a single atomic
/// load, so the allocation path never blocks.
///
/// Nothing in here logs or allocates: the gate is consulted from inside the
/// global allocator.
///
/// # Examples
/// ```
/// use nebula_slotpool::gate::{AllocationGate, GateMode};
///
/// static GATE: AllocationGate = AllocationGate::new();
///
/// assert!(GATE.is_allocation_allowed());
/// {
///     let _closed = GATE.scoped(GateMode::Prohibit);
///     assert!(!GATE.is_allocation_allowed());
/// }
/// assert_eq!(GATE.mode(), GateMode::Permit);
/// ```
pub struct AllocationGate {
    mode: AtomicU8,
    toggle: Mutex<()>,
    oom_handler: AtomicPtr<()>,
    reserved: OnceLock<&'static dyn ReservedMemory>,
}

impl AllocationGate {
    /// Creates an open gate
    pub const fn new() -> Self {
        Self::with_mode(GateMode::Permit)
    }

    /// Creates a gate starting in `mode`
    pub const fn with_mode(mode: GateMode) -> Self {
        Self {
            mode: AtomicU8::new(mode as u8),
            toggle: parking_lot::const_mutex(()),
            oom_handler: AtomicPtr::new(ptr::null_mut()),
            reserved: OnceLock::new(),
        }
    }

    /// Current mode
    #[inline]
    pub fn mode(&self) -> GateMode {
        GateMode::from_u8(self.mode.load(Ordering::Acquire))
    }

    /// Switches to `mode`, returning the previous one
    pub fn set_mode(&self, mode: GateMode) -> GateMode {
        let _toggle = self.lock_toggle();
        GateMode::from_u8(self.mode.swap(mode as u8, Ordering::AcqRel))
    }

    /// Never parks the thread: parking may allocate while the gate is closed.
    fn lock_toggle(&self) -> MutexGuard<'_, ()> {
        loop {
            if let Some(guard) = self.toggle.try_lock() {
                return guard;
            }
            core::hint::spin_loop();
        }
    }

    /// Switches to `mode` until the returned guard drops
    pub fn scoped(&self, mode: GateMode) -> GateGuard<'_> {
        GateGuard {
            gate: self,
            previous: self.set_mode(mode),
        }
    }

    /// Lets generic allocations through to the system allocator
    pub fn permit(&self) {
        self.set_mode(GateMode::Permit);
    }

    /// Refuses every generic allocation
    pub fn prohibit(&self) {
        self.set_mode(GateMode::Prohibit);
    }

    /// Sends generic allocations to the system allocator
    pub fn request_from_os(&self) {
        self.set_mode(GateMode::Permit);
    }

    /// Sends generic allocations to the installed reserved memory
    pub fn use_preallocated(&self) {
        self.set_mode(GateMode::Preallocated);
    }

    /// Whether generic allocations are admitted at all
    pub fn is_allocation_allowed(&self) -> bool {
        self.mode() != GateMode::Prohibit
    }

    /// Whether generic allocations reach the system allocator
    pub fn is_request_to_os(&self) -> bool {
        self.mode() == GateMode::Permit
    }

    /// Registers a callback run each time the system allocator fails,
    /// before the request is retried; returns the previous callback
    ///
    /// The callback must free memory or diverge, otherwise the retry loop
    /// never ends. It runs inside the global allocator and must not allocate.
    pub fn set_oom_handler(&self, handler: Option<fn()>) -> Option<fn()> {
        let raw = handler.map_or(ptr::null_mut(), |f| f as *mut ());
        Self::decode_handler(self.oom_handler.swap(raw, Ordering::AcqRel))
    }

    /// The registered out-of-memory callback
    #[inline]
    pub fn oom_handler(&self) -> Option<fn()> {
        Self::decode_handler(self.oom_handler.load(Ordering::Acquire))
    }

    fn decode_handler(raw: *mut ()) -> Option<fn()> {
        if raw.is_null() {
            return None;
        }
        // SAFETY: non-null values are only ever stored by set_oom_handler,
        // from a `fn()` cast to a pointer of the same size.
        Some(unsafe { core::mem::transmute::<*mut (), fn()>(raw) })
    }

    /// Installs the alternate path used in [`GateMode::Preallocated`]
    ///
    /// One-shot: a second installation fails with
    /// [`PoolError::ReservedPathInstalled`].
    pub fn install_reserved(&self, reserved: &'static dyn ReservedMemory) -> PoolResult<()> {
        self.reserved
            .set(reserved)
            .map_err(|_| PoolError::ReservedPathInstalled)
    }

    /// The installed alternate path
    #[inline]
    pub fn reserved(&self) -> Option<&'static dyn ReservedMemory> {
        self.reserved.get().copied()
    }

    /// Applies the current policy to a request
    pub fn route(&self, layout: Layout) -> PoolResult<Route> {
        match self.mode() {
            GateMode::Permit => Ok(Route::System),
            GateMode::Prohibit => Err(PoolError::AllocationProhibited {
                size: layout.size(),
            }),
            GateMode::Preallocated => self.reserved().map(Route::Reserved).ok_or(
                PoolError::NoReservedPath {
                    size: layout.size(),
                },
            ),
        }
    }
}

impl Default for AllocationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AllocationGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllocationGate")
            .field("mode", &self.mode())
            .field("oom_handler", &self.oom_handler().is_some())
            .field("reserved", &self.reserved().is_some())
            .finish()
    }
}

/// Restores the gate's previous mode when dropped
#[must_use = "the previous mode is restored as soon as the guard drops"]
pub struct GateGuard<'a> {
    gate: &'a AllocationGate,
    previous: GateMode,
}

impl GateGuard<'_> {
    /// Mode that will be restored
    pub fn previous(&self) -> GateMode {
        self.previous
    }
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.set_mode(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::ReservedArena;

    fn layout() -> Layout {
        Layout::new::<[u64; 2]>()
    }

    #[test]
    fn test_default_is_open() {
        let gate = AllocationGate::default();
        assert_eq!(gate.mode(), GateMode::Permit);
        assert!(gate.is_allocation_allowed());
        assert!(gate.is_request_to_os());
        assert!(matches!(gate.route(layout()), Ok(Route::System)));
    }

    #[test]
    fn test_toggles() {
        let gate = AllocationGate::new();
        gate.prohibit();
        assert!(!gate.is_allocation_allowed());
        assert_eq!(
            gate.route(layout()).unwrap_err(),
            PoolError::AllocationProhibited { size: 16 }
        );

        gate.use_preallocated();
        assert!(gate.is_allocation_allowed());
        assert!(!gate.is_request_to_os());

        gate.request_from_os();
        assert_eq!(gate.set_mode(GateMode::Prohibit), GateMode::Permit);
        gate.permit();
        assert_eq!(gate.mode(), GateMode::Permit);
    }

    #[test]
    fn test_preallocated_needs_reserved_path() {
        static ARENA: ReservedArena<256> = ReservedArena::new();

        let gate = AllocationGate::with_mode(GateMode::Preallocated);
        assert_eq!(
            gate.route(layout()).unwrap_err(),
            PoolError::NoReservedPath { size: 16 }
        );

        gate.install_reserved(&ARENA).unwrap();
        assert!(matches!(gate.route(layout()), Ok(Route::Reserved(_))));
        assert_eq!(
            gate.install_reserved(&ARENA),
            Err(PoolError::ReservedPathInstalled)
        );
    }

    #[test]
    fn test_scoped_restores_mode() {
        let gate = AllocationGate::with_mode(GateMode::Preallocated);
        {
            let guard = gate.scoped(GateMode::Prohibit);
            assert_eq!(guard.previous(), GateMode::Preallocated);
            assert_eq!(gate.mode(), GateMode::Prohibit);
        }
        assert_eq!(gate.mode(), GateMode::Preallocated);
    }

    #[test]
    fn test_contended_toggles() {
        static GATE: AllocationGate = AllocationGate::new();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        if i % 2 == 0 {
                            GATE.prohibit();
                        } else {
                            GATE.use_preallocated();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // only closing modes were ever set
        assert_ne!(GATE.mode(), GateMode::Permit);
        assert!(GATE.toggle.try_lock().is_some());
    }

    #[test]
    fn test_oom_handler_roundtrip() {
        fn handler() {}

        let gate = AllocationGate::new();
        assert!(gate.oom_handler().is_none());
        assert!(gate.set_oom_handler(Some(handler)).is_none());
        assert!(gate.oom_handler().is_some());
        assert!(gate.set_oom_handler(None).is_some());
        assert!(gate.oom_handler().is_none());
    }
}
