//! `GatedAllocator` installed as the process allocator.
//!
//! The gate never closes here: a refused request aborts the whole test
//! binary, and the harness allocates on its own threads.

use nebula_slotpool::gate::{AllocationGate, GateMode, GatedAllocator, ReservedArena, ReservedMemory};

static GATE: AllocationGate = AllocationGate::new();
static RESERVE: ReservedArena<{ 256 * 1024 }> = ReservedArena::new();

#[global_allocator]
static ALLOCATOR: GatedAllocator = GatedAllocator::new(&GATE);

#[test]
fn reserved_window_then_back_to_the_os() {
    GATE.install_reserved(&RESERVE).unwrap();

    let before = Vec::<u64>::with_capacity(8);
    assert!(!RESERVE.owns(before.as_ptr().cast()));

    GATE.use_preallocated();
    let mut inside = Vec::<u64>::with_capacity(32);
    inside.extend(0..32);
    GATE.request_from_os();

    assert_eq!(GATE.mode(), GateMode::Permit);
    assert!(RESERVE.owns(inside.as_ptr().cast()));
    assert_eq!(inside.iter().sum::<u64>(), 496);

    // growing after the window moves the buffer out of the reserve
    inside.extend(32..4096);
    assert!(!RESERVE.owns(inside.as_ptr().cast()));
    assert_eq!(inside[31], 31);

    let after = Box::new([7u8; 64]);
    assert!(!RESERVE.owns(after.as_ptr()));
    assert!(RESERVE.used() >= 32 * size_of::<u64>());

    drop(before);
}
