//! Alignment helpers
//!
//! Pure address arithmetic used to size slots, place fixed pools and bump
//! the reserved arena. Everything here is `const` so it can also run at
//! compile time, e.g. to reject a non-power-of-two alignment class.

/// Returns `true` if `value` is a non-zero power of two
///
/// # Examples
/// ```
/// use nebula_slotpool::utils::is_power_of_two;
///
/// assert!(is_power_of_two(1));
/// assert!(is_power_of_two(1024));
/// assert!(!is_power_of_two(0));
/// assert!(!is_power_of_two(12));
/// ```
#[inline(always)]
pub const fn is_power_of_two(value: usize) -> bool {
    value != 0 && value & (value - 1) == 0
}

/// Compile-time check that `N` is a power of two
///
/// Evaluating [`PowerOfTwo::ASSERT`] inside a `const` block turns a bad
/// alignment into a build error instead of a runtime one.
///
/// ```
/// use nebula_slotpool::utils::PowerOfTwo;
///
/// const { PowerOfTwo::<64>::ASSERT };
/// ```
///
/// ```compile_fail
/// use nebula_slotpool::utils::PowerOfTwo;
///
/// const { PowerOfTwo::<48>::ASSERT };
/// ```
pub struct PowerOfTwo<const N: usize>;

impl<const N: usize> PowerOfTwo<N> {
    /// Fails const evaluation unless `N` is a power of two
    pub const ASSERT: () = assert!(is_power_of_two(N), "alignment has to be a power of two");
}

/// Aligns a value up to the nearest multiple of alignment
///
/// # Examples
/// ```
/// use nebula_slotpool::utils::align_up;
///
/// assert_eq!(align_up(7, 8), 8);
/// assert_eq!(align_up(8, 8), 8);
/// assert_eq!(align_up(9, 8), 16);
/// ```
#[inline(always)]
pub const fn align_up(value: usize, alignment: usize) -> usize {
    debug_assert!(is_power_of_two(alignment));
    (value + alignment - 1) & !(alignment - 1)
}

/// Like [`align_up`], but returns `None` instead of wrapping near `usize::MAX`
#[inline]
pub const fn checked_align_up(value: usize, alignment: usize) -> Option<usize> {
    if !is_power_of_two(alignment) {
        return None;
    }
    match value.checked_add(alignment - 1) {
        Some(bumped) => Some(bumped & !(alignment - 1)),
        None => None,
    }
}

/// Aligns a value down to the nearest multiple of alignment
///
/// # Examples
/// ```
/// use nebula_slotpool::utils::align_down;
///
/// assert_eq!(align_down(7, 8), 0);
/// assert_eq!(align_down(9, 8), 8);
/// ```
#[inline(always)]
pub const fn align_down(value: usize, alignment: usize) -> usize {
    debug_assert!(is_power_of_two(alignment));
    value & !(alignment - 1)
}

/// Checks if a value is aligned to the given alignment
#[inline(always)]
pub const fn is_aligned(value: usize, alignment: usize) -> bool {
    debug_assert!(is_power_of_two(alignment));
    value & (alignment - 1) == 0
}

/// Check if a pointer is properly aligned
#[inline(always)]
pub fn is_aligned_ptr<T>(ptr: *const T, alignment: usize) -> bool {
    is_aligned(ptr.addr(), alignment)
}
