/// Checks if a number is aligned to the specified alignment boundary.
///
/// # Examples
///
/// ```
/// use media_bytes::align::is_aligned;
///
/// assert!(is_aligned(0, 16));
/// assert!(!is_aligned(8, 16));
/// assert!(is_aligned(48, 16));
/// ```
#[inline]
pub fn is_aligned(n: usize, alignment: usize) -> bool {
    debug_assert_ne!(alignment, 0);
    debug_assert!(alignment.is_power_of_two());
    (n & (alignment - 1)) == 0
}

/// Checks if a pointer is aligned to the specified alignment boundary.
///
/// Returns `false` when `alignment` is not a power of two.
#[inline]
pub fn is_ptr_aligned(ptr: *const u8, alignment: usize) -> bool {
    alignment.is_power_of_two() && is_aligned(ptr as usize, alignment)
}
