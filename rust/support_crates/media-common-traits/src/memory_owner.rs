//! `MemoryOwner`: A trait for types that own a block of memory on behalf of a buffer.

/// A trait for types that own a block of readable memory.
///
/// A buffer that wraps a `MemoryOwner` keeps the owner alive for as long as any
/// view of the memory exists, and releases it by dropping the owner. Whatever
/// the owner must do to give the memory back (free, unmap, nothing at all) is
/// up to its `Drop` implementation.
///
/// # Safety
///
/// Implementors must guarantee that:
/// - The memory returned by `memory()` remains valid and immutable
///   for the entire lifetime of the owner.
/// - The whole range `[ptr, ptr + capacity)` is initialized and readable.
/// - `ptr` is aligned to at least `alignment` bytes, and `alignment` is a power of two.
/// - The reported length and capacity are accurate, with `len <= capacity`.
/// - `ptr` is non-null whenever `capacity` is non-zero.
pub unsafe trait MemoryOwner {
    /// Returns information about the owned memory block.
    fn memory(&self) -> MemoryAllocation;
}

/// Represents a block of allocated memory with its size information.
#[derive(Debug, Clone)]
pub struct MemoryAllocation {
    /// Pointer to the start of the allocated memory.
    pub ptr: *const u8,
    /// Logical length of the memory in bytes.
    pub len: usize,
    /// Total readable size of the memory in bytes, including any tail padding.
    pub capacity: usize,
    /// Formal alignment of the memory block.
    pub alignment: usize,
}

impl MemoryAllocation {
    /// Number of readable bytes past the logical end of the block.
    #[inline]
    pub fn padding(&self) -> usize {
        self.capacity - self.len
    }
}
