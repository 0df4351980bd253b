//! `AlignedBlock`: a single fixed-size heap allocation with an aligned start
//! and a zero-filled tail.

use std::{alloc::Layout, ptr::NonNull};

use media_common_traits::memory_owner::{MemoryAllocation, MemoryOwner};

use crate::policy::AllocationPolicy;

/// A fixed-size block of bytes, allocated in one piece as `len + padding`
/// bytes at the alignment requested by an [`AllocationPolicy`].
///
/// The padding tail is zeroed right after allocation and is never exposed
/// through [`AlignedBlock::as_slice`] or [`AlignedBlock::as_mut_slice`], so it
/// stays zero for the life of the block. Readers that over-read past `len`
/// (up to `padding` bytes) therefore only ever see initialized zeros.
///
/// The block never grows or shrinks. Memory is released exactly once, when
/// the block is dropped.
pub struct AlignedBlock {
    ptr: NonNull<u8>,
    len: usize,
    capacity: usize,
    layout: Layout,
}

impl AlignedBlock {
    /// Allocates a block for `len` bytes of data, zero-filled.
    ///
    /// The data region is zeroed along with the padding: content the caller
    /// has not written yet reads as zeros rather than uninitialized memory.
    ///
    /// Aborts the process (through [`std::alloc::handle_alloc_error`]) if the
    /// allocator fails.
    pub fn allocate(len: usize, policy: AllocationPolicy) -> AlignedBlock {
        let (capacity, layout) = Self::layout(len, policy);
        let ptr = unsafe { std::alloc::alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(ptr) else {
            std::alloc::handle_alloc_error(layout);
        };
        AlignedBlock {
            ptr,
            len,
            capacity,
            layout,
        }
    }

    /// Allocates a block holding a copy of `data`, followed by zeroed padding.
    pub fn copy_from_slice(data: &[u8], policy: AllocationPolicy) -> AlignedBlock {
        let len = data.len();
        let (capacity, layout) = Self::layout(len, policy);
        let ptr = unsafe { std::alloc::alloc(layout) };
        let Some(ptr) = NonNull::new(ptr) else {
            std::alloc::handle_alloc_error(layout);
        };
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), ptr.as_ptr(), len);
            ptr.as_ptr().add(len).write_bytes(0, layout.size() - len);
        }
        AlignedBlock {
            ptr,
            len,
            capacity,
            layout,
        }
    }

    /// Returns the logical length of the block in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the logical length is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of bytes allocated for the block, `len + padding`.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the alignment of the first byte of the block.
    #[inline]
    pub fn alignment(&self) -> usize {
        self.layout.align()
    }

    /// Returns the policy the block was allocated with.
    pub fn policy(&self) -> AllocationPolicy {
        AllocationPolicy::padded(self.capacity - self.len, self.alignment())
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Returns the data of the block, excluding the padding.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Returns the data of the block for writing, excluding the padding.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Returns the zero-filled tail that follows the data.
    #[inline]
    pub fn padding(&self) -> &[u8] {
        &self.as_padded_slice()[self.len..]
    }

    /// Returns the data together with its padding tail.
    #[inline]
    pub fn as_padded_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.capacity) }
    }

    /// Computes the capacity and the allocation layout for `len` bytes.
    ///
    /// Zero-sized allocations are not allowed by the global allocator, so a
    /// zero capacity still reserves one byte.
    fn layout(len: usize, policy: AllocationPolicy) -> (usize, Layout) {
        let capacity = policy.allocation_size(len);
        let layout =
            Layout::from_size_align(capacity.max(1), policy.alignment()).expect("layout");
        (capacity, layout)
    }
}

impl Drop for AlignedBlock {
    fn drop(&mut self) {
        unsafe { std::alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

// SAFETY: the block exclusively owns its allocation; shared access is read-only.
unsafe impl Send for AlignedBlock {}

unsafe impl Sync for AlignedBlock {}

unsafe impl MemoryOwner for AlignedBlock {
    fn memory(&self) -> MemoryAllocation {
        MemoryAllocation {
            ptr: self.as_ptr(),
            len: self.len,
            capacity: self.capacity,
            alignment: self.alignment(),
        }
    }
}

impl std::ops::Deref for AlignedBlock {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl std::ops::DerefMut for AlignedBlock {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl std::fmt::Debug for AlignedBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBlock")
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .field("alignment", &self.alignment())
            .finish_non_exhaustive()
    }
}
