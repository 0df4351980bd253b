use std::{ptr::NonNull, sync::Arc};

use media_common_traits::memory_owner::{MemoryAllocation, MemoryOwner};

use crate::{align::is_ptr_aligned, block::AlignedBlock, policy::AllocationPolicy};

/// `Buffer` represents a contiguous, immutable memory region with shared ownership
/// semantics.
///
/// Cloning a `Buffer` bumps a reference count and never copies the data. The memory
/// is released when the last clone goes away.
///
/// The memory comes from one of two places:
/// - an [`AlignedBlock`] allocated by the buffer itself, which carries the padding
///   and alignment of the [`AllocationPolicy`] it was created with;
/// - an external [`MemoryOwner`] (a mapped region, a foreign pool), in which case the
///   buffer owns no private copy and whatever padding the owner reports is all that
///   may be read past the end.
#[derive(Clone)]
pub struct Buffer {
    ptr: *const u8,
    len: usize,
    capacity: usize,
    owner: BufOwner,
}

unsafe impl Send for Buffer {}

unsafe impl Sync for Buffer {}

impl Buffer {
    /// Creates a new empty buffer. Does not allocate.
    pub fn new() -> Buffer {
        Buffer {
            ptr: NonNull::<u8>::dangling().as_ptr(),
            len: 0,
            capacity: 0,
            owner: BufOwner::Empty,
        }
    }

    /// Creates a new buffer that takes ownership of the provided block.
    pub fn from_block(block: AlignedBlock) -> Buffer {
        let block = Arc::new(block);
        Buffer {
            ptr: block.as_ptr(),
            len: block.len(),
            capacity: block.capacity(),
            owner: BufOwner::Block(block),
        }
    }

    /// Creates a new buffer of `len` zero bytes, laid out according to `policy`.
    pub fn allocate(len: usize, policy: AllocationPolicy) -> Buffer {
        Self::from_block(AlignedBlock::allocate(len, policy))
    }

    /// Creates a new buffer containing a copy of the provided slice, laid out
    /// according to `policy`.
    pub fn copy_from_slice(data: &[u8], policy: AllocationPolicy) -> Buffer {
        Self::from_block(AlignedBlock::copy_from_slice(data, policy))
    }

    /// Creates a new buffer over memory held by an external owner.
    ///
    /// # Panics
    ///
    /// Panics if the owner reports an inconsistent allocation: capacity smaller than
    /// the length, a null pointer for a non-empty block, or a pointer that does not
    /// honor the reported alignment.
    pub fn from_owner(owner: Arc<dyn MemoryOwner + Send + Sync + 'static>) -> Buffer {
        let MemoryAllocation {
            ptr,
            len,
            capacity,
            alignment,
        } = owner.memory();
        assert!(capacity >= len, "capacity {capacity} < len {len}");
        if capacity == 0 {
            return Buffer {
                owner: BufOwner::External(owner),
                ..Buffer::new()
            };
        }
        assert!(!ptr.is_null());
        assert!(is_ptr_aligned(ptr, alignment));
        Buffer {
            ptr,
            len,
            capacity,
            owner: BufOwner::External(owner),
        }
    }

    /// Returns the length of the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of readable bytes, including the padding tail.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of readable bytes past the end of the data.
    #[inline]
    pub fn padding_len(&self) -> usize {
        self.capacity - self.len
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    /// Returns a reference to the buffer contents as a byte slice.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    /// Returns the buffer contents followed by the padding tail.
    #[inline]
    pub fn as_padded_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.capacity) }
    }

    /// Checks if the buffer is aligned to the specified alignment.
    pub fn is_aligned(&self, alignment: usize) -> bool {
        is_ptr_aligned(self.ptr, alignment)
    }

    /// Returns `true` if the memory belongs to an external owner.
    pub fn is_external(&self) -> bool {
        matches!(self.owner, BufOwner::External(_))
    }

    /// Returns mutable access to the buffer contents.
    ///
    /// If the memory is shared with another `Buffer` or belongs to an external owner,
    /// the contents are first copied into a private block allocated with `policy`;
    /// other holders keep seeing the original bytes.
    pub fn make_mut(&mut self, policy: AllocationPolicy) -> &mut [u8] {
        let unique = match &mut self.owner {
            BufOwner::Block(block) => Arc::get_mut(block).is_some(),
            BufOwner::Empty | BufOwner::External(_) => false,
        };
        if !unique {
            *self = Buffer::copy_from_slice(self.as_slice(), policy);
        }
        match &mut self.owner {
            BufOwner::Block(block) => match Arc::get_mut(block) {
                Some(block) => block.as_mut_slice(),
                None => unreachable!("private block is uniquely owned"),
            },
            BufOwner::Empty | BufOwner::External(_) => unreachable!("private block expected"),
        }
    }
}

impl Buffer {
    /// Returns a slice of `T` values from the buffer.
    ///
    /// # Panics
    ///
    /// Panics if the length is not a multiple of `size_of::<T>()` or the buffer is
    /// not aligned for `T`.
    #[inline]
    pub fn typed_data<T>(&self) -> &[T]
    where
        T: bytemuck::AnyBitPattern,
    {
        bytemuck::cast_slice(self.as_slice())
    }
}

impl std::ops::Deref for Buffer {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_slice().fmt(f)
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<AlignedBlock> for Buffer {
    fn from(block: AlignedBlock) -> Buffer {
        Buffer::from_block(block)
    }
}

#[derive(Clone)]
enum BufOwner {
    Empty,
    Block(Arc<AlignedBlock>),
    External(Arc<dyn MemoryOwner + Send + Sync + 'static>),
}
