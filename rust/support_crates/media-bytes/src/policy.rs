use media_common::{Result, verify_arg};

/// Describes how a block of bytes is laid out in memory: the alignment of
/// its first byte and the number of zero bytes that follow its logical end.
///
/// The padding exists for consumers that read memory in fixed-width chunks
/// (SIMD loads in codecs, for the most part) and may therefore touch up to
/// `padding` bytes past the end of the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllocationPolicy {
    padding: usize,
    alignment: usize,
}

impl AllocationPolicy {
    /// Largest alignment a policy may request.
    pub const MAX_ALIGNMENT: usize = 4096;

    /// Ordinary allocation: no tail padding, byte alignment.
    pub const UNPADDED: AllocationPolicy = AllocationPolicy::padded(0, 1);

    /// Creates a policy, validating that `alignment` is a power of two no
    /// greater than [`Self::MAX_ALIGNMENT`].
    pub fn new(padding: usize, alignment: usize) -> Result<AllocationPolicy> {
        verify_arg!(alignment, alignment.is_power_of_two());
        verify_arg!(alignment, alignment <= Self::MAX_ALIGNMENT);
        Ok(AllocationPolicy { padding, alignment })
    }

    /// Const counterpart of [`Self::new`] for policy presets.
    ///
    /// # Panics
    ///
    /// Panics (at compile time when used in a const context) if `alignment`
    /// is not a power of two or exceeds [`Self::MAX_ALIGNMENT`].
    pub const fn padded(padding: usize, alignment: usize) -> AllocationPolicy {
        assert!(alignment.is_power_of_two());
        assert!(alignment <= Self::MAX_ALIGNMENT);
        AllocationPolicy { padding, alignment }
    }

    /// Number of zero bytes that follow the logical end of the data.
    #[inline]
    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Alignment of the first byte of the data.
    #[inline]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Total number of bytes allocated for `len` bytes of data.
    ///
    /// # Panics
    ///
    /// Panics if the size overflows `usize`.
    #[inline]
    pub fn allocation_size(&self, len: usize) -> usize {
        len.checked_add(self.padding).expect("allocation size overflow")
    }
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self::UNPADDED
    }
}
