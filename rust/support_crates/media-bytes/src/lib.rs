//! Byte storage for media buffers: immutable, shared, with guaranteed alignment and
//! a zero-filled tail that fixed-width readers may safely run into.
//!
//! - [`block::AlignedBlock`] is a single padded allocation, owned by one holder.
//! - [`buffer::Buffer`] is a cheap-to-clone shared view over a block or over memory
//!   that belongs to an external [`MemoryOwner`](media_common_traits::memory_owner::MemoryOwner).
//! - [`policy::AllocationPolicy`] tells both how much padding and which alignment to use.

pub mod align;
pub mod block;
pub mod buffer;
pub mod policy;

pub use block::AlignedBlock;
pub use buffer::Buffer;
pub use policy::AllocationPolicy;
