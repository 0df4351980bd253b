//! Traits and definitions shared by the media buffer crates.
//!
//! # Modules
//!
//! - [`memory_owner`]: Traits for handing memory that lives outside of the media buffer
//!   allocator (mapped files, shared memory regions, foreign pools) to a buffer.

pub mod memory_owner;
