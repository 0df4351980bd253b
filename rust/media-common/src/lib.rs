//! Core definitions (error type and argument verification), relied upon by all media-* crates.

pub mod error;
pub mod result;

pub use result::Result;
