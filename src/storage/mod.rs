//! Byte-level storage for packed coefficient vectors

/// Packed coefficient vector engine
pub mod vector;

pub use vector::SlotAddress;
