//! Typed packed buffers and region views.
//!
//! A [`PackedBuffer`] is the shared storage unit of the whole
//! subsystem: geometry for every mesh type lands back to back in one
//! vertex buffer and one index buffer, and instance data shares a
//! single arena. [`BufferRegion`] addresses a slice of such a buffer
//! by value - it never owns a GPU handle, so a region can neither
//! double-free nor outlive-and-dangle.

mod packed;
mod region;

pub use packed::{BufferKind, PackedBuffer};
pub use region::BufferRegion;
