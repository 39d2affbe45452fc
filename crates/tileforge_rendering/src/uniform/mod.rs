//! Layout-compliant constant buffers.
//!
//! Shader constant blocks follow the std140 rule set: every field is
//! padded to a 16-byte boundary and matrices are stored as a sequence
//! of aligned column vectors. [`UniformArray`] holds several such
//! records in one allocation - camera matrices for different
//! viewpoints, double-buffered per-frame data - so per-frame
//! allocation churn never happens. Record structs are `#[repr(C)]`
//! `Pod` types with explicit padding, the same discipline as a GPU
//! uniform struct written by hand.

mod array;

pub use array::{UniformArray, UniformMapping};

/// The std140 base alignment in bytes.
pub const STD140_ALIGN: usize = 16;

/// Rounds `size` up to the next multiple of the std140 base alignment.
#[inline]
#[must_use]
pub const fn align_std140(size: usize) -> usize {
    (size + STD140_ALIGN - 1) & !(STD140_ALIGN - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_std140() {
        assert_eq!(align_std140(0), 0);
        assert_eq!(align_std140(1), 16);
        assert_eq!(align_std140(12), 16);
        assert_eq!(align_std140(16), 16);
        assert_eq!(align_std140(64), 64);
        assert_eq!(align_std140(76), 80);
    }
}
