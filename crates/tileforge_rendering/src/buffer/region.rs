//! Region views over packed buffers.

use std::ops::Range;

/// A non-owning view of a contiguous element range in a packed buffer.
///
/// Regions are plain values: an element offset, an element count and
/// the element stride. They resolve to byte ranges on demand and hold
/// no GPU handle, so splitting one physical buffer into N logical
/// regions can never free the underlying allocation twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferRegion {
    /// First element of the region.
    first: usize,
    /// Number of elements in the region.
    count: usize,
    /// Byte stride of one element.
    stride: usize,
}

impl BufferRegion {
    /// Creates a region view.
    #[inline]
    #[must_use]
    pub const fn new(first: usize, count: usize, stride: usize) -> Self {
        Self { first, count, stride }
    }

    /// First element of the region.
    #[inline]
    #[must_use]
    pub const fn first(&self) -> usize {
        self.first
    }

    /// Number of elements in the region.
    #[inline]
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Byte stride of one element.
    #[inline]
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Whether the region contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Byte offset of the region's first element.
    #[inline]
    #[must_use]
    pub const fn byte_offset(&self) -> u64 {
        (self.first * self.stride) as u64
    }

    /// Byte length of the region.
    #[inline]
    #[must_use]
    pub const fn byte_len(&self) -> u64 {
        (self.count * self.stride) as u64
    }

    /// Byte range of the region within its buffer.
    #[inline]
    #[must_use]
    pub fn byte_range(&self) -> Range<u64> {
        self.byte_offset()..self.byte_offset() + self.byte_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_byte_math() {
        let region = BufferRegion::new(4, 3, 12);
        assert_eq!(region.byte_offset(), 48);
        assert_eq!(region.byte_len(), 36);
        assert_eq!(region.byte_range(), 48..84);
    }

    #[test]
    fn test_empty_region() {
        let region = BufferRegion::new(8, 0, 64);
        assert!(region.is_empty());
        assert_eq!(region.byte_len(), 0);
    }
}
