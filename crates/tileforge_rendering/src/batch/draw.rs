//! Draw argument and upload planning types.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use super::BatchStats;

/// Arguments of one indexed, instanced draw submission.
///
/// Field-for-field the standard indexed-indirect argument layout, so
/// a future indirect path can upload these verbatim.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndexedArgs {
    /// Number of indices read for one instance.
    pub index_count: u32,
    /// Number of instances drawn.
    pub instance_count: u32,
    /// First index within the shared index buffer.
    pub first_index: u32,
    /// Value added to every index before vertex lookup.
    pub base_vertex: i32,
    /// First instance within the shared instance buffer.
    pub first_instance: u32,
}

impl DrawIndexedArgs {
    /// Index range of this draw, as `draw_indexed` wants it.
    #[inline]
    #[must_use]
    pub const fn index_range(&self) -> Range<u32> {
        self.first_index..self.first_index + self.index_count
    }

    /// Instance range of this draw, as `draw_indexed` wants it.
    #[inline]
    #[must_use]
    pub const fn instance_range(&self) -> Range<u32> {
        self.first_instance..self.first_instance + self.instance_count
    }
}

/// One contiguous byte range scheduled for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSpan {
    /// Byte offset into both the staging arena and the GPU buffer
    /// (their layouts are identical).
    pub offset: usize,
    /// Number of bytes to transfer.
    pub len: usize,
}

impl UploadSpan {
    /// Staging index range of the span.
    #[inline]
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }

    /// Destination offset for `Queue::write_buffer`.
    #[inline]
    #[must_use]
    pub const fn gpu_offset(&self) -> u64 {
        self.offset as u64
    }
}

/// Everything one frame needs from the CPU side of a batch.
///
/// Produced by [`MultiBatch::prepare_frame`](super::MultiBatch::prepare_frame);
/// owning no GPU state, it is fully inspectable in headless tests.
#[derive(Debug)]
pub struct FrameData<'a> {
    /// The whole instance staging arena (upload spans index into it).
    pub instance_bytes: &'a [u8],
    /// Unflushed tails to transfer, in arena order.
    pub uploads: Vec<UploadSpan>,
    /// One entry per sub-mesh with at least one instance, in sub-mesh
    /// index order.
    pub draws: Vec<DrawIndexedArgs>,
    /// Counters for this pass.
    pub stats: BatchStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_ranges() {
        let args = DrawIndexedArgs {
            index_count: 36,
            instance_count: 3,
            first_index: 72,
            base_vertex: 48,
            first_instance: 8,
        };
        assert_eq!(args.index_range(), 72..108);
        assert_eq!(args.instance_range(), 8..11);
    }

    #[test]
    fn test_upload_span_ranges() {
        let span = UploadSpan { offset: 152, len: 76 };
        assert_eq!(span.range(), 152..228);
        assert_eq!(span.gpu_offset(), 152);
    }
}
