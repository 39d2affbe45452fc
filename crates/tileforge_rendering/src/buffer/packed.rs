//! Growable typed buffers with a CPU staging mirror.

use bytemuck::Pod;

use super::BufferRegion;
use crate::error::RenderError;

/// Binding target of a packed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// Per-vertex geometry data.
    Vertex,
    /// Index data.
    Index,
    /// Per-instance attribute data.
    Instance,
}

impl BufferKind {
    /// GPU usage flags for this binding target.
    ///
    /// Every kind carries `COPY_DST` so tail flushes can go through
    /// `Queue::write_buffer`.
    #[must_use]
    pub const fn usages(self) -> wgpu::BufferUsages {
        match self {
            Self::Vertex | Self::Instance => {
                wgpu::BufferUsages::VERTEX.union(wgpu::BufferUsages::COPY_DST)
            }
            Self::Index => wgpu::BufferUsages::INDEX.union(wgpu::BufferUsages::COPY_DST),
        }
    }

    /// Debug label for buffers of this kind.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Vertex => "tileforge vertex buffer",
            Self::Index => "tileforge index buffer",
            Self::Instance => "tileforge instance buffer",
        }
    }
}

/// A strongly typed, growable buffer backed by CPU staging.
///
/// The staging vector is the source of truth; a `wgpu::Buffer` of the
/// reserved capacity mirrors it after [`ensure_gpu`](Self::ensure_gpu)
/// plus [`flush`](Self::flush). Growth reallocates to the smallest
/// power of two that fits the new total and preserves all prior
/// contents. Only the unflushed tail is transferred on flush; a
/// reallocation re-marks the whole buffer as pending because the GPU
/// allocation is replaced.
///
/// Element layout is whatever `#[repr(C)]` `Pod` struct the buffer is
/// instantiated with - interleaved streams, no implicit conversion.
pub struct PackedBuffer<T: Pod> {
    /// CPU staging - authoritative contents.
    data: Vec<T>,
    /// Reserved element capacity (`len() <= capacity()` always).
    capacity: usize,
    /// Binding target.
    kind: BufferKind,
    /// Number of capacity reallocations performed so far.
    reallocations: u32,
    /// Elements `0..flushed` are already resident on the GPU.
    flushed: usize,
    /// Lazily created GPU mirror.
    gpu: Option<wgpu::Buffer>,
    /// Element capacity the GPU mirror was allocated for.
    gpu_capacity: usize,
}

impl<T: Pod> PackedBuffer<T> {
    /// Creates an empty buffer with zero reserved capacity.
    #[must_use]
    pub const fn new(kind: BufferKind) -> Self {
        Self {
            data: Vec::new(),
            capacity: 0,
            kind,
            reallocations: 0,
            flushed: 0,
            gpu: None,
            gpu_capacity: 0,
        }
    }

    /// Creates an empty buffer with `capacity` elements pre-reserved.
    ///
    /// # Errors
    ///
    /// [`RenderError::Allocation`] if the reservation fails; no buffer
    /// is created in that case.
    pub fn with_capacity(kind: BufferKind, capacity: usize) -> Result<Self, RenderError> {
        let mut buffer = Self::new(kind);
        if capacity > 0 {
            buffer.reserve_exact(capacity)?;
        }
        Ok(buffer)
    }

    /// Byte stride of one element.
    #[inline]
    #[must_use]
    pub const fn stride() -> usize {
        std::mem::size_of::<T>()
    }

    /// Number of elements appended so far.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reserved element capacity.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Binding target of this buffer.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> BufferKind {
        self.kind
    }

    /// Number of capacity reallocations performed so far.
    #[inline]
    #[must_use]
    pub const fn reallocations(&self) -> u32 {
        self.reallocations
    }

    /// Number of trailing elements not yet flushed to the GPU.
    #[inline]
    #[must_use]
    pub fn pending_elements(&self) -> usize {
        self.data.len() - self.flushed
    }

    /// All staged elements.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Appends elements, growing capacity if needed.
    ///
    /// On growth the new capacity is the smallest power of two that
    /// holds the new total.
    ///
    /// # Errors
    ///
    /// [`RenderError::Allocation`] if the reservation fails. The
    /// buffer's contents and counters are unchanged in that case.
    pub fn append(&mut self, items: &[T]) -> Result<usize, RenderError> {
        if items.is_empty() {
            return Ok(0);
        }
        let new_total = self.data.len() + items.len();
        if new_total > self.capacity {
            self.reserve_exact(new_total.next_power_of_two())?;
        }
        self.data.extend_from_slice(items);
        Ok(items.len())
    }

    /// Drops elements past `len`, keeping the reserved capacity.
    /// A no-op when the buffer is already that short.
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
        self.flushed = self.flushed.min(self.data.len());
    }

    /// Grows the reserved capacity to exactly `new_capacity` elements.
    fn reserve_exact(&mut self, new_capacity: usize) -> Result<(), RenderError> {
        debug_assert!(new_capacity > self.capacity);
        self.data
            .try_reserve_exact(new_capacity - self.data.len())
            .map_err(|_| RenderError::Allocation {
                requested_elements: new_capacity,
            })?;
        tracing::trace!(
            kind = ?self.kind,
            old_capacity = self.capacity,
            new_capacity,
            "packed buffer grew"
        );
        self.capacity = new_capacity;
        self.reallocations += 1;
        Ok(())
    }

    /// A non-owning view of `count` elements starting at `first`.
    ///
    /// # Panics
    ///
    /// If the range reaches past the staged contents.
    #[must_use]
    pub fn region(&self, first: usize, count: usize) -> BufferRegion {
        assert!(
            first + count <= self.data.len(),
            "region {first}..{} out of range (len {})",
            first + count,
            self.data.len()
        );
        BufferRegion::new(first, count, Self::stride())
    }

    /// A view covering every staged element.
    #[must_use]
    pub fn full_region(&self) -> BufferRegion {
        BufferRegion::new(0, self.data.len(), Self::stride())
    }

    /// Creates or replaces the GPU mirror so it covers the reserved
    /// capacity. Replacing the allocation re-marks all contents as
    /// pending.
    pub fn ensure_gpu(&mut self, device: &wgpu::Device) {
        if self.capacity == 0 || self.gpu_capacity >= self.capacity {
            return;
        }
        let size = (self.capacity * Self::stride()) as u64;
        tracing::debug!(kind = ?self.kind, size, "allocating gpu buffer");
        self.gpu = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(self.kind.label()),
            size,
            usage: self.kind.usages(),
            mapped_at_creation: false,
        }));
        self.gpu_capacity = self.capacity;
        self.flushed = 0;
    }

    /// Uploads the unflushed tail. Returns the number of bytes written.
    ///
    /// # Panics
    ///
    /// If elements are pending but [`ensure_gpu`](Self::ensure_gpu)
    /// was never called.
    pub fn flush(&mut self, queue: &wgpu::Queue) -> u64 {
        if self.flushed == self.data.len() {
            return 0;
        }
        let gpu = self
            .gpu
            .as_ref()
            .expect("flush called before ensure_gpu allocated the buffer");
        let tail = &self.data[self.flushed..];
        let offset = (self.flushed * Self::stride()) as u64;
        queue.write_buffer(gpu, offset, bytemuck::cast_slice(tail));
        self.flushed = self.data.len();
        (tail.len() * Self::stride()) as u64
    }

    /// The GPU mirror, for bind/draw recording.
    ///
    /// # Panics
    ///
    /// If the buffer was never uploaded - binding a buffer that holds
    /// no data is a programming error, not a renderable state.
    #[must_use]
    pub fn raw(&self) -> &wgpu::Buffer {
        self.gpu
            .as_ref()
            .expect("gpu buffer not allocated; call ensure_gpu before recording")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_reports_count_and_preserves_contents() {
        let mut buffer: PackedBuffer<[f32; 3]> = PackedBuffer::new(BufferKind::Vertex);
        assert_eq!(buffer.append(&[[1.0, 2.0, 3.0]]).unwrap(), 1);
        assert_eq!(buffer.append(&[[4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]).unwrap(), 2);

        // Contents survive any number of intervening growths.
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.as_slice()[0], [1.0, 2.0, 3.0]);
        assert_eq!(buffer.as_slice()[2], [7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_growth_is_power_of_two_and_counted() {
        let mut buffer: PackedBuffer<u32> = PackedBuffer::new(BufferKind::Index);

        // First append allocates.
        buffer.append(&[1, 2, 3]).unwrap();
        assert_eq!(buffer.capacity(), 4);
        assert_eq!(buffer.reallocations(), 1);

        // Fits in the reserve - no reallocation.
        buffer.append(&[4]).unwrap();
        assert_eq!(buffer.capacity(), 4);
        assert_eq!(buffer.reallocations(), 1);

        // One past the reserve - exactly one reallocation.
        buffer.append(&[5]).unwrap();
        assert_eq!(buffer.capacity(), 8);
        assert_eq!(buffer.reallocations(), 2);
        assert_eq!(buffer.as_slice(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_empty_append_is_a_noop() {
        let mut buffer: PackedBuffer<u16> = PackedBuffer::new(BufferKind::Index);
        assert_eq!(buffer.append(&[]).unwrap(), 0);
        assert_eq!(buffer.capacity(), 0);
        assert_eq!(buffer.reallocations(), 0);
    }

    #[test]
    fn test_with_capacity_reserves_without_elements() {
        let buffer: PackedBuffer<u32> =
            PackedBuffer::with_capacity(BufferKind::Vertex, 64).unwrap();
        assert_eq!(buffer.capacity(), 64);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_pending_tail_tracking() {
        let mut buffer: PackedBuffer<u32> = PackedBuffer::new(BufferKind::Instance);
        buffer.append(&[1, 2]).unwrap();
        assert_eq!(buffer.pending_elements(), 2);
    }

    #[test]
    fn test_region_views() {
        let mut buffer: PackedBuffer<u16> = PackedBuffer::new(BufferKind::Index);
        buffer.append(&[0, 1, 2, 3, 4, 5]).unwrap();

        let region = buffer.region(2, 3);
        assert_eq!(region.byte_range(), 4..10);
        assert_eq!(buffer.full_region().count(), 6);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_region_past_contents_panics() {
        let mut buffer: PackedBuffer<u16> = PackedBuffer::new(BufferKind::Index);
        buffer.append(&[0, 1]).unwrap();
        let _ = buffer.region(1, 2);
    }
}
