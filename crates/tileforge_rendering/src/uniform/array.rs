//! Slot arrays of std140 records with scoped write mapping.

use bytemuck::Pod;

use super::align_std140;

/// An array of fixed-size constant records in one GPU allocation.
///
/// The record stride is rounded up to the std140 base alignment at
/// construction and never changes. Writes go through a scoped
/// [`UniformMapping`]: the guard borrows the staging bytes mutably, so
/// the borrow checker enforces that nothing else touches the array
/// while it is mapped, and dropping the guard is the unmap. The whole
/// array is exposed as a single binding so shaders can select any slot
/// by index.
pub struct UniformArray<R: Pod> {
    /// Staging words. 16-byte words keep every slot boundary aligned
    /// for typed access into the byte view.
    words: Vec<u128>,
    /// Number of records.
    slots: usize,
    /// Byte stride of one record (std140-rounded).
    stride: usize,
    /// Staging has writes the GPU has not seen yet.
    dirty: bool,
    /// Lazily created GPU mirror.
    gpu: Option<wgpu::Buffer>,
    /// Marker for the record type.
    _record: std::marker::PhantomData<R>,
}

impl<R: Pod> UniformArray<R> {
    /// Creates an array of `slots` zero-filled records.
    ///
    /// Padding bytes between a record's end and the next stride
    /// boundary start at zero and are never written afterwards.
    ///
    /// # Panics
    ///
    /// If `slots` is zero or the record type is empty or over-aligned
    /// (alignment above 16 cannot be honored by the std140 rule).
    #[must_use]
    pub fn new(slots: usize) -> Self {
        assert!(slots > 0, "uniform array needs at least one slot");
        assert!(std::mem::size_of::<R>() > 0, "uniform record must not be empty");
        assert!(
            std::mem::align_of::<R>() <= super::STD140_ALIGN,
            "uniform record alignment exceeds the std140 base alignment"
        );
        let stride = align_std140(std::mem::size_of::<R>());
        Self {
            words: vec![0u128; slots * stride / 16],
            slots,
            stride,
            dirty: true,
            gpu: None,
            _record: std::marker::PhantomData,
        }
    }

    /// Number of record slots.
    #[inline]
    #[must_use]
    pub const fn slot_count(&self) -> usize {
        self.slots
    }

    /// Byte stride of one record.
    #[inline]
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Total byte length of the array.
    #[inline]
    #[must_use]
    pub const fn byte_len(&self) -> u64 {
        (self.slots * self.stride) as u64
    }

    /// The staging bytes, record strides and padding included.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words)
    }

    /// Reads one record.
    ///
    /// # Panics
    ///
    /// If `slot` is out of range.
    #[must_use]
    pub fn slot(&self, slot: usize) -> &R {
        assert!(slot < self.slots, "slot {slot} out of range ({})", self.slots);
        let start = slot * self.stride;
        bytemuck::from_bytes(&self.as_bytes()[start..start + std::mem::size_of::<R>()])
    }

    /// Maps the array for writing.
    ///
    /// The guard is the mapping: record writes go through it, and
    /// dropping it unmaps and marks the staging dirty for the next
    /// [`flush`](Self::flush).
    pub fn map_write(&mut self) -> UniformMapping<'_, R> {
        UniformMapping { array: self }
    }

    /// Creates the GPU mirror if it does not exist yet.
    pub fn ensure_gpu(&mut self, device: &wgpu::Device) {
        if self.gpu.is_some() {
            return;
        }
        self.gpu = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tileforge uniform array"),
            size: self.byte_len(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.dirty = true;
    }

    /// Uploads the staging bytes if they changed since the last flush.
    /// Returns the number of bytes written.
    ///
    /// # Panics
    ///
    /// If the staging is dirty but [`ensure_gpu`](Self::ensure_gpu)
    /// was never called.
    pub fn flush(&mut self, queue: &wgpu::Queue) -> u64 {
        if !self.dirty {
            return 0;
        }
        let gpu = self
            .gpu
            .as_ref()
            .expect("flush called before ensure_gpu allocated the uniform buffer");
        queue.write_buffer(gpu, 0, self.as_bytes());
        self.dirty = false;
        self.byte_len()
    }

    /// The whole array as one bind-group resource.
    ///
    /// # Panics
    ///
    /// If the GPU mirror was never created.
    #[must_use]
    pub fn binding(&self) -> wgpu::BindingResource<'_> {
        self.gpu
            .as_ref()
            .expect("uniform buffer not allocated; call ensure_gpu before binding")
            .as_entire_binding()
    }
}

/// Scoped write mapping of a [`UniformArray`].
///
/// Exists only between map and unmap; the mutable borrow it holds
/// keeps every other operation on the array out of the window.
pub struct UniformMapping<'a, R: Pod> {
    array: &'a mut UniformArray<R>,
}

impl<R: Pod> UniformMapping<'_, R> {
    /// A mutable reference to one record.
    ///
    /// Named struct fields replace per-field accessors: the caller
    /// writes `mapping.slot_mut(i).view = ...`.
    ///
    /// # Panics
    ///
    /// If `slot` is out of range.
    pub fn slot_mut(&mut self, slot: usize) -> &mut R {
        assert!(
            slot < self.array.slots,
            "slot {slot} out of range ({})",
            self.array.slots
        );
        let start = slot * self.array.stride;
        let size = std::mem::size_of::<R>();
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut self.array.words);
        bytemuck::from_bytes_mut(&mut bytes[start..start + size])
    }
}

impl<R: Pod> Drop for UniformMapping<'_, R> {
    fn drop(&mut self) {
        // Unmap: the next flush re-uploads the staging.
        self.array.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_is_std140_rounded() {
        // vec3 pads to 16 bytes.
        let array: UniformArray<[f32; 3]> = UniformArray::new(4);
        assert_eq!(array.stride(), 16);
        assert_eq!(array.byte_len(), 64);

        // mat4 is already a multiple of 16.
        let array: UniformArray<[[f32; 4]; 4]> = UniformArray::new(2);
        assert_eq!(array.stride(), 64);
        assert_eq!(array.byte_len(), 128);
    }

    #[test]
    fn test_write_then_read_round_trips() {
        let mut array: UniformArray<[[f32; 4]; 4]> = UniformArray::new(2);
        let mat = [[1.0; 4], [2.0; 4], [3.0; 4], [4.0; 4]];
        {
            let mut mapping = array.map_write();
            *mapping.slot_mut(1) = mat;
        }
        assert_eq!(*array.slot(1), mat);
    }

    #[test]
    fn test_writes_do_not_leak_into_other_slots_or_padding() {
        let mut array: UniformArray<[f32; 3]> = UniformArray::new(3);
        {
            let mut mapping = array.map_write();
            *mapping.slot_mut(0) = [1.0, 2.0, 3.0];
        }
        {
            let mut mapping = array.map_write();
            *mapping.slot_mut(1) = [9.0, 9.0, 9.0];
        }

        // Slot 0 is unchanged by the write to slot 1.
        assert_eq!(*array.slot(0), [1.0, 2.0, 3.0]);
        assert_eq!(*array.slot(2), [0.0, 0.0, 0.0]);

        // Padding bytes (12..16 of every stride) stay zero.
        let bytes = array.as_bytes();
        for slot in 0..3 {
            assert_eq!(&bytes[slot * 16 + 12..slot * 16 + 16], &[0u8; 4]);
        }
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_slot_panics() {
        let array: UniformArray<[f32; 4]> = UniformArray::new(2);
        let _ = array.slot(2);
    }
}
