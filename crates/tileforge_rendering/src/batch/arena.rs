//! Shared per-instance storage with one region per sub-mesh.

use crate::buffer::{BufferKind, BufferRegion};
use crate::error::RenderError;

use super::draw::UploadSpan;

/// One sub-mesh's slice of the arena, in instance records.
#[derive(Debug, Clone, Copy)]
struct Region {
    /// First record of the region within the arena.
    base: usize,
    /// Records pushed so far.
    len: usize,
    /// Records the region can hold before the arena repacks.
    capacity: usize,
    /// Records `0..flushed` (relative to `base`) are on the GPU.
    flushed: usize,
}

/// Backing store for every sub-mesh's instances, packed region by
/// region into one buffer so a single `first_instance` offset selects
/// a sub-mesh's records at draw time.
///
/// Regions grow in powers of two. Growing any region repacks the
/// whole arena, which re-marks every region as pending because region
/// bases move and the GPU allocation is replaced.
pub(crate) struct InstanceArena {
    /// Byte stride of one instance record.
    stride: usize,
    regions: Vec<Region>,
    /// Capacity-sized staging; slots past a region's `len` stay zero.
    bytes: Vec<u8>,
    /// Sum of all region capacities, in records.
    total_capacity: usize,
    /// Number of repacks performed so far.
    repacks: u32,
    gpu: Option<wgpu::Buffer>,
    /// Record capacity the GPU buffer was allocated for.
    gpu_capacity: usize,
}

impl InstanceArena {
    /// Creates an arena of `mesh_count` empty regions.
    pub(crate) fn new(stride: usize, mesh_count: usize) -> Self {
        Self {
            stride,
            regions: vec![
                Region { base: 0, len: 0, capacity: 0, flushed: 0 };
                mesh_count
            ],
            bytes: Vec::new(),
            total_capacity: 0,
            repacks: 0,
            gpu: None,
            gpu_capacity: 0,
        }
    }

    /// Total records pushed across all regions.
    pub(crate) fn instance_count(&self) -> usize {
        self.regions.iter().map(|region| region.len).sum()
    }

    /// Sum of all region capacities, in records.
    pub(crate) fn total_capacity(&self) -> usize {
        self.total_capacity
    }

    /// Number of repacks performed so far.
    pub(crate) fn repacks(&self) -> u32 {
        self.repacks
    }

    /// First record and length of one region, for draw emission.
    pub(crate) fn region_view(&self, mesh: usize) -> BufferRegion {
        let region = &self.regions[mesh];
        BufferRegion::new(region.base, region.len, self.stride)
    }

    /// The full staging store, capacity slots included.
    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Appends one record to a region, repacking on overflow.
    ///
    /// `record` must be exactly one stride long; the caller checks
    /// that before the bytes reach the arena.
    pub(crate) fn push(&mut self, mesh: usize, record: &[u8]) -> Result<(), RenderError> {
        debug_assert_eq!(record.len(), self.stride);

        if self.regions[mesh].len == self.regions[mesh].capacity {
            let grown = (self.regions[mesh].len + 1).next_power_of_two().max(1);
            self.repack(mesh, grown)?;
        }

        let region = &mut self.regions[mesh];
        let offset = (region.base + region.len) * self.stride;
        self.bytes[offset..offset + self.stride].copy_from_slice(record);
        region.len += 1;
        Ok(())
    }

    /// Rebuilds the staging store with `mesh` grown to `new_capacity`
    /// records, moving every region to its new base. All regions
    /// become fully pending.
    fn repack(&mut self, mesh: usize, new_capacity: usize) -> Result<(), RenderError> {
        let grown_total = self.total_capacity - self.regions[mesh].capacity + new_capacity;
        let mut packed: Vec<u8> = Vec::new();
        packed
            .try_reserve_exact(grown_total * self.stride)
            .map_err(|_| RenderError::Allocation {
                requested_elements: grown_total,
            })?;
        packed.resize(grown_total * self.stride, 0);

        let mut base = 0;
        for (index, region) in self.regions.iter_mut().enumerate() {
            if index == mesh {
                region.capacity = new_capacity;
            }
            let src = region.base * self.stride;
            let dst = base * self.stride;
            let used = region.len * self.stride;
            packed[dst..dst + used].copy_from_slice(&self.bytes[src..src + used]);
            region.base = base;
            region.flushed = 0;
            base += region.capacity;
        }

        tracing::trace!(
            mesh,
            new_capacity,
            total_capacity = grown_total,
            "instance arena repacked"
        );
        self.bytes = packed;
        self.total_capacity = grown_total;
        self.repacks += 1;
        Ok(())
    }

    /// Byte spans the next flush would upload, one per region with a
    /// pending tail. Read-only: planning never advances the flush
    /// marks, so any number of plans observe the same pending tails.
    pub(crate) fn pending_spans(&self) -> Vec<UploadSpan> {
        self.regions
            .iter()
            .filter(|region| region.flushed < region.len)
            .map(|region| UploadSpan {
                offset: (region.base + region.flushed) * self.stride,
                len: (region.len - region.flushed) * self.stride,
            })
            .collect()
    }

    /// Byte spans that need uploading, one per region with a pending
    /// tail. Advances the flush marks; only the frame step that
    /// actually performs the uploads may call this.
    pub(crate) fn flush_plan(&mut self) -> Vec<UploadSpan> {
        let spans = self.pending_spans();
        for region in &mut self.regions {
            region.flushed = region.len;
        }
        spans
    }

    /// Creates or replaces the GPU buffer so it covers the total
    /// capacity. Replacing it re-marks every region as pending.
    pub(crate) fn ensure_gpu(&mut self, device: &wgpu::Device) {
        if self.total_capacity == 0 || self.gpu_capacity >= self.total_capacity {
            return;
        }
        let size = (self.total_capacity * self.stride) as u64;
        tracing::debug!(size, "allocating instance arena buffer");
        self.gpu = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(BufferKind::Instance.label()),
            size,
            usage: BufferKind::Instance.usages(),
            mapped_at_creation: false,
        }));
        self.gpu_capacity = self.total_capacity;
        for region in &mut self.regions {
            region.flushed = 0;
        }
    }

    /// The GPU buffer, for bind recording.
    ///
    /// # Panics
    ///
    /// If the arena was never uploaded.
    pub(crate) fn raw(&self) -> &wgpu::Buffer {
        self.gpu
            .as_ref()
            .expect("instance arena not allocated; call ensure_gpu before recording")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRIDE: usize = 4;

    fn record(value: u8) -> [u8; STRIDE] {
        [value, value, value, value]
    }

    #[test]
    fn test_regions_pack_back_to_back() {
        let mut arena = InstanceArena::new(STRIDE, 3);
        arena.push(0, &record(10)).unwrap();
        arena.push(1, &record(20)).unwrap();
        arena.push(1, &record(21)).unwrap();
        arena.push(2, &record(30)).unwrap();

        let r0 = arena.region_view(0);
        let r1 = arena.region_view(1);
        let r2 = arena.region_view(2);
        assert_eq!((r0.first(), r0.count()), (0, 1));
        assert_eq!((r1.first(), r1.count()), (1, 2));
        // Region 1 grew to capacity 2, so region 2 starts after it.
        assert_eq!((r2.first(), r2.count()), (3, 1));
        assert_eq!(arena.instance_count(), 4);

        let bytes = arena.bytes();
        assert_eq!(&bytes[0..4], &record(10));
        assert_eq!(&bytes[4..8], &record(20));
        assert_eq!(&bytes[8..12], &record(21));
        assert_eq!(&bytes[12..16], &record(30));
    }

    #[test]
    fn test_growth_repacks_and_preserves_records() {
        let mut arena = InstanceArena::new(STRIDE, 2);
        arena.push(0, &record(1)).unwrap();
        arena.push(1, &record(9)).unwrap();
        let before = arena.repacks();

        // Region 0 is full at capacity 1; the next push doubles it
        // and shifts region 1.
        arena.push(0, &record(2)).unwrap();
        assert_eq!(arena.repacks(), before + 1);

        let r1 = arena.region_view(1);
        assert_eq!((r1.first(), r1.count()), (2, 1));
        assert_eq!(&arena.bytes()[8..12], &record(9));
    }

    #[test]
    fn test_pending_spans_never_consume() {
        let mut arena = InstanceArena::new(STRIDE, 2);
        arena.push(0, &record(1)).unwrap();
        arena.push(1, &record(2)).unwrap();

        // Planning twice sees the same pending tails both times.
        let first = arena.pending_spans();
        assert_eq!(arena.pending_spans(), first);
        assert_eq!(first.len(), 2);

        // Only the flush consumes them.
        assert_eq!(arena.flush_plan(), first);
        assert!(arena.pending_spans().is_empty());
    }

    #[test]
    fn test_flush_plan_covers_tails_then_drains() {
        let mut arena = InstanceArena::new(STRIDE, 2);
        arena.push(0, &record(1)).unwrap();
        arena.push(1, &record(2)).unwrap();

        let spans = arena.flush_plan();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].range(), 0..4);
        assert_eq!(spans[1].range(), 4..8);

        // Nothing new pushed, nothing to upload.
        assert!(arena.flush_plan().is_empty());

        arena.push(1, &record(3)).unwrap();
        // Region 1 grew, so the repack re-marked both regions.
        let spans = arena.flush_plan();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].len, 4);
        assert_eq!(spans[1].len, 8);
    }

    #[test]
    fn test_empty_arena_has_no_work() {
        let mut arena = InstanceArena::new(STRIDE, 3);
        assert_eq!(arena.instance_count(), 0);
        assert_eq!(arena.total_capacity(), 0);
        assert!(arena.flush_plan().is_empty());
    }
}
