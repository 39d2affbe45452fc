//! The multi-mesh instanced batch.

use bytemuck::Pod;

use crate::buffer::{BufferRegion, PackedBuffer};
use crate::error::RenderError;

use super::arena::InstanceArena;
use super::draw::{DrawIndexedArgs, FrameData};
use super::stats::BatchStats;
use super::submesh::{IndexElement, SubMesh};
use super::InstanceSchema;

/// Draws many sub-meshes from one shared vertex/index buffer pair,
/// one indexed instanced draw per sub-mesh.
///
/// Geometry is fixed at construction (see
/// [`MeshPacker`](super::MeshPacker)); instances accumulate per
/// sub-mesh into a shared arena and are selected at draw time through
/// the `first_instance` offset, so no per-mesh buffer rebinding
/// happens between draws.
pub struct MultiBatch<V: Pod, I: IndexElement> {
    vertices: PackedBuffer<V>,
    indices: PackedBuffer<I>,
    submeshes: Vec<SubMesh>,
    schema: InstanceSchema,
    arena: InstanceArena,
    stats: BatchStats,
}

impl<V: Pod, I: IndexElement> MultiBatch<V, I> {
    /// Assembles a batch from packed geometry and a schema. Used by
    /// [`MeshPacker::into_batch`](super::MeshPacker::into_batch).
    pub(crate) fn from_parts(
        vertices: PackedBuffer<V>,
        indices: PackedBuffer<I>,
        submeshes: Vec<SubMesh>,
        schema: InstanceSchema,
    ) -> Self {
        let arena = InstanceArena::new(schema.stride(), submeshes.len());
        Self {
            vertices,
            indices,
            submeshes,
            schema,
            arena,
            stats: BatchStats::default(),
        }
    }

    /// Number of packed sub-meshes.
    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.submeshes.len()
    }

    /// Total instances pushed across all sub-meshes.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.arena.instance_count()
    }

    /// Total instance capacity currently reserved across all
    /// sub-meshes.
    #[must_use]
    pub fn instance_capacity(&self) -> usize {
        self.arena.total_capacity()
    }

    /// Descriptor of one sub-mesh.
    ///
    /// # Panics
    ///
    /// If `mesh` is out of range.
    #[must_use]
    pub fn submesh(&self, mesh: usize) -> SubMesh {
        self.submeshes[mesh]
    }

    /// The index region of one sub-mesh within the shared buffer.
    ///
    /// # Panics
    ///
    /// If `mesh` is out of range.
    #[must_use]
    pub fn index_region(&self, mesh: usize) -> BufferRegion {
        let sub = self.submeshes[mesh];
        self.indices
            .region(sub.base_index as usize, sub.index_count as usize)
    }

    /// The instance region of one sub-mesh within the shared arena.
    ///
    /// # Panics
    ///
    /// If `mesh` is out of range.
    #[must_use]
    pub fn instance_region(&self, mesh: usize) -> BufferRegion {
        assert!(mesh < self.submeshes.len(), "mesh {mesh} out of range");
        self.arena.region_view(mesh)
    }

    /// Stats captured by the most recent
    /// [`prepare_frame`](Self::prepare_frame).
    #[must_use]
    pub const fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Assigns shader locations to the instance schema.
    ///
    /// # Errors
    ///
    /// [`RenderError::AttribLocationCount`] on a count mismatch.
    pub fn set_attrib_locations(&mut self, locations: &[u32]) -> Result<(), RenderError> {
        self.schema.assign_locations(locations)
    }

    /// The per-instance vertex buffer layout for pipeline creation.
    ///
    /// # Panics
    ///
    /// If locations were never assigned.
    #[must_use]
    pub fn instance_vertex_layout(&self) -> wgpu::VertexBufferLayout<'_> {
        self.schema.vertex_layout()
    }

    /// Appends one instance record to a sub-mesh.
    ///
    /// `Rec` must match the schema's stride; the field layout is the
    /// caller's contract with the shader.
    ///
    /// # Errors
    ///
    /// [`RenderError::MeshIndexOutOfRange`] for an unknown sub-mesh,
    /// [`RenderError::InstanceSizeMismatch`] when `Rec` does not match
    /// the schema stride, [`RenderError::Allocation`] when growth
    /// fails. The batch is unchanged on every error.
    pub fn push_instance<Rec: Pod>(&mut self, mesh: usize, record: &Rec) -> Result<(), RenderError> {
        if mesh >= self.submeshes.len() {
            return Err(RenderError::MeshIndexOutOfRange {
                index: mesh,
                count: self.submeshes.len(),
            });
        }
        let expected = self.schema.stride();
        let actual = std::mem::size_of::<Rec>();
        if actual != expected {
            return Err(RenderError::InstanceSizeMismatch { expected, actual });
        }
        self.arena.push(mesh, bytemuck::bytes_of(record))
    }

    /// Computes this frame's upload spans and draw list without
    /// touching the GPU. Planning is read-only: repeated calls with
    /// no intervening pushes yield identical plans, and records
    /// pending at planning time are still pending for
    /// [`flush`](Self::flush). Upload spans empty out only once a
    /// flush performs them.
    pub fn prepare_frame(&mut self) -> FrameData<'_> {
        let uploads = self.arena.pending_spans();
        let draws: Vec<DrawIndexedArgs> = self.draws().collect();

        let stats = BatchStats {
            draw_calls: draws.len() as u32,
            instances: self.arena.instance_count() as u32,
            bytes_uploaded: uploads.iter().map(|span| span.len as u64).sum(),
            repacks: self.arena.repacks(),
        };
        self.stats = stats;

        FrameData {
            instance_bytes: self.arena.bytes(),
            uploads,
            draws,
            stats,
        }
    }

    /// One draw per sub-mesh that has at least one instance, in
    /// sub-mesh index order.
    pub fn draws(&self) -> impl Iterator<Item = DrawIndexedArgs> + '_ {
        self.submeshes
            .iter()
            .enumerate()
            .filter_map(move |(mesh, sub)| {
                let region = self.arena.region_view(mesh);
                if region.is_empty() {
                    return None;
                }
                Some(DrawIndexedArgs {
                    index_count: sub.index_count,
                    instance_count: region.count() as u32,
                    first_index: sub.base_index,
                    base_vertex: sub.base_vertex,
                    first_instance: region.first() as u32,
                })
            })
    }

    /// Allocates GPU mirrors as needed and uploads every pending
    /// tail. Call once per frame before [`record`](Self::record).
    pub fn flush(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        self.vertices.ensure_gpu(device);
        self.indices.ensure_gpu(device);
        self.arena.ensure_gpu(device);

        let mut uploaded = self.vertices.flush(queue);
        uploaded += self.indices.flush(queue);

        let spans = self.arena.flush_plan();
        if !spans.is_empty() {
            let gpu = self.arena.raw();
            let bytes = self.arena.bytes();
            for span in &spans {
                queue.write_buffer(gpu, span.gpu_offset(), &bytes[span.range()]);
                uploaded += span.len as u64;
            }
        }
        if uploaded > 0 {
            tracing::trace!(bytes = uploaded, "batch flushed");
        }
    }

    /// Records the bind-once-draw-many sequence into a render pass.
    /// A no-op when no sub-mesh has instances.
    ///
    /// # Panics
    ///
    /// If shader locations were never assigned, or if
    /// [`flush`](Self::flush) never allocated the GPU buffers.
    pub fn record<'pass>(&'pass self, pass: &mut wgpu::RenderPass<'pass>) {
        assert!(
            self.schema.locations_assigned(),
            "recording a batch whose schema has no shader locations"
        );
        if self.arena.instance_count() == 0 {
            return;
        }

        pass.set_vertex_buffer(0, self.vertices.raw().slice(..));
        pass.set_vertex_buffer(1, self.arena.raw().slice(..));
        pass.set_index_buffer(self.indices.raw().slice(..), I::FORMAT);
        for args in self.draws() {
            pass.draw_indexed(args.index_range(), args.base_vertex, args.instance_range());
        }
    }
}
