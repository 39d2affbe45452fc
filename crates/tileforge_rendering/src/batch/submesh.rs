//! Sub-mesh descriptors and the mesh packing builder.

use bytemuck::Pod;

use crate::buffer::{BufferKind, PackedBuffer};
use crate::error::RenderError;

use super::{InstanceSchema, MultiBatch};

/// Index element types usable in a shared index buffer.
pub trait IndexElement: Pod {
    /// The matching GPU index format.
    const FORMAT: wgpu::IndexFormat;
}

impl IndexElement for u16 {
    const FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint16;
}

impl IndexElement for u32 {
    const FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint32;
}

/// Where one sub-mesh's geometry lives within the shared buffers.
///
/// Created once when the mesh is packed; immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubMesh {
    /// Number of indices in the sub-mesh.
    pub index_count: u32,
    /// Value added to every index before vertex lookup - the offset
    /// of the sub-mesh's first vertex in the shared vertex buffer.
    pub base_vertex: i32,
    /// Offset of the sub-mesh's first index in the shared index
    /// buffer.
    pub base_index: u32,
}

/// Packs several meshes back to back into one vertex/index buffer
/// pair, accumulating the sub-mesh descriptors itself.
///
/// Callers hand over one mesh at a time and never see - let alone
/// recompute - a cumulative offset. Consuming the packer yields a
/// [`MultiBatch`] that owns the shared buffers.
pub struct MeshPacker<V: Pod, I: IndexElement> {
    vertices: PackedBuffer<V>,
    indices: PackedBuffer<I>,
    submeshes: Vec<SubMesh>,
}

impl<V: Pod, I: IndexElement> MeshPacker<V, I> {
    /// Creates an empty packer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: PackedBuffer::new(BufferKind::Vertex),
            indices: PackedBuffer::new(BufferKind::Index),
            submeshes: Vec::new(),
        }
    }

    /// Appends one mesh's streams and records its descriptor.
    /// Returns the sub-mesh index used for instance pushes later.
    ///
    /// The append is atomic: on failure neither buffer keeps partial
    /// data from this mesh.
    ///
    /// # Errors
    ///
    /// [`RenderError::Allocation`] if a buffer reservation fails.
    pub fn add_mesh(&mut self, vertices: &[V], indices: &[I]) -> Result<usize, RenderError> {
        let base_vertex = self.vertices.len();
        let base_index = self.indices.len();

        self.vertices.append(vertices)?;
        if let Err(err) = self.indices.append(indices) {
            // Roll back the vertex append so the packer stays
            // consistent with the recorded descriptors.
            self.vertices.truncate(base_vertex);
            return Err(err);
        }

        self.submeshes.push(SubMesh {
            index_count: indices.len() as u32,
            base_vertex: base_vertex as i32,
            base_index: base_index as u32,
        });
        tracing::debug!(
            mesh = self.submeshes.len() - 1,
            vertices = vertices.len(),
            indices = indices.len(),
            base_vertex,
            base_index,
            "packed mesh"
        );
        Ok(self.submeshes.len() - 1)
    }

    /// Number of meshes packed so far.
    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.submeshes.len()
    }

    /// Total vertices packed so far.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Total indices packed so far.
    #[must_use]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// The recorded sub-mesh descriptors.
    #[must_use]
    pub fn submeshes(&self) -> &[SubMesh] {
        &self.submeshes
    }

    /// Consumes the packer into a batch with the given instance
    /// schema. Every sub-mesh starts with an empty instance region.
    #[must_use]
    pub fn into_batch(self, schema: InstanceSchema) -> MultiBatch<V, I> {
        MultiBatch::from_parts(self.vertices, self.indices, self.submeshes, schema)
    }
}

impl<V: Pod, I: IndexElement> Default for MeshPacker<V, I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_accumulate_across_meshes() {
        let mut packer: MeshPacker<[f32; 3], u16> = MeshPacker::new();

        let m0 = packer.add_mesh(&[[0.0; 3]; 4], &[0, 1, 2, 2, 1, 3]).unwrap();
        let m1 = packer.add_mesh(&[[1.0; 3]; 3], &[0, 1, 2]).unwrap();
        let m2 = packer.add_mesh(&[[2.0; 3]; 5], &[0, 1, 2, 3, 4, 0, 1, 2, 3]).unwrap();
        assert_eq!((m0, m1, m2), (0, 1, 2));

        let subs = packer.submeshes();
        assert_eq!(subs[0], SubMesh { index_count: 6, base_vertex: 0, base_index: 0 });
        assert_eq!(subs[1], SubMesh { index_count: 3, base_vertex: 4, base_index: 6 });
        assert_eq!(subs[2], SubMesh { index_count: 9, base_vertex: 7, base_index: 9 });

        assert_eq!(packer.vertex_count(), 12);
        assert_eq!(packer.index_count(), 18);
    }
}
