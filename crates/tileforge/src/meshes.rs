//! Procedural tile meshes for the demo scene.
//!
//! Three tile variants share every batch in the client: a dented tile
//! with a sunken center, a spike tile with a raised center, and a big
//! flat tile. Each is a subdivided square plate with per-vertex
//! normals so the flat shading reads under the orbit camera.

use bytemuck::{Pod, Zeroable};

/// One vertex of a tile mesh.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TileVertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Unit surface normal.
    pub normal: [f32; 3],
    /// Base surface shade, multiplied by the instance tint.
    pub shade: [f32; 3],
}

impl TileVertex {
    /// Per-vertex buffer layout. Locations 0..=1 and 7; the block in
    /// between belongs to the per-instance attributes.
    #[must_use]
    pub const fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 12,
                shader_location: 1,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 24,
                shader_location: 7,
            },
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// A tile mesh ready for packing.
pub struct TileMesh {
    /// Vertex stream.
    pub vertices: Vec<TileVertex>,
    /// Triangle-list index stream.
    pub indices: Vec<u16>,
}

/// Grid resolution of the small tiles (quads per side).
const TILE_DIVISIONS: usize = 8;

/// A 2x2 tile whose center dips down.
#[must_use]
pub fn dented_tile() -> TileMesh {
    heightfield_tile(1.0, TILE_DIVISIONS, |r| -0.5 * bump(r))
}

/// A 2x2 tile whose center spikes up.
#[must_use]
pub fn spike_tile() -> TileMesh {
    heightfield_tile(1.0, TILE_DIVISIONS, |r| 0.9 * bump(r * 1.5))
}

/// A 6x6 flat tile.
#[must_use]
pub fn big_tile() -> TileMesh {
    heightfield_tile(3.0, TILE_DIVISIONS, |_| 0.0)
}

/// Smooth radial falloff, 1 at the center, 0 from radius 1 outwards.
fn bump(r: f32) -> f32 {
    let t = (1.0 - r).max(0.0);
    t * t * (3.0 - 2.0 * t)
}

/// Builds a square plate of `divisions`^2 quads spanning
/// `-half..=half` on X and Z, with Y from `height(radius)` where
/// `radius` is the normalized distance from the plate center.
fn heightfield_tile(half: f32, divisions: usize, height: impl Fn(f32) -> f32) -> TileMesh {
    let side = divisions + 1;
    let mut vertices = Vec::with_capacity(side * side);
    let mut indices = Vec::with_capacity(divisions * divisions * 6);

    let sample = |ix: usize, iz: usize| {
        let x = -half + 2.0 * half * (ix as f32 / divisions as f32);
        let z = -half + 2.0 * half * (iz as f32 / divisions as f32);
        let r = (x * x + z * z).sqrt() / half;
        [x, height(r), z]
    };

    for iz in 0..side {
        for ix in 0..side {
            let position = sample(ix, iz);

            // Central differences over neighbouring samples.
            let left = sample(ix.saturating_sub(1), iz);
            let right = sample((ix + 1).min(divisions), iz);
            let near = sample(ix, iz.saturating_sub(1));
            let far = sample(ix, (iz + 1).min(divisions));
            let dx = [right[0] - left[0], right[1] - left[1], right[2] - left[2]];
            let dz = [far[0] - near[0], far[1] - near[1], far[2] - near[2]];
            let normal = normalize(cross(dz, dx));

            // Slightly darker towards the rim.
            let r = (position[0] * position[0] + position[2] * position[2]).sqrt() / half;
            let shade = 1.0 - 0.25 * r.min(1.0);

            vertices.push(TileVertex {
                position,
                normal,
                shade: [shade; 3],
            });
        }
    }

    for iz in 0..divisions {
        for ix in 0..divisions {
            let a = (iz * side + ix) as u16;
            let b = a + 1;
            let c = a + side as u16;
            let d = c + 1;
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }

    TileMesh { vertices, indices }
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let l = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if l < 1e-10 {
        return [0.0, 1.0, 0.0];
    }
    [v[0] / l, v[1] / l, v[2] / l]
}
