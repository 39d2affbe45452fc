//! Multi-mesh instanced batching.
//!
//! A batch packs several meshes into one vertex/index buffer pair and
//! draws each with a single indexed instanced call, offset into a
//! shared instance buffer. The CPU side (packing, instance
//! accumulation, draw emission) is fully observable without a GPU;
//! [`MultiBatch::flush`] and [`MultiBatch::record`] are the only
//! device-touching steps.

mod arena;
mod draw;
mod multi;
mod schema;
mod stats;
mod submesh;

pub use draw::{DrawIndexedArgs, FrameData, UploadSpan};
pub use multi::MultiBatch;
pub use schema::{AttributeFormat, InstanceSchema};
pub use stats::BatchStats;
pub use submesh::{IndexElement, MeshPacker, SubMesh};
