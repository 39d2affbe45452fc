//! # TILEFORGE Rendering Core
//!
//! Buffer packing and multi-mesh instanced batching designed for:
//! - Many mesh kinds, many instances, minimal draw calls
//! - One vertex/index buffer pair shared by every mesh in a batch
//! - CPU staging as the source of truth - headless-testable planning
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    BATCH PIPELINE                        │
//! ├──────────────────────────────────────────────────────────┤
//! │  Meshes → MeshPacker → shared vertex + index buffers     │
//! │     ↓                          ↓                         │
//! │  push_instance → instance arena (regions, tail flush)    │
//! │     ↓                          ↓                         │
//! │  prepare_frame → upload spans + draw list → record       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ARCHITECT'S MANDATE
//!
//! - Bind once, draw many: one buffer rebind per batch, not per mesh
//! - Appends are amortized O(1); growth is power-of-two
//! - Uploads move only unflushed tails, never resident data

pub mod batch;
pub mod buffer;
pub mod error;
pub mod uniform;

pub use batch::{
    AttributeFormat, BatchStats, DrawIndexedArgs, FrameData, IndexElement, InstanceSchema,
    MeshPacker, MultiBatch, SubMesh, UploadSpan,
};
pub use buffer::{BufferKind, BufferRegion, PackedBuffer};
pub use error::RenderError;
pub use uniform::{align_std140, UniformArray, UniformMapping, STD140_ALIGN};
