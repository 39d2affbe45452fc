//! # TILEFORGE Demo
//!
//! Scene assets for the demo client: procedural tile meshes and the
//! orbit camera. The client binary packs the meshes into one
//! [`tileforge_rendering::MultiBatch`] and draws the whole scene with
//! three indexed instanced calls.

pub mod camera;
pub mod meshes;

pub use camera::{look_at, multiply_matrices, perspective, rotate_y, translate, ViewCycle};
pub use meshes::{big_tile, dented_tile, spike_tile, TileMesh, TileVertex};
