// src/lib.rs
//! Drystane static geometry batching
//!
//! A batching engine built on wgpu that merges many small mesh fragments
//! into a few large, material-grouped vertex/index buffers, plus a
//! parallel position-only pair for collision-mesh construction.

pub mod error;
pub mod gfx;

// Re-export main types for convenience
pub use error::BatchError;
pub use gfx::batching::{
    CombinedBuffers, MaterialKey, PhysicsMesh, StaticBatch, StaticGeometryBatcher,
};
pub use gfx::model::{ModelData, SubMesh};
pub use gfx::vertex::StaticVertex;
