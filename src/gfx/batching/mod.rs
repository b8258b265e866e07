//! # Static Geometry Batching
//!
//! This module merges many small, individually-authored mesh fragments
//! into a small number of large, material-grouped vertex/index buffers,
//! plus a parallel position-only pair for a collision backend.
//!
//! The pieces:
//!
//! - [`StaticGeometryBatcher`] - accumulates fragments per material key,
//!   applying transforms and rebasing indices, and governs the
//!   open/sealed lifecycle
//! - [`CombinedBuffers`] - the flattened, GPU-ready output with per-key
//!   draw ranges
//! - [`PhysicsMesh`] - the ungrouped collision-mesh view, extracted at
//!   seal time
//!
//! ## Usage
//!
//! ```no_run
//! use cgmath::{Matrix4, SquareMatrix};
//! use drystane::gfx::batching::StaticGeometryBatcher;
//! use drystane::gfx::geometry::generate_cube;
//!
//! let cube = generate_cube();
//! let mut batcher = StaticGeometryBatcher::new();
//! batcher
//!     .add(7, &cube.to_vertices(), &cube.indices, &Matrix4::identity())
//!     .unwrap();
//! batcher.combine();
//! // batcher.upload(&device)?; then draw each range in
//! // batcher.combined().unwrap().batches()
//! batcher.seal();
//! let collision = batcher.physics_mesh().unwrap();
//! # let _ = collision;
//! ```

pub mod batcher;
pub mod buffers;
pub mod physics;

pub use batcher::{BatcherStatistics, MaterialKey, StaticGeometryBatcher, WorkingBatch};
pub use buffers::{CombinedBuffers, StaticBatch};
pub use physics::PhysicsMesh;
