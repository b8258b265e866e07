//! # Graphics Module
//!
//! This module contains the geometry-facing functionality of the
//! drystane batching engine: the shared vertex format, model input
//! shapes, procedural fragment sources, and the batching core itself.
//!
//! ## Architecture Overview
//!
//! - **Batching** ([`batching`]) - per-material accumulation, flattening
//!   into combined GPU buffers, and collision-mesh extraction
//! - **Vertex Format** ([`vertex`]) - the fixed POD vertex layout shared
//!   by fragments and combined buffers
//! - **Model Inputs** ([`model`]) - decoded model/submesh shapes
//! - **Geometry** ([`geometry`]) - procedural fragment sources
//!
//! ## Usage
//!
//! The batching system is primarily used through the
//! [`StaticGeometryBatcher`] type:
//!
//! ```no_run
//! use drystane::gfx::batching::StaticGeometryBatcher;
//!
//! let mut batcher = StaticGeometryBatcher::new();
//! // batcher.add(...); batcher.emit(&device);
//! batcher.combine();
//! batcher.seal();
//! ```
//!
//! [`StaticGeometryBatcher`]: batching::StaticGeometryBatcher

pub mod batching;
pub mod geometry;
pub mod model;
pub mod vertex;

// Re-export commonly used types
pub use batching::{StaticBatch, StaticGeometryBatcher};
pub use vertex::StaticVertex;
