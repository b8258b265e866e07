//! Collision mesh extraction.
//!
//! A [`PhysicsMesh`] is the physics-facing view of a batcher's geometry:
//! the same concatenation and index rebasing as the render buffers, but
//! position-only and without per-material bookkeeping. Collision
//! backends consume it once, at seal time, as a single triangle soup.

use super::batcher::{MaterialKey, WorkingBatch};

/// Position-only flat arrays for one-shot collision mesh construction.
///
/// Built by [`StaticGeometryBatcher::seal`] and frozen from then on.
///
/// [`StaticGeometryBatcher::seal`]: super::StaticGeometryBatcher::seal
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsMesh {
    positions: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

impl PhysicsMesh {
    pub(crate) fn build(batches: &[(MaterialKey, WorkingBatch)]) -> Self {
        let total_vertices: usize = batches.iter().map(|(_, b)| b.vertices.len()).sum();
        let total_indices: usize = batches.iter().map(|(_, b)| b.indices.len()).sum();

        let mut positions = Vec::with_capacity(total_vertices);
        let mut indices = Vec::with_capacity(total_indices);
        for (_, batch) in batches {
            let base_vertex = positions.len() as u32;
            positions.extend(batch.vertices.iter().map(|v| v.position));
            indices.extend(batch.indices.iter().map(|i| i + base_vertex));
        }
        Self { positions, indices }
    }

    /// Vertex positions of the collision mesh.
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Triangle-list indices into [`Self::positions`].
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
