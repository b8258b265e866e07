//! Model input shapes consumed by the batcher.
//!
//! A [`ModelData`] is the already-decoded form of a multi-material model:
//! one shared vertex array, one shared index array, and a list of
//! [`SubMesh`] records describing which slice of the index array belongs
//! to which material. The batcher never parses model files; loaders are
//! expected to produce this shape.

use super::batching::MaterialKey;
use super::vertex::StaticVertex;

/// A single material's slice of a model's shared index array.
///
/// The slice covers `[start_index, start_index + 3 * primitive_count)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubMesh {
    /// Material grouping key for this submesh.
    pub material_key: MaterialKey,
    /// First index of the submesh within the model's index array.
    pub start_index: usize,
    /// Number of triangles in the submesh.
    pub primitive_count: usize,
}

/// An already-decoded model: shared vertex/index arrays plus per-submesh
/// material ranges.
#[derive(Debug, Clone, Default)]
pub struct ModelData {
    /// Shared vertex array referenced by all submeshes.
    pub vertices: Vec<StaticVertex>,
    /// Shared triangle-list index array.
    pub indices: Vec<u32>,
    /// Per-material slices into `indices`.
    pub submeshes: Vec<SubMesh>,
}

impl ModelData {
    /// Total number of triangles across all submeshes.
    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.primitive_count).sum()
    }
}
