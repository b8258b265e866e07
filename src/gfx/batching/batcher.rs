//! Batch accumulation and lifecycle control.
//!
//! [`StaticGeometryBatcher`] merges many small geometry fragments into a
//! handful of per-material working batches. Fragments arrive as raw
//! vertex/index arrays, as decoded models with per-submesh material
//! ranges, or as the entire working set of another batcher. Every
//! fragment is transformed on the way in and its indices are rebased so
//! they stay valid after concatenation.
//!
//! The batcher is either *open* (accepting fragments) or *sealed*
//! (frozen, with a collision mesh extracted). Mutating calls while sealed
//! are silent no-ops so orchestration code can safely double-call
//! shutdown paths.

use std::collections::HashMap;

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, SquareMatrix, Vector3};
use log::{debug, trace};

use crate::error::BatchError;
use crate::gfx::model::ModelData;
use crate::gfx::vertex::StaticVertex;

use super::buffers::CombinedBuffers;
use super::physics::PhysicsMesh;

/// Opaque id grouping geometry that shares a rendering material.
///
/// Never interpreted by the batcher; it only drives draw-call
/// partitioning in the combined buffers.
pub type MaterialKey = u32;

/// Mutable per-material accumulator of vertices and triangle indices.
///
/// Every index is local to this batch's own vertex list, and the index
/// count is always a multiple of 3.
#[derive(Debug, Clone, Default)]
pub struct WorkingBatch {
    pub(crate) vertices: Vec<StaticVertex>,
    pub(crate) indices: Vec<u32>,
}

impl WorkingBatch {
    /// Vertices accumulated for this material so far.
    pub fn vertices(&self) -> &[StaticVertex] {
        &self.vertices
    }

    /// Local triangle-list indices into [`Self::vertices`].
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

/// Aggregate counters for the current working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatcherStatistics {
    pub batch_count: usize,
    pub total_vertices: usize,
    pub total_triangles: usize,
}

/// Merges geometry fragments into per-material batches and governs the
/// open/sealed lifecycle.
///
/// Working batches are kept in first-use order of their material keys,
/// which fixes the layout of the combined buffers for a given call
/// sequence. Call [`combine`](Self::combine) (or
/// [`emit`](Self::emit) with a device) to flatten the working set, and
/// [`seal`](Self::seal) to freeze the batcher and extract the collision
/// mesh.
pub struct StaticGeometryBatcher {
    batches: Vec<(MaterialKey, WorkingBatch)>,
    lookup: HashMap<MaterialKey, usize>,
    combined: Option<CombinedBuffers>,
    physics: Option<PhysicsMesh>,
    sealed: bool,
}

impl StaticGeometryBatcher {
    /// Creates an empty, open batcher.
    pub fn new() -> Self {
        Self {
            batches: Vec::new(),
            lookup: HashMap::new(),
            combined: None,
            physics: None,
            sealed: false,
        }
    }

    /// Discards all working batches and combined results, starting a
    /// fresh empty build. Silent no-op while sealed.
    pub fn reset(&mut self) {
        if self.sealed {
            return;
        }
        self.batches.clear();
        self.lookup.clear();
        self.combined = None;
    }

    /// Adds a raw fragment under `key`, transforming every vertex before
    /// accumulation.
    ///
    /// Positions are transformed by `transform`; normals by its
    /// inverse-transpose (correct under non-uniform scale) and
    /// re-normalised. Texture coordinates and tangent-space fields pass
    /// through unchanged. Indices are appended rebased by the batch's
    /// vertex count before this call.
    ///
    /// Silent `Ok` no-op while sealed.
    ///
    /// # Errors
    ///
    /// [`BatchError::PartialTriangle`] if `indices.len()` is not a
    /// multiple of 3, [`BatchError::IndexOutOfBounds`] if an index
    /// references a missing vertex. Nothing is mutated on error.
    pub fn add(
        &mut self,
        key: MaterialKey,
        vertices: &[StaticVertex],
        indices: &[u32],
        transform: &Matrix4<f32>,
    ) -> Result<(), BatchError> {
        if self.sealed {
            trace!("add ignored: batcher is sealed");
            return Ok(());
        }
        validate_fragment(vertices.len(), indices)?;

        let normal_matrix = normal_matrix(transform);
        let batch = self.batch_mut(key);
        let base = batch.vertices.len() as u32;

        batch.vertices.extend(
            vertices
                .iter()
                .map(|v| transform_vertex(v, transform, &normal_matrix)),
        );
        batch.indices.extend(indices.iter().map(|i| i + base));

        trace!(
            "merged fragment into key {}: +{} vertices, +{} triangles",
            key,
            vertices.len(),
            indices.len() / 3
        );
        Ok(())
    }

    /// Adds every submesh of a decoded model, converting each to a
    /// zero-based fragment before delegating to [`add`](Self::add).
    ///
    /// Each triangle contributes three fresh local vertices even when the
    /// source model shares vertices between adjacent triangles, so a
    /// converted submesh always carries exactly `3 * primitive_count`
    /// vertices. Downstream consumers rely on that triangle-soup count;
    /// do not weld.
    ///
    /// All submesh ranges are validated before any geometry is merged, so
    /// a malformed model leaves the batcher untouched.
    pub fn add_model(
        &mut self,
        model: &ModelData,
        transform: &Matrix4<f32>,
    ) -> Result<(), BatchError> {
        if self.sealed {
            trace!("add_model ignored: batcher is sealed");
            return Ok(());
        }
        for submesh in &model.submeshes {
            let count = submesh.primitive_count * 3;
            let end = submesh.start_index.checked_add(count);
            if end.is_none() || end.unwrap() > model.indices.len() {
                return Err(BatchError::SubmeshOutOfRange {
                    start_index: submesh.start_index,
                    index_count: count,
                    model_index_count: model.indices.len(),
                });
            }
            for &index in &model.indices[submesh.start_index..submesh.start_index + count] {
                if index as usize >= model.vertices.len() {
                    return Err(BatchError::IndexOutOfBounds {
                        index,
                        vertex_count: model.vertices.len(),
                    });
                }
            }
        }

        for submesh in &model.submeshes {
            let count = submesh.primitive_count * 3;
            let slice = &model.indices[submesh.start_index..submesh.start_index + count];
            let local_vertices: Vec<StaticVertex> =
                slice.iter().map(|&i| model.vertices[i as usize]).collect();
            let local_indices: Vec<u32> = (0..count as u32).collect();
            self.add(
                submesh.material_key,
                &local_vertices,
                &local_indices,
                transform,
            )?;
        }
        Ok(())
    }

    /// Imports another batcher's entire working set, applying `transform`
    /// on top of whatever transforms the source already applied.
    ///
    /// Keys are visited in the source's first-use order, so composing
    /// pre-built sub-assemblies stays deterministic.
    pub fn add_from(
        &mut self,
        other: &StaticGeometryBatcher,
        transform: &Matrix4<f32>,
    ) -> Result<(), BatchError> {
        for (key, batch) in &other.batches {
            self.add(*key, &batch.vertices, &batch.indices, transform)?;
        }
        Ok(())
    }

    /// Flattens the working set into [`CombinedBuffers`], replacing any
    /// previous combination. Silent no-op while sealed (existing buffers
    /// stay valid and are not rebuilt).
    ///
    /// Deterministic: unchanged working state produces byte-identical
    /// flat arrays.
    pub fn combine(&mut self) {
        if self.sealed {
            trace!("combine ignored: batcher is sealed");
            return;
        }
        self.combined = Some(CombinedBuffers::build(&self.batches));
    }

    /// Re-creates the GPU buffer pair from the last combination. Silent
    /// `Ok` no-op while sealed or before any [`combine`](Self::combine).
    pub fn upload(&mut self, device: &wgpu::Device) -> Result<(), BatchError> {
        if self.sealed {
            return Ok(());
        }
        match self.combined.as_mut() {
            Some(combined) => combined.upload(device),
            None => Ok(()),
        }
    }

    /// Combines and uploads in one step.
    pub fn emit(&mut self, device: &wgpu::Device) -> Result<(), BatchError> {
        self.combine();
        self.upload(device)
    }

    /// Freezes the batcher: extracts the collision mesh from the working
    /// set, then releases all working-batch memory. The combined buffers
    /// from the last emit survive, since rendering still needs them.
    /// No-op when already sealed.
    pub fn seal(&mut self) {
        if self.sealed {
            return;
        }
        let physics = PhysicsMesh::build(&self.batches);
        debug!(
            "sealed batcher: collision mesh has {} vertices / {} triangles",
            physics.vertex_count(),
            physics.triangle_count()
        );
        self.physics = Some(physics);
        self.batches.clear();
        self.lookup.clear();
        self.sealed = true;
    }

    /// Reopens a sealed batcher with a brand-new empty working set.
    ///
    /// The collision mesh is discarded and combined results are cleared;
    /// nothing from before the seal survives. No-op when already open.
    pub fn unseal(&mut self) {
        if !self.sealed {
            return;
        }
        self.sealed = false;
        self.physics = None;
        self.reset();
    }

    /// Whether the batcher has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// The collision mesh extracted at seal time; `None` while open.
    pub fn physics_mesh(&self) -> Option<&PhysicsMesh> {
        self.physics.as_ref()
    }

    /// The result of the last [`combine`](Self::combine), if any.
    pub fn combined(&self) -> Option<&CombinedBuffers> {
        self.combined.as_ref()
    }

    /// Material keys in first-use order.
    pub fn keys(&self) -> impl Iterator<Item = MaterialKey> + '_ {
        self.batches.iter().map(|(key, _)| *key)
    }

    /// Read access to a single working batch.
    pub fn working_batch(&self, key: MaterialKey) -> Option<&WorkingBatch> {
        self.lookup.get(&key).map(|&slot| &self.batches[slot].1)
    }

    /// Aggregate counters over the current working set.
    pub fn statistics(&self) -> BatcherStatistics {
        BatcherStatistics {
            batch_count: self.batches.len(),
            total_vertices: self.batches.iter().map(|(_, b)| b.vertices.len()).sum(),
            total_triangles: self.batches.iter().map(|(_, b)| b.indices.len() / 3).sum(),
        }
    }

    fn batch_mut(&mut self, key: MaterialKey) -> &mut WorkingBatch {
        let batches = &mut self.batches;
        let slot = *self.lookup.entry(key).or_insert_with(|| {
            batches.push((key, WorkingBatch::default()));
            batches.len() - 1
        });
        &mut self.batches[slot].1
    }
}

impl Default for StaticGeometryBatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_fragment(vertex_count: usize, indices: &[u32]) -> Result<(), BatchError> {
    if indices.len() % 3 != 0 {
        return Err(BatchError::PartialTriangle {
            index_count: indices.len(),
        });
    }
    for &index in indices {
        if index as usize >= vertex_count {
            return Err(BatchError::IndexOutOfBounds {
                index,
                vertex_count,
            });
        }
    }
    Ok(())
}

/// Inverse-transpose of the upper 3x3, so normals stay perpendicular
/// under non-uniform scale. Falls back to the linear part when the
/// transform is singular.
fn normal_matrix(transform: &Matrix4<f32>) -> Matrix3<f32> {
    let linear = Matrix3::from_cols(
        transform.x.truncate(),
        transform.y.truncate(),
        transform.z.truncate(),
    );
    match linear.invert() {
        Some(inverse) => inverse.transpose(),
        None => linear,
    }
}

fn transform_vertex(
    vertex: &StaticVertex,
    transform: &Matrix4<f32>,
    normal_matrix: &Matrix3<f32>,
) -> StaticVertex {
    let position = transform * Vector3::from(vertex.position).extend(1.0);
    let normal = normal_matrix * Vector3::from(vertex.normal);
    let normal = if normal.magnitude2() > f32::EPSILON {
        normal.normalize()
    } else {
        normal
    };
    StaticVertex {
        position: position.truncate().into(),
        normal: normal.into(),
        ..*vertex
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::model::SubMesh;
    use cgmath::Deg;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn vert(position: [f32; 3]) -> StaticVertex {
        StaticVertex {
            position,
            normal: [0.0, 0.0, 1.0],
            ..StaticVertex::default()
        }
    }

    fn unit_triangle() -> Vec<StaticVertex> {
        vec![
            vert([0.0, 0.0, 0.0]),
            vert([1.0, 0.0, 0.0]),
            vert([0.0, 1.0, 0.0]),
        ]
    }

    fn assert_vec3_near(a: [f32; 3], b: [f32; 3]) {
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-5, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_add_translates_positions() {
        init_logging();
        let mut batcher = StaticGeometryBatcher::new();
        let transform = Matrix4::from_translation(Vector3::new(10.0, 0.0, 0.0));
        batcher
            .add(7, &unit_triangle(), &[0, 1, 2], &transform)
            .unwrap();

        let batch = batcher.working_batch(7).unwrap();
        assert_vec3_near(batch.vertices()[0].position, [10.0, 0.0, 0.0]);
        assert_vec3_near(batch.vertices()[1].position, [11.0, 0.0, 0.0]);
        assert_vec3_near(batch.vertices()[2].position, [10.0, 1.0, 0.0]);
        assert_eq!(batch.indices(), &[0, 1, 2]);
    }

    #[test]
    fn test_add_rebases_indices_per_key() {
        let mut batcher = StaticGeometryBatcher::new();
        let identity = Matrix4::identity();
        batcher
            .add(3, &unit_triangle(), &[0, 1, 2], &identity)
            .unwrap();
        batcher
            .add(3, &unit_triangle(), &[0, 1, 2], &identity)
            .unwrap();

        let batch = batcher.working_batch(3).unwrap();
        assert_eq!(batch.vertices().len(), 6);
        assert_eq!(batch.indices(), &[0, 1, 2, 3, 4, 5]);
        // Every index stays inside the batch's own vertex list.
        assert!(batch
            .indices()
            .iter()
            .all(|&i| (i as usize) < batch.vertices().len()));
    }

    #[test]
    fn test_first_use_order_is_preserved() {
        let mut batcher = StaticGeometryBatcher::new();
        let identity = Matrix4::identity();
        for key in [9, 2, 40, 2, 9] {
            batcher
                .add(key, &unit_triangle(), &[0, 1, 2], &identity)
                .unwrap();
        }
        let keys: Vec<MaterialKey> = batcher.keys().collect();
        assert_eq!(keys, vec![9, 2, 40]);
    }

    #[test]
    fn test_rejects_partial_triangle() {
        let mut batcher = StaticGeometryBatcher::new();
        let err = batcher
            .add(1, &unit_triangle(), &[0, 1], &Matrix4::identity())
            .unwrap_err();
        assert_eq!(err, BatchError::PartialTriangle { index_count: 2 });
        assert!(batcher.working_batch(1).is_none());
    }

    #[test]
    fn test_rejects_out_of_bounds_index_without_mutating() {
        let mut batcher = StaticGeometryBatcher::new();
        let identity = Matrix4::identity();
        batcher
            .add(1, &unit_triangle(), &[0, 1, 2], &identity)
            .unwrap();

        let err = batcher
            .add(1, &unit_triangle(), &[0, 1, 3], &identity)
            .unwrap_err();
        assert_eq!(
            err,
            BatchError::IndexOutOfBounds {
                index: 3,
                vertex_count: 3
            }
        );
        // Prior accumulated state is unaffected by the failed call.
        let batch = batcher.working_batch(1).unwrap();
        assert_eq!(batch.vertices().len(), 3);
        assert_eq!(batch.indices().len(), 3);
    }

    #[test]
    fn test_normal_uses_inverse_transpose() {
        let mut batcher = StaticGeometryBatcher::new();
        // Non-uniform scale: a naive normal transform would leave the
        // normal pointing off-axis.
        let transform = Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0);
        let mut vertices = unit_triangle();
        for v in &mut vertices {
            v.normal = [1.0, 1.0, 0.0];
        }
        batcher.add(1, &vertices, &[0, 1, 2], &transform).unwrap();

        let n = batcher.working_batch(1).unwrap().vertices()[0].normal;
        // Inverse-transpose maps (1,1,0) to (0.5,1,0), normalised.
        let len = (0.5f32 * 0.5 + 1.0).sqrt();
        assert_vec3_near(n, [0.5 / len, 1.0 / len, 0.0]);
    }

    #[test]
    fn test_tex_coord_and_tangent_pass_through() {
        let mut batcher = StaticGeometryBatcher::new();
        let mut vertices = unit_triangle();
        vertices[0].tex_coord = [0.25, 0.75];
        vertices[0].tangent = [1.0, 2.0, 3.0];
        vertices[0].bitangent = [4.0, 5.0, 6.0];
        let transform = Matrix4::from_angle_y(Deg(45.0));
        batcher.add(1, &vertices, &[0, 1, 2], &transform).unwrap();

        let v = batcher.working_batch(1).unwrap().vertices()[0];
        assert_eq!(v.tex_coord, [0.25, 0.75]);
        assert_eq!(v.tangent, [1.0, 2.0, 3.0]);
        assert_eq!(v.bitangent, [4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_add_model_duplicates_shared_vertices() {
        // A quad sharing two vertices between its triangles: conversion
        // must not weld, so the batch gets 3 * primitive_count vertices.
        let model = ModelData {
            vertices: vec![
                vert([0.0, 0.0, 0.0]),
                vert([1.0, 0.0, 0.0]),
                vert([1.0, 1.0, 0.0]),
                vert([0.0, 1.0, 0.0]),
            ],
            indices: vec![0, 1, 2, 2, 3, 0],
            submeshes: vec![SubMesh {
                material_key: 5,
                start_index: 0,
                primitive_count: 2,
            }],
        };
        let mut batcher = StaticGeometryBatcher::new();
        batcher.add_model(&model, &Matrix4::identity()).unwrap();

        let batch = batcher.working_batch(5).unwrap();
        assert_eq!(batch.vertices().len(), 6);
        assert_eq!(batch.indices(), &[0, 1, 2, 3, 4, 5]);
        // Resolved positions follow the original triangle order.
        assert_vec3_near(batch.vertices()[3].position, [1.0, 1.0, 0.0]);
        assert_vec3_near(batch.vertices()[5].position, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_add_model_splits_materials() {
        let model = ModelData {
            vertices: vec![
                vert([0.0, 0.0, 0.0]),
                vert([1.0, 0.0, 0.0]),
                vert([1.0, 1.0, 0.0]),
                vert([0.0, 1.0, 0.0]),
            ],
            indices: vec![0, 1, 2, 2, 3, 0],
            submeshes: vec![
                SubMesh {
                    material_key: 10,
                    start_index: 0,
                    primitive_count: 1,
                },
                SubMesh {
                    material_key: 20,
                    start_index: 3,
                    primitive_count: 1,
                },
            ],
        };
        let mut batcher = StaticGeometryBatcher::new();
        batcher.add_model(&model, &Matrix4::identity()).unwrap();

        assert_eq!(batcher.keys().collect::<Vec<_>>(), vec![10, 20]);
        assert_eq!(batcher.working_batch(10).unwrap().vertices().len(), 3);
        assert_eq!(batcher.working_batch(20).unwrap().vertices().len(), 3);
    }

    #[test]
    fn test_add_model_rejects_bad_range_before_mutating() {
        let model = ModelData {
            vertices: unit_triangle(),
            indices: vec![0, 1, 2],
            submeshes: vec![
                SubMesh {
                    material_key: 1,
                    start_index: 0,
                    primitive_count: 1,
                },
                SubMesh {
                    material_key: 2,
                    start_index: 3,
                    primitive_count: 1,
                },
            ],
        };
        let mut batcher = StaticGeometryBatcher::new();
        let err = batcher
            .add_model(&model, &Matrix4::identity())
            .unwrap_err();
        assert_eq!(
            err,
            BatchError::SubmeshOutOfRange {
                start_index: 3,
                index_count: 3,
                model_index_count: 3
            }
        );
        // The first (valid) submesh must not have been merged.
        assert_eq!(batcher.statistics().batch_count, 0);
    }

    #[test]
    fn test_add_from_composes_transforms() {
        let t1 = Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0) * Matrix4::from_angle_z(Deg(90.0));
        let t2 = Matrix4::from_translation(Vector3::new(0.0, 5.0, 0.0))
            * Matrix4::from_angle_x(Deg(30.0));

        let mut source = StaticGeometryBatcher::new();
        source.add(7, &unit_triangle(), &[0, 1, 2], &t1).unwrap();

        let mut composed = StaticGeometryBatcher::new();
        composed.add_from(&source, &t2).unwrap();

        let mut direct = StaticGeometryBatcher::new();
        direct
            .add(7, &unit_triangle(), &[0, 1, 2], &(t2 * t1))
            .unwrap();

        let a = composed.working_batch(7).unwrap();
        let b = direct.working_batch(7).unwrap();
        assert_eq!(a.indices(), b.indices());
        for (va, vb) in a.vertices().iter().zip(b.vertices()) {
            assert_vec3_near(va.position, vb.position);
            assert_vec3_near(va.normal, vb.normal);
        }
    }

    #[test]
    fn test_seal_freezes_state() {
        init_logging();
        let mut batcher = StaticGeometryBatcher::new();
        let identity = Matrix4::identity();
        batcher
            .add(1, &unit_triangle(), &[0, 1, 2], &identity)
            .unwrap();
        batcher.combine();
        batcher.seal();

        assert!(batcher.is_sealed());
        // Working memory is released, combined results survive.
        assert_eq!(batcher.statistics().batch_count, 0);
        assert!(batcher.combined().is_some());
        assert_eq!(batcher.combined().unwrap().vertices().len(), 3);

        // Mutation after sealing is a silent no-op.
        batcher
            .add(2, &unit_triangle(), &[0, 1, 2], &identity)
            .unwrap();
        batcher.reset();
        batcher.combine();
        assert_eq!(batcher.statistics().batch_count, 0);
        assert_eq!(batcher.combined().unwrap().vertices().len(), 3);

        // The collision mesh is stable across repeated reads.
        let first = batcher.physics_mesh().unwrap().positions().to_vec();
        batcher.seal();
        assert_eq!(batcher.physics_mesh().unwrap().positions(), &first[..]);
    }

    #[test]
    fn test_unseal_starts_fresh() {
        let mut batcher = StaticGeometryBatcher::new();
        let identity = Matrix4::identity();
        batcher
            .add(1, &unit_triangle(), &[0, 1, 2], &identity)
            .unwrap();
        batcher.seal();
        batcher.unseal();

        assert!(!batcher.is_sealed());
        assert!(batcher.physics_mesh().is_none());
        assert_eq!(batcher.statistics().batch_count, 0);

        // A new fragment appears alone after the next combine.
        batcher
            .add(8, &unit_triangle(), &[0, 1, 2], &identity)
            .unwrap();
        batcher.combine();
        let combined = batcher.combined().unwrap();
        assert_eq!(combined.vertices().len(), 3);
        assert_eq!(combined.batches().count(), 1);
        assert!(combined.batch(8).is_some());
    }

    #[test]
    fn test_statistics() {
        let mut batcher = StaticGeometryBatcher::new();
        let identity = Matrix4::identity();
        batcher
            .add(1, &unit_triangle(), &[0, 1, 2], &identity)
            .unwrap();
        batcher
            .add(2, &unit_triangle(), &[0, 1, 2], &identity)
            .unwrap();
        let stats = batcher.statistics();
        assert_eq!(stats.batch_count, 2);
        assert_eq!(stats.total_vertices, 6);
        assert_eq!(stats.total_triangles, 2);
    }
}
