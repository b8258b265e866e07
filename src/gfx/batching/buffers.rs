//! Flattened buffer emission.
//!
//! [`CombinedBuffers`] is the render-facing output of a batcher: one
//! contiguous vertex array, one contiguous index array, and a per-key
//! record of which index sub-range draws which material. The CPU arrays
//! always exist after a combine; the GPU pair is created on demand with
//! [`upload`](CombinedBuffers::upload) and owned exclusively by this
//! type, so replacement or drop releases the old buffers on every path.

use std::collections::HashMap;

use log::debug;

use crate::error::BatchError;
use crate::gfx::vertex::StaticVertex;

use super::batcher::{MaterialKey, WorkingBatch};

/// A material key's sub-range of the combined index buffer.
///
/// The triangles in `[start_index, start_index + 3 * primitive_count)`
/// of the index array, resolved against the vertex array, reproduce
/// exactly the geometry accumulated for that key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticBatch {
    /// First index of the range within the combined index buffer.
    pub start_index: u32,
    /// Number of triangles in the range.
    pub primitive_count: u32,
}

/// GPU-ready flattening of a batcher's working set.
pub struct CombinedBuffers {
    vertices: Vec<StaticVertex>,
    indices: Vec<u32>,
    ranges: Vec<(MaterialKey, StaticBatch)>,
    lookup: HashMap<MaterialKey, usize>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
}

impl CombinedBuffers {
    /// Flattens working batches in their first-use order.
    ///
    /// Each batch's vertices are copied verbatim into the next free
    /// region of the vertex array; its indices follow into the index
    /// array, shifted by the batch's starting vertex offset.
    pub(crate) fn build(batches: &[(MaterialKey, WorkingBatch)]) -> Self {
        let total_vertices: usize = batches.iter().map(|(_, b)| b.vertices.len()).sum();
        let total_indices: usize = batches.iter().map(|(_, b)| b.indices.len()).sum();

        let mut vertices = Vec::with_capacity(total_vertices);
        let mut indices = Vec::with_capacity(total_indices);
        let mut ranges = Vec::with_capacity(batches.len());
        let mut lookup = HashMap::with_capacity(batches.len());

        for (key, batch) in batches {
            let base_vertex = vertices.len() as u32;
            let start_index = indices.len() as u32;
            vertices.extend_from_slice(&batch.vertices);
            indices.extend(batch.indices.iter().map(|i| i + base_vertex));
            lookup.insert(*key, ranges.len());
            ranges.push((
                *key,
                StaticBatch {
                    start_index,
                    primitive_count: (batch.indices.len() / 3) as u32,
                },
            ));
        }

        debug!(
            "combined {} batches into {} vertices / {} indices",
            ranges.len(),
            vertices.len(),
            indices.len()
        );

        Self {
            vertices,
            indices,
            ranges,
            lookup,
            vertex_buffer: None,
            index_buffer: None,
        }
    }

    /// Releases the previous GPU pair and creates fresh buffers from the
    /// flat arrays.
    ///
    /// An empty combination leaves the pair absent. On
    /// [`BatchError::BufferTooLarge`] the old buffers are already gone,
    /// so no usable pair remains and the caller must rebuild with
    /// reduced geometry.
    pub(crate) fn upload(&mut self, device: &wgpu::Device) -> Result<(), BatchError> {
        use wgpu::util::DeviceExt;

        // Old buffers go first so a failed allocation can never leave a
        // stale pair bound.
        self.vertex_buffer = None;
        self.index_buffer = None;

        if self.vertices.is_empty() {
            return Ok(());
        }

        let vertex_bytes = bytemuck::cast_slice::<_, u8>(&self.vertices);
        let index_bytes = bytemuck::cast_slice::<_, u8>(&self.indices);
        let max = device.limits().max_buffer_size;
        let requested = vertex_bytes.len().max(index_bytes.len()) as u64;
        if requested > max {
            return Err(BatchError::BufferTooLarge { requested, max });
        }

        self.vertex_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Combined Vertex Buffer"),
            contents: vertex_bytes,
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.index_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Combined Index Buffer"),
            contents: index_bytes,
            usage: wgpu::BufferUsages::INDEX,
        }));
        Ok(())
    }

    /// The combined vertex array.
    pub fn vertices(&self) -> &[StaticVertex] {
        &self.vertices
    }

    /// The combined index array.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Looks up a material key's committed range.
    pub fn batch(&self, key: MaterialKey) -> Option<&StaticBatch> {
        self.lookup.get(&key).map(|&slot| &self.ranges[slot].1)
    }

    /// Committed ranges in the layout order of the combined buffers.
    pub fn batches(&self) -> impl Iterator<Item = (MaterialKey, &StaticBatch)> {
        self.ranges.iter().map(|(key, batch)| (*key, batch))
    }

    /// The GPU vertex buffer, if uploaded.
    pub fn vertex_buffer(&self) -> Option<&wgpu::Buffer> {
        self.vertex_buffer.as_ref()
    }

    /// The GPU index buffer, if uploaded.
    pub fn index_buffer(&self) -> Option<&wgpu::Buffer> {
        self.index_buffer.as_ref()
    }
}
