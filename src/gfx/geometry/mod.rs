//! # Procedural Geometry Fragments
//!
//! This module provides simple procedural shapes as ready-made fragment
//! sources for the batcher, plus the [`GeometryData`] container loaders
//! can fill with decoded attribute arrays.
//!
//! ## Usage
//!
//! ```no_run
//! use drystane::gfx::geometry::{generate_cube, generate_quad};
//!
//! let cube = generate_cube();
//! let floor = generate_quad(16.0, 16.0);
//! let vertices = cube.to_vertices();
//! ```

pub mod primitives;

pub use primitives::*;

use cgmath::{InnerSpace, Vector3};

use super::vertex::StaticVertex;

/// Decoded geometry attribute arrays, one entry per vertex.
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub positions: Vec<[f32; 3]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    /// Create a new empty geometry data structure
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of vertices in this geometry
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of triangles in this geometry
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Converts the attribute arrays into batcher-ready vertices.
    ///
    /// Tangent frames are accumulated per vertex from the UV derivatives
    /// of each triangle and normalised; vertices not referenced by any
    /// triangle (or with degenerate UVs) keep zeroed tangent fields.
    /// Missing normals default to +Z, missing texture coordinates to
    /// (0, 0).
    pub fn to_vertices(&self) -> Vec<StaticVertex> {
        let mut tangents = vec![Vector3::new(0.0f32, 0.0, 0.0); self.positions.len()];
        let mut bitangents = vec![Vector3::new(0.0f32, 0.0, 0.0); self.positions.len()];

        for triangle in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            );
            let p0 = Vector3::from(self.positions[i0]);
            let edge1 = Vector3::from(self.positions[i1]) - p0;
            let edge2 = Vector3::from(self.positions[i2]) - p0;

            let uv0 = self.tex_coords.get(i0).copied().unwrap_or([0.0, 0.0]);
            let uv1 = self.tex_coords.get(i1).copied().unwrap_or([0.0, 0.0]);
            let uv2 = self.tex_coords.get(i2).copied().unwrap_or([0.0, 0.0]);
            let du1 = uv1[0] - uv0[0];
            let dv1 = uv1[1] - uv0[1];
            let du2 = uv2[0] - uv0[0];
            let dv2 = uv2[1] - uv0[1];

            let det = du1 * dv2 - du2 * dv1;
            if det.abs() < f32::EPSILON {
                continue;
            }
            let r = 1.0 / det;
            let tangent = (edge1 * dv2 - edge2 * dv1) * r;
            let bitangent = (edge2 * du1 - edge1 * du2) * r;
            for &i in &[i0, i1, i2] {
                tangents[i] += tangent;
                bitangents[i] += bitangent;
            }
        }

        (0..self.positions.len())
            .map(|i| StaticVertex {
                position: self.positions[i],
                normal: self.normals.get(i).copied().unwrap_or([0.0, 0.0, 1.0]),
                tex_coord: self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
                tangent: normalize_or_zero(tangents[i]),
                bitangent: normalize_or_zero(bitangents[i]),
            })
            .collect()
    }
}

fn normalize_or_zero(v: Vector3<f32>) -> [f32; 3] {
    if v.magnitude2() > f32::EPSILON {
        v.normalize().into()
    } else {
        [0.0, 0.0, 0.0]
    }
}
