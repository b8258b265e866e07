//! # Primitive Shape Generation
//!
//! This module contains functions to generate simple primitive shapes as
//! fragment sources for the batcher. All shapes carry outward normals
//! and 0..1 texture coordinates.

use super::GeometryData;

/// Generate a unit cube centered at the origin
///
/// Returns a cube with vertices from -0.5 to 0.5 on all axes, built one
/// face at a time so every face owns its four vertices (no sharing
/// across faces, which would smear normals at the edges).
pub fn generate_cube() -> GeometryData {
    let mut data = GeometryData::new();

    // (normal, u-axis, v-axis) per face; corners are
    // normal/2 +- u/2 +- v/2.
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]), // front
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]), // back
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]), // right
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]), // left
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]), // top
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]), // bottom
    ];

    for (normal, u_axis, v_axis) in faces {
        let base = data.positions.len() as u32;
        for (corner_u, corner_v) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            let position = [
                0.5 * normal[0] + (corner_u - 0.5) * u_axis[0] + (corner_v - 0.5) * v_axis[0],
                0.5 * normal[1] + (corner_u - 0.5) * u_axis[1] + (corner_v - 0.5) * v_axis[1],
                0.5 * normal[2] + (corner_u - 0.5) * u_axis[2] + (corner_v - 0.5) * v_axis[2],
            ];
            data.positions.push(position);
            data.normals.push(normal);
            data.tex_coords.push([corner_u, corner_v]);
        }
        // Two counter-clockwise triangles per face
        data.indices
            .extend([base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    data
}

/// Generate a single quad in the XY plane
///
/// # Arguments
/// * `width` - Extent along X
/// * `height` - Extent along Y
///
/// Returns a quad centered at the origin with its normal pointing along
/// positive Z.
pub fn generate_quad(width: f32, height: f32) -> GeometryData {
    let mut data = GeometryData::new();

    for (u, v) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
        data.positions
            .push([(u - 0.5) * width, (v - 0.5) * height, 0.0]);
        data.normals.push([0.0, 0.0, 1.0]);
        data.tex_coords.push([u, v]);
    }
    data.indices.extend([0, 1, 2, 2, 3, 0]);

    data
}
