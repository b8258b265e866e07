//! # Vertex Data Structures
//!
//! This module defines the fixed-layout vertex format shared by every
//! geometry fragment the batcher consumes and every combined buffer it
//! emits.

/// A static-geometry vertex with position, normal, texture coordinate and
/// tangent-space data.
///
/// The `#[repr(C)]` attribute ensures the struct has a C-compatible memory
/// layout so combined vertex arrays can be uploaded to the GPU verbatim
/// with `bytemuck::cast_slice`.
///
/// Callers that do not compute tangent frames may leave `tangent` and
/// `bitangent` zero-filled; the batcher copies both fields through
/// unchanged.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StaticVertex {
    /// 3D position coordinates [x, y, z]
    pub position: [f32; 3],
    /// 3D normal vector [nx, ny, nz] for lighting calculations
    pub normal: [f32; 3],
    /// 2D texture coordinates [u, v]
    pub tex_coord: [f32; 2],
    /// Tangent vector of the tangent-space basis (zero if unused)
    pub tangent: [f32; 3],
    /// Bitangent vector of the tangent-space basis (zero if unused)
    pub bitangent: [f32; 3],
}

impl StaticVertex {
    /// Returns the vertex buffer layout for wgpu rendering.
    ///
    /// - Attribute 0: Position (Float32x3)
    /// - Attribute 1: Normal (Float32x3)
    /// - Attribute 2: Texture coordinate (Float32x2)
    /// - Attribute 3: Tangent (Float32x3)
    /// - Attribute 4: Bitangent (Float32x3)
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<StaticVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: (mem::size_of::<[f32; 3]>() * 2) as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: (mem::size_of::<[f32; 3]>() * 2 + mem::size_of::<[f32; 2]>())
                        as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: (mem::size_of::<[f32; 3]>() * 3 + mem::size_of::<[f32; 2]>())
                        as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}
