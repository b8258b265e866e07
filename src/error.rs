//! Error types for the batching engine.

use thiserror::Error;

/// Errors surfaced by the static geometry batcher.
///
/// Contract violations (`PartialTriangle`, `IndexOutOfBounds`,
/// `SubmeshOutOfRange`) are caller bugs and are reported before any
/// batcher state is mutated, so a failed call leaves previously
/// accumulated geometry untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// An index list does not describe whole triangles.
    #[error("index count {index_count} is not a multiple of 3")]
    PartialTriangle { index_count: usize },

    /// An index references a vertex that does not exist in its fragment.
    #[error("index {index} out of bounds for fragment with {vertex_count} vertices")]
    IndexOutOfBounds { index: u32, vertex_count: usize },

    /// A submesh slice escapes the shared model index array.
    #[error(
        "submesh range [{start_index}, {start_index}+{index_count}) exceeds model index count {model_index_count}"
    )]
    SubmeshOutOfRange {
        start_index: usize,
        index_count: usize,
        model_index_count: usize,
    },

    /// A combined buffer would exceed what the device can allocate.
    ///
    /// The previous GPU buffer pair has already been released when this is
    /// returned; callers must rebuild with reduced geometry.
    #[error("combined buffer of {requested} bytes exceeds device limit of {max} bytes")]
    BufferTooLarge { requested: u64, max: u64 },
}
