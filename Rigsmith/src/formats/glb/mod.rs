//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT
//!
//! Binary glTF 2.0 (GLB) container
//!
//! Layout: a 12-byte header (magic, version, total length) followed by a
//! JSON chunk and an optional BIN chunk, each prefixed with its length and
//! type tag and padded to 4 bytes.

pub mod accessor;
pub mod document;
mod reader;
mod writer;

pub use accessor::{
    AccessorData, AccessorShape, AppendedRegion, Component, ComponentType, PayloadBuffer,
    read_accessor,
};
pub use document::{
    GltfAccessor, GltfAnimation, GltfAnimationSampler, GltfAsset, GltfBuffer, GltfBufferView,
    GltfChannel, GltfChannelTarget, GltfDocument, GltfMesh, GltfNode, GltfPrimitive, GltfScene,
    GltfSkin,
};
pub use reader::{parse_glb_bytes, read_glb};
pub use writer::{write_glb, write_glb_bytes};

/// "glTF" magic (little-endian)
pub const GLB_MAGIC: u32 = 0x46546C67;

/// The only container version this crate reads or writes.
pub const GLB_VERSION: u32 = 2;

/// "JSON" chunk type (little-endian)
pub const CHUNK_JSON: u32 = 0x4E4F534A;

/// "BIN\0" chunk type (little-endian)
pub const CHUNK_BIN: u32 = 0x004E4942;

/// Size of the container header in bytes
pub const HEADER_SIZE: usize = 12;

/// Size of a chunk header (length + type) in bytes
pub const CHUNK_HEADER_SIZE: usize = 8;

/// A decoded GLB: the scene-graph document and the raw BIN chunk bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlbContainer {
    pub document: GltfDocument,
    pub payload: Vec<u8>,
}

/// Padding needed to bring `len` up to a multiple of 4.
pub(crate) fn padding_for(len: usize) -> usize {
    (4 - (len % 4)) % 4
}
