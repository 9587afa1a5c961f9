//! Error types for `Rigsmith`

use std::path::PathBuf;

use thiserror::Error;

use crate::converter::rig_glb::RigStage;

/// Broad category of an [`Error`], used by callers that only care about
/// which layer rejected the asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Filesystem or stream failure.
    Io,
    /// Malformed container or scene-graph document.
    Format,
    /// Accessor cannot be interpreted or does not fit the payload.
    Accessor,
    /// The asset is well-formed but cannot be rigged.
    Pipeline,
    /// Invalid caller-supplied option.
    Config,
}

/// The error type for `Rigsmith` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The output file could not be moved into place.
    #[error("failed to persist output file: {0}")]
    PersistFailed(#[from] tempfile::PersistError),

    // ==================== GLB Container Errors ====================
    /// The file is not a GLB container (missing `glTF` magic).
    #[error("invalid GLB magic: expected glTF, found {0:?}")]
    InvalidGlbMagic([u8; 4]),

    /// The container version is not supported.
    #[error("unsupported GLB version: {version} (supported: 2)")]
    UnsupportedGlbVersion {
        /// The version number found in the header.
        version: u32,
    },

    /// The container is shorter than its header claims.
    #[error("GLB truncated: header declares {declared} bytes, only {actual} available")]
    GlbTruncated {
        /// Total length declared in the header.
        declared: usize,
        /// Number of bytes actually available.
        actual: usize,
    },

    /// A chunk header or body extends past the declared container length.
    #[error("chunk {chunk} at offset {offset} ({length} bytes) overruns container length {total}")]
    ChunkOverrun {
        /// Zero-based chunk position.
        chunk: usize,
        /// Byte offset of the chunk header.
        offset: usize,
        /// Declared chunk body length.
        length: usize,
        /// Declared container length.
        total: usize,
    },

    /// The container has no JSON chunk, or it is not the first chunk.
    #[error("GLB is missing its leading JSON chunk")]
    MissingJsonChunk,

    /// A second binary chunk was found.
    #[error("unexpected chunk {chunk}: only one BIN chunk is allowed")]
    DuplicateBinChunk {
        /// Zero-based chunk position.
        chunk: usize,
    },

    /// The JSON chunk does not describe a glTF document.
    #[error("invalid JSON chunk: {0}")]
    InvalidJsonChunk(#[source] serde_json::Error),

    /// The serialized container would not fit in the 32-bit length field.
    #[error("GLB too large: {size} bytes exceeds the 32-bit length field")]
    GlbTooLarge {
        /// Total size that was requested.
        size: usize,
    },

    /// A document cross-reference points past the end of its target array.
    #[error("{referrer} references {kind} {index}, but only {len} exist")]
    DanglingIndex {
        /// Which record holds the reference, e.g. `node 3`.
        referrer: String,
        /// The referenced array, e.g. `accessor`.
        kind: &'static str,
        /// The offending index.
        index: usize,
        /// Length of the referenced array.
        len: usize,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ==================== Accessor Errors ====================
    /// The accessor's `componentType` code is not one of the six glTF types.
    #[error("accessor {accessor}: unsupported component type {code}")]
    UnsupportedComponentType {
        /// Accessor index.
        accessor: usize,
        /// The unrecognized code.
        code: u32,
    },

    /// The accessor's `type` string is not a supported element shape.
    #[error("accessor {accessor}: unsupported element type {shape:?}")]
    UnsupportedAccessorType {
        /// Accessor index.
        accessor: usize,
        /// The unrecognized type string.
        shape: String,
    },

    /// The accessor has no buffer view (sparse-only accessors are not read).
    #[error("accessor {accessor} has no buffer view")]
    AccessorMissingBufferView {
        /// Accessor index.
        accessor: usize,
    },

    /// The buffer view lives in an external buffer rather than the GLB payload.
    #[error("accessor {accessor}: buffer {buffer} is not the GLB binary chunk")]
    ExternalBuffer {
        /// Accessor index.
        accessor: usize,
        /// Buffer index the view points at.
        buffer: usize,
    },

    /// The accessor's byte region does not fit its view or the payload.
    #[error("accessor {accessor}: bytes {start}..{end} exceed available {available}")]
    AccessorOutOfBounds {
        /// Accessor index.
        accessor: usize,
        /// First byte of the region.
        start: usize,
        /// One past the last byte of the region.
        end: usize,
        /// Bytes available in the enclosing view or payload.
        available: usize,
    },

    /// Values handed to `append` do not divide into whole elements.
    #[error("{len} values do not form whole {shape} elements")]
    RaggedValues {
        /// Number of component values supplied.
        len: usize,
        /// The target element shape.
        shape: &'static str,
    },

    // ==================== Pipeline Errors ====================
    /// No node in the scene graph references a mesh.
    #[error("no mesh found in model")]
    NoMesh,

    /// The mesh has no primitive carrying a `POSITION` attribute.
    #[error("mesh {mesh} has no primitive with a POSITION attribute")]
    MeshWithoutPositions {
        /// Mesh index.
        mesh: usize,
    },

    /// The `POSITION` accessor is not a three-component vector.
    #[error("POSITION accessor {accessor} is {shape}, expected VEC3")]
    PositionsNotVec3 {
        /// Accessor index.
        accessor: usize,
        /// The shape actually found.
        shape: &'static str,
    },

    /// The mesh has no vertices.
    #[error("mesh {mesh} has no vertices")]
    EmptyVertexSet {
        /// Mesh index.
        mesh: usize,
    },

    /// Wraps any error raised inside a pipeline stage.
    #[error("{stage} failed: {source}")]
    Stage {
        /// The stage that failed.
        stage: RigStage,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },

    // ==================== Configuration Errors ====================
    /// An option is outside its accepted range.
    #[error("invalid option {name}: {message}")]
    InvalidOption {
        /// Option name.
        name: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    /// Output path could not be derived from the input path.
    #[error("invalid path: {0}")]
    InvalidPath(PathBuf),
}

impl Error {
    /// Classify this error. Stage wrappers report the kind of their cause.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) | Self::PersistFailed(_) => ErrorKind::Io,
            Self::InvalidGlbMagic(_)
            | Self::UnsupportedGlbVersion { .. }
            | Self::GlbTruncated { .. }
            | Self::ChunkOverrun { .. }
            | Self::MissingJsonChunk
            | Self::DuplicateBinChunk { .. }
            | Self::InvalidJsonChunk(_)
            | Self::GlbTooLarge { .. }
            | Self::DanglingIndex { .. }
            | Self::JsonError(_) => ErrorKind::Format,
            Self::UnsupportedComponentType { .. }
            | Self::UnsupportedAccessorType { .. }
            | Self::AccessorMissingBufferView { .. }
            | Self::ExternalBuffer { .. }
            | Self::AccessorOutOfBounds { .. }
            | Self::RaggedValues { .. } => ErrorKind::Accessor,
            Self::NoMesh
            | Self::MeshWithoutPositions { .. }
            | Self::PositionsNotVec3 { .. }
            | Self::EmptyVertexSet { .. } => ErrorKind::Pipeline,
            Self::Stage { source, .. } => source.kind(),
            Self::InvalidOption { .. } | Self::InvalidPath(_) => ErrorKind::Config,
        }
    }

    /// The pipeline stage this error was raised in, if any.
    #[must_use]
    pub fn stage(&self) -> Option<RigStage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub(crate) fn at(self, stage: RigStage) -> Self {
        match self {
            already @ Self::Stage { .. } => already,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }
}

/// A specialized Result type for `Rigsmith` operations.
pub type Result<T> = std::result::Result<T, Error>;
