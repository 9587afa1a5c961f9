//! # Rigsmith
//!
//! A pure-Rust library that turns a static binary glTF (GLB) mesh into an
//! animated one: a humanoid skeleton fitted to the mesh bounds, per-vertex
//! skin weights and three keyframe clips (Idle, Walk, Attack).
//!
//! ## Quick Start
//!
//! ### Rigging a File
//!
//! ```no_run
//! use rigsmith::converter::{RigOptions, rig_glb_file};
//! use std::path::Path;
//!
//! let summary = rig_glb_file(
//!     Path::new("knight.glb"),
//!     Path::new("knight_rigged.glb"),
//!     &RigOptions::default(),
//! )?;
//! println!("Added {} bones", summary.bones);
//! # Ok::<(), rigsmith::Error>(())
//! ```
//!
//! ### Working with the Container Directly
//!
//! ```no_run
//! use rigsmith::formats::glb::{read_accessor, read_glb};
//!
//! let glb = read_glb("knight.glb")?;
//! let positions = read_accessor(&glb.document, &glb.payload, 0)?;
//! println!("{} elements", positions.len());
//! # Ok::<(), rigsmith::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `rigsmith` command-line binary

pub mod converter;
pub mod error;
pub mod formats;
pub mod rig;

// Re-exports for convenience
pub use error::{Error, ErrorKind, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::formats::glb::{
        AccessorData, AccessorShape, ComponentType, GlbContainer, GltfDocument, PayloadBuffer,
        parse_glb_bytes, read_accessor, read_glb, write_glb, write_glb_bytes,
    };
    pub use crate::rig::{AnimationClip, Skeleton, SkinWeights};

    pub use crate::converter::rig_glb::{
        RigOptions, RigProgress, RigStage, RigSummary, default_output_path, rig_glb_bytes,
        rig_glb_file,
    };
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
