//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT
//!
//! Rig a static GLB mesh
//!
//! Adds a humanoid skeleton fitted to the mesh bounds, per-vertex skin
//! weights and three animations (Idle, Walk, Attack) to an existing
//! container, keeping everything else in the document untouched.

mod animation;
mod convert;
mod skin;
pub mod types;
mod vertex_attributes;

// Re-export stage, progress and option types
pub use types::{
    MAX_INFLUENCES_LIMIT, RigOptions, RigProgress, RigProgressCallback, RigStage, RigSummary,
};

// Re-export pipeline entry points
pub use convert::{
    default_output_path, rig_container, rig_glb_bytes, rig_glb_bytes_with_progress,
    rig_glb_file, rig_glb_file_with_progress,
};
