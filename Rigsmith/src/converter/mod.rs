//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT
//!
//! Asset conversions
//!
//! - GLB → rigged GLB: skeleton, skin weights and animations for a static mesh

pub mod rig_glb;

pub use rig_glb::{
    RigOptions, RigProgress, RigProgressCallback, RigStage, RigSummary, default_output_path,
    rig_glb_bytes, rig_glb_bytes_with_progress, rig_glb_file, rig_glb_file_with_progress,
};
