//! Types for GLB rigging: stages, progress tracking and options
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

use std::fmt;

use crate::error::{Error, Result};

// ============================================================================
// Stages
// ============================================================================

/// Stage of the rigging pipeline. Stages always run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RigStage {
    /// Decode the input container and check its cross-references
    Load,
    /// Find the first node that references a mesh
    LocateMesh,
    /// Read vertex positions and compute the bounding box
    ExtractPositions,
    /// Fit the humanoid skeleton to the bounding box
    BuildSkeleton,
    /// Compute per-vertex joint indices and weights
    SolveWeights,
    /// Append joint nodes, inverse-bind matrices and the skin
    AppendSkinData,
    /// Append `JOINTS_n` / `WEIGHTS_n` attributes
    AppendVertexAttributes,
    /// Generate the clips and append them as animations
    SynthesizeAnimations,
    /// Pad the payload and record its length on buffer 0
    FinalizeBufferLength,
    /// Encode the output container
    Encode,
}

impl RigStage {
    /// Every stage, in execution order.
    pub const ALL: [RigStage; 10] = [
        Self::Load,
        Self::LocateMesh,
        Self::ExtractPositions,
        Self::BuildSkeleton,
        Self::SolveWeights,
        Self::AppendSkinData,
        Self::AppendVertexAttributes,
        Self::SynthesizeAnimations,
        Self::FinalizeBufferLength,
        Self::Encode,
    ];

    /// Stage name as used in error messages
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Load => "Load",
            Self::LocateMesh => "Locate-Mesh",
            Self::ExtractPositions => "Extract-Positions",
            Self::BuildSkeleton => "Build-Skeleton",
            Self::SolveWeights => "Solve-Weights",
            Self::AppendSkinData => "Append-Skin-Data",
            Self::AppendVertexAttributes => "Append-Vertex-Attributes",
            Self::SynthesizeAnimations => "Synthesize-And-Append-Animations",
            Self::FinalizeBufferLength => "Finalize-Buffer-Length",
            Self::Encode => "Encode",
        }
    }

    /// Human-readable description for progress output
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Load => "Loading container",
            Self::LocateMesh => "Locating mesh",
            Self::ExtractPositions => "Reading vertex positions",
            Self::BuildSkeleton => "Building skeleton",
            Self::SolveWeights => "Solving skin weights",
            Self::AppendSkinData => "Adding skin",
            Self::AppendVertexAttributes => "Adding joint and weight attributes",
            Self::SynthesizeAnimations => "Adding animations",
            Self::FinalizeBufferLength => "Finalizing buffer",
            Self::Encode => "Writing output",
        }
    }

    /// 1-based position in [`RigStage::ALL`]
    #[must_use]
    pub fn number(self) -> usize {
        self as usize + 1
    }
}

impl fmt::Display for RigStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Progress Types
// ============================================================================

/// Progress callback type for rigging operations
pub type RigProgressCallback<'a> = &'a (dyn Fn(&RigProgress) + Sync + Send);

/// Progress information during a rigging run
#[derive(Debug, Clone)]
pub struct RigProgress {
    /// Stage about to run
    pub stage: RigStage,
    /// Current stage number (1-indexed)
    pub current: usize,
    /// Total number of stages
    pub total: usize,
    /// Extra detail, such as the file being read
    pub detail: Option<String>,
}

impl RigProgress {
    /// Create a progress update for `stage`
    #[must_use]
    pub fn new(stage: RigStage) -> Self {
        Self {
            stage,
            current: stage.number(),
            total: RigStage::ALL.len(),
            detail: None,
        }
    }

    /// Create a progress update with a detail line
    #[must_use]
    pub fn with_detail(stage: RigStage, detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::new(stage)
        }
    }

    /// Get the progress percentage (0.0 - 1.0)
    #[must_use]
    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.current as f32 / self.total as f32
        }
    }
}

// ============================================================================
// Options
// ============================================================================

/// Largest supported influence count (two VEC4 attribute sets)
pub const MAX_INFLUENCES_LIMIT: usize = 8;

/// Tuning for a rigging run
#[derive(Debug, Clone, PartialEq)]
pub struct RigOptions {
    /// Bones bound to each vertex (1..=8). Above 4 spills into `JOINTS_1`.
    pub max_influences: usize,
    /// Added to each bone distance before inverting it.
    pub weight_epsilon: f32,
    /// Name of the generated skin
    pub skin_name: String,
}

impl Default for RigOptions {
    fn default() -> Self {
        Self {
            max_influences: 4,
            weight_epsilon: 0.001,
            skin_name: "Armature".to_string(),
        }
    }
}

impl RigOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_influences(mut self, max_influences: usize) -> Self {
        self.max_influences = max_influences;
        self
    }

    #[must_use]
    pub fn with_weight_epsilon(mut self, weight_epsilon: f32) -> Self {
        self.weight_epsilon = weight_epsilon;
        self
    }

    #[must_use]
    pub fn with_skin_name(mut self, skin_name: impl Into<String>) -> Self {
        self.skin_name = skin_name.into();
        self
    }

    /// Check every option is in range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] naming the first bad option.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_INFLUENCES_LIMIT).contains(&self.max_influences) {
            return Err(Error::InvalidOption {
                name: "max_influences",
                message: format!(
                    "{} is outside 1..={MAX_INFLUENCES_LIMIT}",
                    self.max_influences
                ),
            });
        }
        if !(self.weight_epsilon.is_finite() && self.weight_epsilon > 0.0) {
            return Err(Error::InvalidOption {
                name: "weight_epsilon",
                message: format!("{} must be a positive finite number", self.weight_epsilon),
            });
        }
        if self.skin_name.trim().is_empty() {
            return Err(Error::InvalidOption {
                name: "skin_name",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Summary
// ============================================================================

/// What a rigging run added to the asset
#[derive(Debug, Clone, PartialEq)]
pub struct RigSummary {
    /// Mesh that was rigged
    pub mesh: usize,
    /// Primitives that received skin attributes
    pub primitives: usize,
    /// Vertices bound across those primitives
    pub vertices: usize,
    /// Joint nodes added
    pub bones: usize,
    /// Index of the new skin
    pub skin: usize,
    /// Names of the animations added, in order
    pub clips: Vec<&'static str>,
    /// Final binary payload length in bytes
    pub payload_bytes: usize,
}
