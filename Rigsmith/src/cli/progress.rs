//! CLI progress display utilities
//!
//! Step indicators with emojis for each rigging stage, and a completion line.

use std::time::Duration;

use console::{Emoji, style};
use indicatif::{HumanBytes, HumanDuration};

use crate::converter::rig_glb::{RigProgress, RigStage};

// =============================================================================
// Emoji Constants (with ASCII fallbacks for terminals without emoji support)
// =============================================================================

/// Magnifying glass - for reading/scanning operations
pub static LOOKING_GLASS: Emoji<'_, '_> = Emoji("\u{1F50D} ", "");
/// Triangular ruler - for geometry operations
pub static RULER: Emoji<'_, '_> = Emoji("\u{1F4D0} ", "");
/// Bone - for skeleton and skinning operations
pub static BONE: Emoji<'_, '_> = Emoji("\u{1F9B4} ", "");
/// Clapper board - for animation operations
pub static CLAPPER: Emoji<'_, '_> = Emoji("\u{1F3AC} ", "");
/// Gear - for bookkeeping operations
pub static GEAR: Emoji<'_, '_> = Emoji("\u{2699}\u{FE0F}  ", "");
/// Floppy disk - for writing/saving operations
pub static DISK: Emoji<'_, '_> = Emoji("\u{1F4BE} ", "");
/// Sparkles - for completion
pub static SPARKLE: Emoji<'_, '_> = Emoji("\u{2728} ", "");

/// Emoji shown next to `stage`.
#[must_use]
pub fn stage_emoji(stage: RigStage) -> Emoji<'static, 'static> {
    match stage {
        RigStage::Load | RigStage::LocateMesh => LOOKING_GLASS,
        RigStage::ExtractPositions => RULER,
        RigStage::BuildSkeleton | RigStage::SolveWeights | RigStage::AppendSkinData => BONE,
        RigStage::AppendVertexAttributes | RigStage::FinalizeBufferLength => GEAR,
        RigStage::SynthesizeAnimations => CLAPPER,
        RigStage::Encode => DISK,
    }
}

// =============================================================================
// Step-Based Progress
// =============================================================================

/// Print a step indicator: `[1/3] 🔍 Message...`
pub fn print_step(current: usize, total: usize, emoji: Emoji, msg: &str) {
    println!(
        "{} {}{}",
        style(format!("[{current}/{total}]")).bold().dim(),
        emoji,
        msg
    );
}

/// Print a rigging progress update as a step line.
pub fn print_progress(progress: &RigProgress) {
    let msg = match &progress.detail {
        Some(detail) => format!("{}... {}", progress.stage.description(), style(detail).dim()),
        None => format!("{}...", progress.stage.description()),
    };
    print_step(
        progress.current,
        progress.total,
        stage_emoji(progress.stage),
        &msg,
    );
}

/// Print a labelled summary line: `      Bones: 19`
pub fn print_detail(label: &str, value: &str) {
    println!("{:>12} {}", style(label).cyan(), value);
}

/// Format a byte count for summary lines.
#[must_use]
pub fn human_bytes(bytes: usize) -> String {
    HumanBytes(bytes as u64).to_string()
}

/// Print completion message: `✨ Done in 2s`
pub fn print_done(elapsed: Duration) {
    println!("{} Done in {}", SPARKLE, HumanDuration(elapsed));
}
