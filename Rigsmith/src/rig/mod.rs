//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT
//!
//! Procedural rigging: skeleton fitting, skin weights and animation clips
//!
//! Everything here is pure and works on plain geometry; nothing touches the
//! glTF document. See [`crate::converter::rig_glb`] for the merge step.

pub mod animation;
pub mod skeleton;
pub mod skinning;

pub use animation::{AnimationClip, Channel, ChannelPath, ChannelValues, quat_from_euler, synthesize};
pub use skeleton::{BONE_COUNT, Bone, Skeleton, bones};
pub use skinning::{SkinWeights, solve as solve_skin_weights};

use glam::Vec3;

/// Axis-aligned bounding box of `points`, or `None` if there are none.
pub fn bounds(points: &[Vec3]) -> Option<(Vec3, Vec3)> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        let points = [Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, -2.0, 0.5), Vec3::new(-1.0, 3.0, 0.0)];
        let (min, max) = bounds(&points).unwrap();
        assert_eq!(min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(max, Vec3::new(1.0, 3.0, 0.5));
        assert!(bounds(&[]).is_none());
    }
}
