//! Humanoid skeleton fitted to a mesh bounding box.
//!
//! The topology is fixed. Each rest position is a fraction of the box's
//! width and height measured from the X/Z centre and the bottom of the box
//! (Y-up). "Left" is +X.

use glam::{Mat4, Vec3};

/// Bone indices into [`HUMANOID`], for animation targets.
pub mod bones {
    pub const ROOT: usize = 0;
    pub const HIPS: usize = 1;
    pub const SPINE: usize = 2;
    pub const CHEST: usize = 3;
    pub const HEAD: usize = 4;
    pub const LEFT_SHOULDER: usize = 5;
    pub const LEFT_ARM: usize = 6;
    pub const LEFT_FOREARM: usize = 7;
    pub const LEFT_HAND: usize = 8;
    pub const RIGHT_SHOULDER: usize = 9;
    pub const RIGHT_ARM: usize = 10;
    pub const RIGHT_FOREARM: usize = 11;
    pub const RIGHT_HAND: usize = 12;
    pub const LEFT_UP_LEG: usize = 13;
    pub const LEFT_LEG: usize = 14;
    pub const LEFT_FOOT: usize = 15;
    pub const RIGHT_UP_LEG: usize = 16;
    pub const RIGHT_LEG: usize = 17;
    pub const RIGHT_FOOT: usize = 18;
}

/// One row of the humanoid table.
#[derive(Debug, Clone, Copy)]
pub struct BoneTemplate {
    pub name: &'static str,
    /// Signed fraction of the box width, from the X centre.
    pub width_fraction: f32,
    /// Fraction of the box height, from the bottom.
    pub height_fraction: f32,
    pub parent: Option<usize>,
}

const fn bone(
    name: &'static str,
    width_fraction: f32,
    height_fraction: f32,
    parent: Option<usize>,
) -> BoneTemplate {
    BoneTemplate {
        name,
        width_fraction,
        height_fraction,
        parent,
    }
}

/// Number of bones in the humanoid skeleton.
pub const BONE_COUNT: usize = 19;

/// The humanoid topology, parents first.
pub const HUMANOID: [BoneTemplate; BONE_COUNT] = [
    bone("Root", 0.0, 0.0, None),
    bone("Hips", 0.0, 0.45, Some(bones::ROOT)),
    bone("Spine", 0.0, 0.55, Some(bones::HIPS)),
    bone("Chest", 0.0, 0.65, Some(bones::SPINE)),
    bone("Head", 0.0, 0.90, Some(bones::CHEST)),
    // Left arm
    bone("LeftShoulder", 0.25, 0.75, Some(bones::CHEST)),
    bone("LeftArm", 0.35, 0.65, Some(bones::LEFT_SHOULDER)),
    bone("LeftForearm", 0.40, 0.50, Some(bones::LEFT_ARM)),
    bone("LeftHand", 0.45, 0.35, Some(bones::LEFT_FOREARM)),
    // Right arm
    bone("RightShoulder", -0.25, 0.75, Some(bones::CHEST)),
    bone("RightArm", -0.35, 0.65, Some(bones::RIGHT_SHOULDER)),
    bone("RightForearm", -0.40, 0.50, Some(bones::RIGHT_ARM)),
    bone("RightHand", -0.45, 0.35, Some(bones::RIGHT_FOREARM)),
    // Left leg
    bone("LeftUpLeg", 0.12, 0.45, Some(bones::HIPS)),
    bone("LeftLeg", 0.12, 0.25, Some(bones::LEFT_UP_LEG)),
    bone("LeftFoot", 0.12, 0.05, Some(bones::LEFT_LEG)),
    // Right leg
    bone("RightUpLeg", -0.12, 0.45, Some(bones::HIPS)),
    bone("RightLeg", -0.12, 0.25, Some(bones::RIGHT_UP_LEG)),
    bone("RightFoot", -0.12, 0.05, Some(bones::RIGHT_LEG)),
];

const fn parents_precede_children(table: &[BoneTemplate]) -> bool {
    let mut i = 0;
    while i < table.len() {
        match table[i].parent {
            Some(parent) if parent >= i => return false,
            None if i != 0 => return false,
            _ => {}
        }
        i += 1;
    }
    true
}

const _: () = assert!(
    parents_precede_children(&HUMANOID),
    "humanoid table must list every parent before its children, with a single root first"
);

/// A bone in its rest pose.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: &'static str,
    /// World-space rest position.
    pub position: Vec3,
    pub parent: Option<usize>,
}

/// A topologically sorted bone list (parent index < child index).
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    bones: Vec<Bone>,
}

impl Skeleton {
    /// Fit the humanoid table to the box `min..max`.
    #[must_use]
    pub fn humanoid(min: Vec3, max: Vec3) -> Self {
        let width = max.x - min.x;
        let height = max.y - min.y;
        let center_x = (min.x + max.x) / 2.0;
        let center_z = (min.z + max.z) / 2.0;

        let bones = HUMANOID
            .iter()
            .map(|t| Bone {
                name: t.name,
                position: Vec3::new(
                    center_x + width * t.width_fraction,
                    min.y + height * t.height_fraction,
                    center_z,
                ),
                parent: t.parent,
            })
            .collect();

        Self { bones }
    }

    #[must_use]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// World-space rest positions, in bone order.
    #[must_use]
    pub fn positions(&self) -> Vec<Vec3> {
        self.bones.iter().map(|b| b.position).collect()
    }

    /// Rest position relative to the parent (the node translation).
    #[must_use]
    pub fn local_translation(&self, index: usize) -> Vec3 {
        let bone = &self.bones[index];
        match bone.parent {
            Some(parent) => bone.position - self.bones[parent].position,
            None => bone.position,
        }
    }

    /// Indices of the direct children of `index`, in ascending order.
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(move |(_, b)| b.parent == Some(index))
            .map(|(i, _)| i)
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// One column-major inverse-bind matrix per bone, flattened.
    ///
    /// Bones carry no rest rotation, so each is the inverse translation of
    /// the world rest position.
    #[must_use]
    pub fn inverse_bind_matrices(&self) -> Vec<f32> {
        self.bones
            .iter()
            .flat_map(|b| Mat4::from_translation(-b.position).to_cols_array())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Skeleton {
        Skeleton::humanoid(Vec3::new(-1.0, 0.0, -0.5), Vec3::new(1.0, 2.0, 0.5))
    }

    #[test]
    fn test_humanoid_layout() {
        let skeleton = unit_box();
        assert_eq!(skeleton.len(), BONE_COUNT);

        let hips = &skeleton.bones()[bones::HIPS];
        assert_eq!(hips.name, "Hips");
        assert!((hips.position.y - 0.9).abs() < 1e-6);

        let left = skeleton.bones()[bones::LEFT_SHOULDER].position;
        let right = skeleton.bones()[bones::RIGHT_SHOULDER].position;
        assert!((left.x - 0.5).abs() < 1e-6);
        assert!((right.x + 0.5).abs() < 1e-6);
        assert!(skeleton.bones().iter().all(|b| b.position.z == 0.0));
    }

    #[test]
    fn test_topological_order() {
        let skeleton = unit_box();
        for (i, bone) in skeleton.bones().iter().enumerate() {
            if let Some(parent) = bone.parent {
                assert!(parent < i, "{} precedes its parent", bone.name);
            }
        }
        assert_eq!(skeleton.bones().iter().filter(|b| b.parent.is_none()).count(), 1);
    }

    #[test]
    fn test_local_translation_sums_to_world() {
        let skeleton = unit_box();
        let hand = bones::LEFT_HAND;
        let mut world = Vec3::ZERO;
        let mut cursor = Some(hand);
        while let Some(i) = cursor {
            world += skeleton.local_translation(i);
            cursor = skeleton.bones()[i].parent;
        }
        assert!(world.abs_diff_eq(skeleton.bones()[hand].position, 1e-6));
    }

    #[test]
    fn test_children_and_find() {
        let skeleton = unit_box();
        let chest: Vec<usize> = skeleton.children(bones::CHEST).collect();
        assert_eq!(
            chest,
            vec![bones::HEAD, bones::LEFT_SHOULDER, bones::RIGHT_SHOULDER]
        );
        assert_eq!(skeleton.find("RightFoot"), Some(bones::RIGHT_FOOT));
        assert_eq!(skeleton.find("Neck"), None);
    }

    #[test]
    fn test_inverse_bind_is_negated_translation() {
        let skeleton = unit_box();
        let ibm = skeleton.inverse_bind_matrices();
        assert_eq!(ibm.len(), BONE_COUNT * 16);

        let head = skeleton.bones()[bones::HEAD].position;
        let m = &ibm[bones::HEAD * 16..bones::HEAD * 16 + 16];
        assert_eq!(&m[0..12], &[1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(&m[12..16], &[-head.x, -head.y, -head.z, 1.0]);
    }

    #[test]
    fn test_flat_box_collapses_heights() {
        let skeleton = Skeleton::humanoid(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0));
        assert!(skeleton.bones().iter().all(|b| b.position.y == 0.0));
    }
}
