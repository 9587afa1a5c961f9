//! Joint nodes, inverse-bind matrices and the skin record.

use crate::error::Result;
use crate::formats::glb::{AccessorShape, GltfDocument, GltfNode, GltfSkin, PayloadBuffer};
use crate::rig::skeleton::{Skeleton, bones};

/// Where the skeleton landed in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkinBinding {
    pub skin: usize,
    /// Node index of bone 0; bone `i` is node `first_joint + i`.
    pub first_joint: usize,
}

impl SkinBinding {
    pub fn joint_node(&self, bone: usize) -> usize {
        self.first_joint + bone
    }
}

/// Append one node per bone, the inverse-bind matrices and the skin, then
/// bind every node that shows `mesh` to it.
pub fn append_skin(
    doc: &mut GltfDocument,
    payload: &mut PayloadBuffer,
    skeleton: &Skeleton,
    mesh: usize,
    skin_name: &str,
) -> Result<SkinBinding> {
    let first_joint = doc.nodes.len();

    for (i, bone) in skeleton.bones().iter().enumerate() {
        doc.push_node(GltfNode {
            name: Some(bone.name.to_string()),
            children: skeleton.children(i).map(|c| first_joint + c).collect(),
            translation: Some(skeleton.local_translation(i).to_array().map(f64::from)),
            rotation: Some([0.0, 0.0, 0.0, 1.0]),
            scale: Some([1.0, 1.0, 1.0]),
            ..GltfNode::default()
        });
    }

    let ibm = payload
        .append(&skeleton.inverse_bind_matrices(), AccessorShape::Mat4)?
        .insert(doc);

    let root = first_joint + bones::ROOT;
    let skin = doc.push_skin(GltfSkin {
        name: Some(skin_name.to_string()),
        inverse_bind_matrices: Some(ibm),
        joints: (first_joint..first_joint + skeleton.len()).collect(),
        skeleton: Some(root),
        ..GltfSkin::default()
    });

    let mut bound = 0;
    for node in doc.nodes.iter_mut().filter(|n| n.mesh == Some(mesh)) {
        node.skin = Some(skin);
        bound += 1;
    }

    match doc.default_scene() {
        Some(scene) => doc.scenes[scene].nodes.push(root),
        None => tracing::debug!("Document has no scene; skeleton root {} left unparented", root),
    }

    tracing::debug!(
        "Added skin {} with {} joints (nodes {}..{}), bound to {} node(s)",
        skin,
        skeleton.len(),
        first_joint,
        first_joint + skeleton.len(),
        bound
    );

    Ok(SkinBinding { skin, first_joint })
}
