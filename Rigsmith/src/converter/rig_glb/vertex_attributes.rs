//! `JOINTS_n` / `WEIGHTS_n` vertex attributes.

use crate::error::Result;
use crate::formats::glb::{AccessorShape, GltfDocument, PayloadBuffer};
use crate::rig::skinning::SkinWeights;

/// Add skin attributes to primitive `primitive` of `mesh`.
///
/// Four influences fit in `JOINTS_0` / `WEIGHTS_0`; more spill into
/// `JOINTS_1` / `WEIGHTS_1`. Returns the number of attribute sets written.
pub fn append_skin_attributes(
    doc: &mut GltfDocument,
    payload: &mut PayloadBuffer,
    mesh: usize,
    primitive: usize,
    weights: &SkinWeights,
) -> Result<usize> {
    let sets = weights.vec4_sets();

    for (set, (joints, set_weights)) in sets.iter().enumerate() {
        let joints_idx = payload
            .append_vertex_attribute(joints, AccessorShape::Vec4)?
            .insert(doc);
        let weights_idx = payload
            .append_vertex_attribute(set_weights, AccessorShape::Vec4)?
            .insert(doc);

        let attributes = &mut doc.meshes[mesh].primitives[primitive].attributes;
        let semantics = [
            (format!("JOINTS_{set}"), joints_idx),
            (format!("WEIGHTS_{set}"), weights_idx),
        ];
        for (semantic, idx) in semantics {
            if let Some(previous) = attributes.insert(semantic.clone(), idx) {
                tracing::warn!(
                    "Mesh {} primitive {}: replacing existing {} (accessor {})",
                    mesh,
                    primitive,
                    semantic,
                    previous
                );
            }
        }
    }

    Ok(sets.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::glb::{
        AccessorData, GltfBuffer, GltfMesh, GltfPrimitive, accessor::TARGET_ARRAY_BUFFER,
        read_accessor,
    };
    use crate::rig::skinning::solve;
    use glam::Vec3;

    fn one_primitive_doc() -> GltfDocument {
        GltfDocument {
            meshes: vec![GltfMesh {
                primitives: vec![GltfPrimitive::default()],
                ..GltfMesh::default()
            }],
            buffers: vec![GltfBuffer::default()],
            ..GltfDocument::default()
        }
    }

    fn bones() -> Vec<Vec3> {
        (0..6).map(|i| Vec3::new(0.0, i as f32, 0.0)).collect()
    }

    #[test]
    fn test_four_influences_single_set() {
        let mut doc = one_primitive_doc();
        let mut payload = PayloadBuffer::from(vec![0xFF; 3]);
        let positions = [Vec3::ZERO, Vec3::Y, Vec3::new(0.0, 2.5, 0.0)];
        let skin = solve(&positions, &bones(), 4, 0.001);

        let sets = append_skin_attributes(&mut doc, &mut payload, 0, 0, &skin).unwrap();
        assert_eq!(sets, 1);

        let attributes = &doc.meshes[0].primitives[0].attributes;
        let joints = attributes["JOINTS_0"];
        let weights = attributes["WEIGHTS_0"];
        assert_eq!(doc.accessors[joints].component_type, 5121);
        assert_eq!(doc.accessors[joints].count, 3);
        assert_eq!(doc.accessors[weights].component_type, 5126);

        let joint_view = &doc.buffer_views[doc.accessors[joints].buffer_view.unwrap()];
        assert_eq!(joint_view.byte_offset, 4);
        assert_eq!(joint_view.byte_stride, Some(4));
        assert_eq!(joint_view.target, Some(TARGET_ARRAY_BUFFER));
        let weight_view = &doc.buffer_views[doc.accessors[weights].buffer_view.unwrap()];
        assert_eq!(weight_view.byte_stride, Some(16));
        assert_eq!(weight_view.byte_offset % 4, 0);

        match read_accessor(&doc, payload.as_slice(), weights).unwrap() {
            AccessorData::Vec4(rows) => {
                for row in rows {
                    let sum: f32 = row.iter().sum();
                    assert!((sum - 1.0).abs() < 1e-5);
                }
            }
            other => panic!("expected VEC4, got {:?}", other.shape()),
        }
    }

    #[test]
    fn test_six_influences_spill_into_second_set() {
        let mut doc = one_primitive_doc();
        let mut payload = PayloadBuffer::new();
        let skin = solve(&[Vec3::new(0.0, 1.2, 0.0)], &bones(), 6, 0.001);

        let sets = append_skin_attributes(&mut doc, &mut payload, 0, 0, &skin).unwrap();
        assert_eq!(sets, 2);
        let attributes = &doc.meshes[0].primitives[0].attributes;
        let keys: Vec<_> = attributes.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["JOINTS_0", "WEIGHTS_0", "JOINTS_1", "WEIGHTS_1"]);
        assert!(doc.validate().is_ok());
    }
}
