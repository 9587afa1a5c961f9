//! Animation clips to glTF animations.

use crate::error::Result;
use crate::formats::glb::{
    AccessorShape, GltfAnimation, GltfAnimationSampler, GltfChannel, GltfChannelTarget,
    GltfDocument, PayloadBuffer,
};
use crate::rig::animation::{AnimationClip, ChannelValues};

use super::skin::SkinBinding;

/// Append one animation per clip, targeting the joint nodes of `binding`.
///
/// Consecutive channels with identical sample times share one input
/// accessor. Returns the new animation indices.
pub fn append_animations(
    doc: &mut GltfDocument,
    payload: &mut PayloadBuffer,
    clips: &[AnimationClip],
    binding: SkinBinding,
) -> Result<Vec<usize>> {
    let mut added = Vec::with_capacity(clips.len());
    let mut last_input: Option<(&[f32], usize)> = None;

    for clip in clips {
        let mut animation = GltfAnimation {
            name: Some(clip.name.to_string()),
            ..GltfAnimation::default()
        };

        for channel in &clip.channels {
            let input = match last_input {
                Some((times, idx)) if times == channel.times.as_slice() => idx,
                _ => {
                    let idx = payload
                        .append(&channel.times, AccessorShape::Scalar)?
                        .insert(doc);
                    last_input = Some((&channel.times, idx));
                    idx
                }
            };

            let shape = match channel.values {
                ChannelValues::Translation(_) => AccessorShape::Vec3,
                ChannelValues::Rotation(_) => AccessorShape::Vec4,
            };
            let output = payload.append(channel.values.flat(), shape)?.insert(doc);

            animation.samplers.push(GltfAnimationSampler {
                input,
                interpolation: "LINEAR".to_string(),
                output,
                extra: serde_json::Map::new(),
            });
            animation.channels.push(GltfChannel {
                sampler: animation.samplers.len() - 1,
                target: GltfChannelTarget {
                    node: Some(binding.joint_node(channel.bone)),
                    path: channel.values.path().as_str().to_string(),
                    ..GltfChannelTarget::default()
                },
                ..GltfChannel::default()
            });
        }

        tracing::debug!(
            "Added animation '{}' ({} channels, {:.2}s)",
            clip.name,
            animation.channels.len(),
            clip.duration
        );
        added.push(doc.push_animation(animation));
    }

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::glb::{AccessorData, GltfBuffer, read_accessor};
    use crate::rig::animation::synthesize;
    use crate::rig::skeleton::Skeleton;
    use glam::Vec3;

    #[test]
    fn test_clips_become_animations() {
        let skeleton = Skeleton::humanoid(Vec3::ZERO, Vec3::new(1.0, 2.0, 1.0));
        let clips = synthesize(&skeleton, 2.0);
        let mut doc = GltfDocument {
            buffers: vec![GltfBuffer::default()],
            ..GltfDocument::default()
        };
        for _ in 0..skeleton.len() {
            doc.push_node(crate::formats::glb::GltfNode::default());
        }
        let mut payload = PayloadBuffer::new();
        let binding = SkinBinding {
            skin: 0,
            first_joint: 0,
        };

        let added = append_animations(&mut doc, &mut payload, &clips, binding).unwrap();
        assert_eq!(added, vec![0, 1, 2]);

        let names: Vec<_> = doc.animations.iter().filter_map(|a| a.name.as_deref()).collect();
        assert_eq!(names, vec!["Idle", "Walk", "Attack"]);

        // Each clip samples every channel at the same times: one input per clip.
        for animation in &doc.animations {
            let first = animation.samplers[0].input;
            assert!(animation.samplers.iter().all(|s| s.input == first));
            let times = &doc.accessors[first];
            assert_eq!(times.min, Some(vec![0.0]));
            assert!(times.max.is_some());
        }

        let walk = &doc.animations[1];
        assert_eq!(walk.channels[0].target.path, "translation");
        assert_eq!(walk.channels[1].target.path, "rotation");

        let attack_input = doc.animations[2].samplers[0].input;
        match read_accessor(&doc, payload.as_slice(), attack_input).unwrap() {
            AccessorData::Scalar(times) => {
                assert_eq!(times.len(), 16);
                assert_eq!(
                    doc.accessors[attack_input].max,
                    Some(vec![f64::from(times[15])])
                );
            }
            other => panic!("expected scalars, got {:?}", other.shape()),
        }

        assert!(doc.validate().is_ok());
    }
}
