//! glTF 2.0 scene-graph records.
//!
//! Only the members the rigging pipeline reads or writes are modelled as
//! fields. Everything else (materials, textures, cameras, extensions, extras)
//! lands in each record's `extra` map and is written back untouched.
//! Modelled numbers the pipeline only passes through (node transforms,
//! accessor bounds) keep full JSON precision as `f64`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Pass-through members not modelled by a record.
pub type Extra = Map<String, Value>;

/// Asset metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GltfAsset {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Default for GltfAsset {
    fn default() -> Self {
        Self {
            version: "2.0".to_string(),
            generator: None,
            extra: Extra::new(),
        }
    }
}

/// Scene definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GltfScene {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<usize>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Node in the scene graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GltfNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f64; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<[f64; 3]>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Skin for skeletal animation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GltfSkin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        rename = "inverseBindMatrices",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub inverse_bind_matrices: Option<usize>,
    pub joints: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<usize>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Mesh definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GltfMesh {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub primitives: Vec<GltfPrimitive>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Mesh primitive (geometry + material)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GltfPrimitive {
    pub attributes: IndexMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<usize>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Accessor for typed buffer data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GltfAccessor {
    #[serde(rename = "bufferView", default, skip_serializing_if = "Option::is_none")]
    pub buffer_view: Option<usize>,
    #[serde(rename = "byteOffset", default, skip_serializing_if = "is_zero")]
    pub byte_offset: usize,
    #[serde(rename = "componentType")]
    pub component_type: u32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub normalized: bool,
    pub count: usize,
    #[serde(rename = "type")]
    pub accessor_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Vec<f64>>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Buffer view (slice of a buffer)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GltfBufferView {
    pub buffer: usize,
    #[serde(rename = "byteOffset", default, skip_serializing_if = "is_zero")]
    pub byte_offset: usize,
    #[serde(rename = "byteLength")]
    pub byte_length: usize,
    #[serde(rename = "byteStride", default, skip_serializing_if = "Option::is_none")]
    pub byte_stride: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Binary buffer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GltfBuffer {
    #[serde(rename = "byteLength")]
    pub byte_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Keyframe animation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GltfAnimation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub channels: Vec<GltfChannel>,
    pub samplers: Vec<GltfAnimationSampler>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Binds a sampler to one node property
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GltfChannel {
    pub sampler: usize,
    pub target: GltfChannelTarget,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Animated node and property (`translation`, `rotation`, `scale`, `weights`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GltfChannelTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<usize>,
    pub path: String,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Keyframe times + values and their interpolation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GltfAnimationSampler {
    pub input: usize,
    #[serde(default = "default_interpolation")]
    pub interpolation: String,
    pub output: usize,
    #[serde(flatten)]
    pub extra: Extra,
}

fn default_interpolation() -> String {
    "LINEAR".to_string()
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &usize) -> bool {
    *value == 0
}

/// Complete glTF document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GltfDocument {
    pub asset: GltfAsset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenes: Vec<GltfScene>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<GltfNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meshes: Vec<GltfMesh>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skins: Vec<GltfSkin>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub animations: Vec<GltfAnimation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessors: Vec<GltfAccessor>,
    #[serde(rename = "bufferViews", default, skip_serializing_if = "Vec::is_empty")]
    pub buffer_views: Vec<GltfBufferView>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffers: Vec<GltfBuffer>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Checks `index < len`, naming the referrer on failure.
fn check(index: usize, len: usize, kind: &'static str, referrer: impl FnOnce() -> String) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(Error::DanglingIndex {
            referrer: referrer(),
            kind,
            index,
            len,
        })
    }
}

impl GltfDocument {
    /// Index of the scene shown by default: `scene` if set, else the first one.
    pub fn default_scene(&self) -> Option<usize> {
        match self.scene {
            Some(idx) => Some(idx),
            None if !self.scenes.is_empty() => Some(0),
            None => None,
        }
    }

    pub fn push_node(&mut self, node: GltfNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn push_buffer_view(&mut self, view: GltfBufferView) -> usize {
        self.buffer_views.push(view);
        self.buffer_views.len() - 1
    }

    pub fn push_accessor(&mut self, accessor: GltfAccessor) -> usize {
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    pub fn push_skin(&mut self, skin: GltfSkin) -> usize {
        self.skins.push(skin);
        self.skins.len() - 1
    }

    pub fn push_animation(&mut self, animation: GltfAnimation) -> usize {
        self.animations.push(animation);
        self.animations.len() - 1
    }

    /// Verify that every typed cross-reference points inside its target array.
    ///
    /// References into unmodelled arrays (materials, cameras) are not checked.
    pub fn validate(&self) -> Result<()> {
        let nodes = self.nodes.len();
        let accessors = self.accessors.len();

        if let Some(scene) = self.scene {
            check(scene, self.scenes.len(), "scene", || "document".to_string())?;
        }
        for (s, scene) in self.scenes.iter().enumerate() {
            for &n in &scene.nodes {
                check(n, nodes, "node", || format!("scene {s}"))?;
            }
        }

        for (n, node) in self.nodes.iter().enumerate() {
            if let Some(mesh) = node.mesh {
                check(mesh, self.meshes.len(), "mesh", || format!("node {n}"))?;
            }
            if let Some(skin) = node.skin {
                check(skin, self.skins.len(), "skin", || format!("node {n}"))?;
            }
            for &child in &node.children {
                check(child, nodes, "node", || format!("node {n}"))?;
            }
        }

        for (m, mesh) in self.meshes.iter().enumerate() {
            for (p, primitive) in mesh.primitives.iter().enumerate() {
                for (semantic, &acc) in &primitive.attributes {
                    check(acc, accessors, "accessor", || {
                        format!("mesh {m} primitive {p} {semantic}")
                    })?;
                }
                if let Some(indices) = primitive.indices {
                    check(indices, accessors, "accessor", || {
                        format!("mesh {m} primitive {p} indices")
                    })?;
                }
            }
        }

        for (a, accessor) in self.accessors.iter().enumerate() {
            if let Some(view) = accessor.buffer_view {
                check(view, self.buffer_views.len(), "bufferView", || format!("accessor {a}"))?;
            }
        }

        for (v, view) in self.buffer_views.iter().enumerate() {
            check(view.buffer, self.buffers.len(), "buffer", || format!("bufferView {v}"))?;
        }

        for (s, skin) in self.skins.iter().enumerate() {
            if let Some(ibm) = skin.inverse_bind_matrices {
                check(ibm, accessors, "accessor", || format!("skin {s}"))?;
            }
            if let Some(root) = skin.skeleton {
                check(root, nodes, "node", || format!("skin {s} skeleton"))?;
            }
            for &joint in &skin.joints {
                check(joint, nodes, "node", || format!("skin {s} joints"))?;
            }
        }

        for (a, animation) in self.animations.iter().enumerate() {
            for (c, channel) in animation.channels.iter().enumerate() {
                check(channel.sampler, animation.samplers.len(), "sampler", || {
                    format!("animation {a} channel {c}")
                })?;
                if let Some(node) = channel.target.node {
                    check(node, nodes, "node", || format!("animation {a} channel {c}"))?;
                }
            }
            for (s, sampler) in animation.samplers.iter().enumerate() {
                check(sampler.input, accessors, "accessor", || {
                    format!("animation {a} sampler {s} input")
                })?;
                check(sampler.output, accessors, "accessor", || {
                    format!("animation {a} sampler {s} output")
                })?;
            }
        }

        Ok(())
    }
}
