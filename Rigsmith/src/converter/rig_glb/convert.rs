//! The rigging pipeline: decode, fit a skeleton, skin, animate, encode.
//!
//! Stages run strictly in [`RigStage::ALL`] order over a single in-memory
//! document. Any failure is tagged with its stage and nothing is written.

use std::path::{Path, PathBuf};

use glam::Vec3;

use super::animation::append_animations;
use super::skin::append_skin;
use super::types::{RigOptions, RigProgress, RigProgressCallback, RigStage, RigSummary};
use super::vertex_attributes::append_skin_attributes;
use crate::error::{Error, Result};
use crate::formats::glb::accessor::PAYLOAD_ALIGNMENT;
use crate::formats::glb::{
    AccessorData, GlbContainer, GltfBuffer, GltfDocument, PayloadBuffer, parse_glb_bytes,
    read_accessor, write_glb, write_glb_bytes,
};
use crate::rig::animation::synthesize;
use crate::rig::bounds;
use crate::rig::skeleton::Skeleton;
use crate::rig::skinning::{self, SkinWeights};

/// Rig a GLB held in memory.
///
/// # Errors
/// Returns an error if the options are invalid or any stage fails.
pub fn rig_glb_bytes(input: &[u8], options: &RigOptions) -> Result<Vec<u8>> {
    rig_glb_bytes_with_progress(input, options, &|_| {})
}

/// Rig a GLB held in memory with progress callback.
///
/// # Errors
/// Returns an error if the options are invalid or any stage fails.
pub fn rig_glb_bytes_with_progress(
    input: &[u8],
    options: &RigOptions,
    progress: RigProgressCallback,
) -> Result<Vec<u8>> {
    options.validate()?;

    let container = run_stage(RigProgress::new(RigStage::Load), progress, || load(input))?;
    let (rigged, _) = rig_container(container, options, progress)?;

    run_stage(RigProgress::new(RigStage::Encode), progress, || {
        write_glb_bytes(&rigged.document, &rigged.payload)
    })
}

/// Rig a .glb file, writing the result to `output`.
///
/// The output is written atomically and only once every stage before
/// Encode has succeeded.
///
/// # Errors
/// Returns an error if the options are invalid, the input cannot be read,
/// any stage fails or the output cannot be written.
pub fn rig_glb_file(input: &Path, output: &Path, options: &RigOptions) -> Result<RigSummary> {
    rig_glb_file_with_progress(input, output, options, &|_| {})
}

/// Rig a .glb file with progress callback.
///
/// # Errors
/// Returns an error if the options are invalid, the input cannot be read,
/// any stage fails or the output cannot be written.
pub fn rig_glb_file_with_progress(
    input: &Path,
    output: &Path,
    options: &RigOptions,
    progress: RigProgressCallback,
) -> Result<RigSummary> {
    tracing::info!("Rigging {:?} → {:?}", input, output);
    options.validate()?;

    let load_step = RigProgress::with_detail(RigStage::Load, input.display().to_string());
    let container = run_stage(load_step, progress, || {
        let data = std::fs::read(input)?;
        load(&data)
    })?;

    let (rigged, summary) = rig_container(container, options, progress)?;

    let encode_step = RigProgress::with_detail(RigStage::Encode, output.display().to_string());
    run_stage(encode_step, progress, || {
        write_glb(output, &rigged.document, &rigged.payload)
    })?;

    tracing::info!(
        "Rigged mesh {}: {} vertices, {} bones, {} animations",
        summary.mesh,
        summary.vertices,
        summary.bones,
        summary.clips.len()
    );
    Ok(summary)
}

/// Default output path: `<stem>_rigged.<ext>` next to the input.
///
/// # Errors
/// Returns [`Error::InvalidPath`] if `input` has no file name.
pub fn default_output_path(input: &Path) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| Error::InvalidPath(input.to_path_buf()))?;

    let mut name = stem.to_os_string();
    name.push("_rigged");
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }
    Ok(input.with_file_name(name))
}

/// Run every stage between Load and Encode over a decoded container.
///
/// # Errors
/// Returns the first stage failure, tagged with its [`RigStage`].
pub fn rig_container(
    container: GlbContainer,
    options: &RigOptions,
    progress: RigProgressCallback,
) -> Result<(GlbContainer, RigSummary)> {
    let GlbContainer {
        mut document,
        payload,
    } = container;
    let mut payload = PayloadBuffer::from(payload);

    let mesh = run_stage(RigProgress::new(RigStage::LocateMesh), progress, || {
        locate_mesh(&document)
    })?;

    let extracted = run_stage(RigProgress::new(RigStage::ExtractPositions), progress, || {
        extract_positions(&document, payload.as_slice(), mesh)
    })?;

    let skeleton = run_stage(RigProgress::new(RigStage::BuildSkeleton), progress, || {
        Ok(Skeleton::humanoid(extracted.min, extracted.max))
    })?;

    let solve_step = RigProgress::with_detail(
        RigStage::SolveWeights,
        format!("{} vertices", extracted.vertex_count()),
    );
    let weights: Vec<(usize, SkinWeights)> = run_stage(solve_step, progress, || {
        let bone_positions = skeleton.positions();
        Ok(extracted
            .primitives
            .iter()
            .map(|p| {
                let skin = skinning::solve(
                    &p.positions,
                    &bone_positions,
                    options.max_influences,
                    options.weight_epsilon,
                );
                (p.primitive, skin)
            })
            .collect())
    })?;

    let binding = run_stage(RigProgress::new(RigStage::AppendSkinData), progress, || {
        let binding = append_skin(
            &mut document,
            &mut payload,
            &skeleton,
            mesh,
            &options.skin_name,
        )?;
        document.validate()?;
        Ok(binding)
    })?;

    run_stage(RigProgress::new(RigStage::AppendVertexAttributes), progress, || {
        for (primitive, skin) in &weights {
            append_skin_attributes(&mut document, &mut payload, mesh, *primitive, skin)?;
        }
        document.validate()
    })?;

    let clips = run_stage(RigProgress::new(RigStage::SynthesizeAnimations), progress, || {
        let clips = synthesize(&skeleton, extracted.max.y - extracted.min.y);
        append_animations(&mut document, &mut payload, &clips, binding)?;
        document.validate()?;
        Ok(clips)
    })?;

    run_stage(RigProgress::new(RigStage::FinalizeBufferLength), progress, || {
        finalize_buffer(&mut document, &mut payload);
        document.validate()
    })?;

    let summary = RigSummary {
        mesh,
        primitives: weights.len(),
        vertices: extracted.vertex_count(),
        bones: skeleton.len(),
        skin: binding.skin,
        clips: clips.iter().map(|c| c.name).collect(),
        payload_bytes: payload.len(),
    };

    Ok((
        GlbContainer {
            document,
            payload: payload.into_inner(),
        },
        summary,
    ))
}

/// Report `step`, run `f`, and tag any error with the step's stage.
fn run_stage<T>(
    step: RigProgress,
    progress: RigProgressCallback,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let stage = step.stage;
    tracing::debug!("[{}/{}] {}", step.current, step.total, stage);
    progress(&step);
    f().map_err(|e| e.at(stage))
}

fn load(data: &[u8]) -> Result<GlbContainer> {
    let container = parse_glb_bytes(data)?;
    container.document.validate()?;
    Ok(container)
}

/// First node in document order that references a mesh, resolved to the mesh.
fn locate_mesh(doc: &GltfDocument) -> Result<usize> {
    let (node, mesh) = doc
        .nodes
        .iter()
        .enumerate()
        .find_map(|(i, n)| n.mesh.map(|m| (i, m)))
        .ok_or(Error::NoMesh)?;

    let record = doc.meshes.get(mesh).ok_or_else(|| Error::DanglingIndex {
        referrer: format!("node {node}"),
        kind: "mesh",
        index: mesh,
        len: doc.meshes.len(),
    })?;

    if !record
        .primitives
        .iter()
        .any(|p| p.attributes.contains_key("POSITION"))
    {
        return Err(Error::MeshWithoutPositions { mesh });
    }

    tracing::info!(
        "Found mesh {} ({}) on node {}",
        mesh,
        record.name.as_deref().unwrap_or("unnamed"),
        node
    );
    Ok(mesh)
}

struct PrimitivePositions {
    primitive: usize,
    positions: Vec<Vec3>,
}

struct ExtractedPositions {
    primitives: Vec<PrimitivePositions>,
    min: Vec3,
    max: Vec3,
}

impl ExtractedPositions {
    fn vertex_count(&self) -> usize {
        self.primitives.iter().map(|p| p.positions.len()).sum()
    }
}

/// Read `POSITION` from every primitive of `mesh` that has one.
fn extract_positions(doc: &GltfDocument, payload: &[u8], mesh: usize) -> Result<ExtractedPositions> {
    let mut primitives = Vec::new();

    for (p, primitive) in doc.meshes[mesh].primitives.iter().enumerate() {
        let Some(&accessor) = primitive.attributes.get("POSITION") else {
            tracing::debug!("Mesh {} primitive {} has no POSITION, skipping", mesh, p);
            continue;
        };

        let positions: Vec<Vec3> = match read_accessor(doc, payload, accessor)? {
            AccessorData::Vec3(values) => values.into_iter().map(Vec3::from_array).collect(),
            other => {
                return Err(Error::PositionsNotVec3 {
                    accessor,
                    shape: other.shape().as_str(),
                });
            }
        };

        // glTF accessors need count >= 1, so an empty primitive cannot carry
        // JOINTS_0/WEIGHTS_0. It stays unskinned and draws nothing.
        if positions.is_empty() {
            tracing::debug!("Mesh {} primitive {} has no vertices, skipping", mesh, p);
            continue;
        }
        primitives.push(PrimitivePositions {
            primitive: p,
            positions,
        });
    }

    let all: Vec<Vec3> = primitives
        .iter()
        .flat_map(|p| p.positions.iter().copied())
        .collect();
    let (min, max) = bounds(&all).ok_or(Error::EmptyVertexSet { mesh })?;

    tracing::debug!(
        "Read {} vertices from {} primitive(s); bounds {:?} to {:?}",
        all.len(),
        primitives.len(),
        min,
        max
    );

    Ok(ExtractedPositions {
        primitives,
        min,
        max,
    })
}

/// Zero-pad the payload and record its length on buffer 0.
fn finalize_buffer(doc: &mut GltfDocument, payload: &mut PayloadBuffer) {
    payload.align(PAYLOAD_ALIGNMENT);
    if doc.buffers.is_empty() {
        doc.buffers.push(GltfBuffer::default());
    }
    doc.buffers[0].byte_length = payload.len();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::formats::glb::{
        AccessorShape, GltfAccessor, GltfMesh, GltfNode, GltfPrimitive, GltfScene,
    };
    use std::sync::Mutex;

    /// One triangle, one node, one scene.
    fn triangle() -> GlbContainer {
        let mut payload = PayloadBuffer::new();
        let mut document = GltfDocument {
            scenes: vec![GltfScene {
                nodes: vec![0],
                ..GltfScene::default()
            }],
            scene: Some(0),
            ..GltfDocument::default()
        };
        let positions = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let accessor = payload
            .append_vertex_attribute(&positions, AccessorShape::Vec3)
            .unwrap()
            .insert(&mut document);

        let mut primitive = GltfPrimitive::default();
        primitive.attributes.insert("POSITION".to_string(), accessor);
        document.meshes.push(GltfMesh {
            primitives: vec![primitive],
            ..GltfMesh::default()
        });
        document.push_node(GltfNode {
            mesh: Some(0),
            ..GltfNode::default()
        });
        document.buffers.push(GltfBuffer {
            byte_length: payload.len(),
            ..GltfBuffer::default()
        });

        GlbContainer {
            document,
            payload: payload.into_inner(),
        }
    }

    #[test]
    fn test_rig_container_triangle() {
        let (rigged, summary) = rig_container(triangle(), &RigOptions::default(), &|_| {}).unwrap();
        assert_eq!(summary.bones, 19);
        assert_eq!(summary.vertices, 3);
        assert_eq!(summary.clips, vec!["Idle", "Walk", "Attack"]);

        let doc = &rigged.document;
        assert_eq!(doc.skins[0].joints.len(), 19);
        assert_eq!(doc.buffers[0].byte_length, rigged.payload.len());
        assert_eq!(rigged.payload.len() % 4, 0);

        let attributes = &doc.meshes[0].primitives[0].attributes;
        assert_eq!(doc.accessors[attributes["JOINTS_0"]].count, 3);
        assert_eq!(doc.accessors[attributes["WEIGHTS_0"]].count, 3);
        assert_eq!(doc.nodes[0].skin, Some(0));
    }

    #[test]
    fn test_progress_reports_every_stage_in_order() {
        let seen = Mutex::new(Vec::new());
        let glb = write_glb_bytes(&triangle().document, &triangle().payload).unwrap();
        rig_glb_bytes_with_progress(&glb, &RigOptions::default(), &|p| {
            seen.lock().unwrap().push(p.stage);
        })
        .unwrap();
        assert_eq!(seen.into_inner().unwrap(), RigStage::ALL.to_vec());
    }

    #[test]
    fn test_no_mesh_fails_at_locate() {
        let mut container = triangle();
        container.document.nodes[0].mesh = None;
        let err = rig_container(container, &RigOptions::default(), &|_| {}).unwrap_err();
        assert_eq!(err.stage(), Some(RigStage::LocateMesh));
        assert_eq!(err.kind(), ErrorKind::Pipeline);
    }

    #[test]
    fn test_mesh_without_positions() {
        let mut container = triangle();
        container.document.meshes[0].primitives[0]
            .attributes
            .shift_remove("POSITION");
        let err = rig_container(container, &RigOptions::default(), &|_| {}).unwrap_err();
        assert_eq!(err.stage(), Some(RigStage::LocateMesh));
        assert!(matches!(
            err,
            Error::Stage { ref source, .. } if matches!(**source, Error::MeshWithoutPositions { mesh: 0 })
        ));
    }

    #[test]
    fn test_empty_positions_fail_at_extract() {
        let mut container = triangle();
        container.document.accessors[0].count = 0;
        let err = rig_container(container, &RigOptions::default(), &|_| {}).unwrap_err();
        assert_eq!(err.stage(), Some(RigStage::ExtractPositions));
        assert_eq!(err.kind(), ErrorKind::Pipeline);
    }

    #[test]
    fn test_empty_primitive_left_without_skin_attributes() {
        let mut container = triangle();
        let doc = &mut container.document;
        let empty = doc.push_accessor(GltfAccessor {
            count: 0,
            ..doc.accessors[0].clone()
        });
        let mut primitive = GltfPrimitive::default();
        primitive.attributes.insert("POSITION".to_string(), empty);
        doc.meshes[0].primitives.push(primitive);

        let (rigged, summary) = rig_container(container, &RigOptions::default(), &|_| {}).unwrap();
        assert_eq!(summary.primitives, 1);
        assert_eq!(summary.vertices, 3);

        let primitives = &rigged.document.meshes[0].primitives;
        assert!(primitives[0].attributes.contains_key("JOINTS_0"));
        assert!(primitives[0].attributes.contains_key("WEIGHTS_0"));
        assert_eq!(primitives[1].attributes.keys().collect::<Vec<_>>(), vec!["POSITION"]);
        assert!(rigged.document.validate().is_ok());
    }

    #[test]
    fn test_non_vec3_positions_rejected() {
        let mut container = triangle();
        container.document.accessors[0].accessor_type = "VEC4".to_string();
        container.document.accessors[0].count = 2;
        let err = rig_container(container, &RigOptions::default(), &|_| {}).unwrap_err();
        assert_eq!(err.stage(), Some(RigStage::ExtractPositions));
        assert!(err.to_string().contains("expected VEC3"));
    }

    #[test]
    fn test_finalize_creates_missing_buffer() {
        let mut doc = GltfDocument::default();
        let mut payload = PayloadBuffer::from(vec![1, 2, 3, 4, 5]);
        finalize_buffer(&mut doc, &mut payload);
        assert_eq!(doc.buffers.len(), 1);
        assert_eq!(doc.buffers[0].byte_length, 8);
        assert_eq!(payload.as_slice(), &[1, 2, 3, 4, 5, 0, 0, 0]);
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("assets/knight.glb")).unwrap(),
            PathBuf::from("assets/knight_rigged.glb")
        );
        assert_eq!(
            default_output_path(Path::new("model")).unwrap(),
            PathBuf::from("model_rigged")
        );
        assert!(matches!(
            default_output_path(Path::new("/")),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn test_invalid_options_rejected_before_load() {
        let options = RigOptions::default().with_max_influences(0);
        let err = rig_glb_bytes(b"not a glb", &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(err.stage(), None);
    }

    #[test]
    fn test_bad_magic_fails_at_load() {
        let err = rig_glb_bytes(b"glTX\x02\0\0\0\x0c\0\0\0", &RigOptions::default()).unwrap_err();
        assert_eq!(err.stage(), Some(RigStage::Load));
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
