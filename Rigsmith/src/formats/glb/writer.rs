//! GLB container encoding and file output

use super::{
    CHUNK_BIN, CHUNK_HEADER_SIZE, CHUNK_JSON, GLB_MAGIC, GLB_VERSION, GltfDocument, HEADER_SIZE,
    padding_for,
};
use crate::error::{Error, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Encode a document and its binary payload as a GLB container.
///
/// The JSON chunk is padded with spaces and the BIN chunk with zeros. The
/// BIN chunk is left out entirely when `payload` is empty.
///
/// # Errors
///
/// Returns [`Error::JsonError`] if the document cannot be serialized, or
/// [`Error::GlbTooLarge`] if the result would not fit the 32-bit length field.
///
/// [`Error::JsonError`]: crate::Error::JsonError
/// [`Error::GlbTooLarge`]: crate::Error::GlbTooLarge
pub fn write_glb_bytes(doc: &GltfDocument, payload: &[u8]) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(doc)?;

    let json_padding = padding_for(json.len());
    let json_chunk_len = json.len() + json_padding;

    let bin_padding = padding_for(payload.len());
    let bin_chunk_len = payload.len() + bin_padding;

    let mut total_len = HEADER_SIZE + CHUNK_HEADER_SIZE + json_chunk_len;
    if !payload.is_empty() {
        total_len += CHUNK_HEADER_SIZE + bin_chunk_len;
    }
    let total_u32 = u32::try_from(total_len).map_err(|_| Error::GlbTooLarge { size: total_len })?;

    let mut output = Vec::with_capacity(total_len);

    // GLB header
    output.write_u32::<LittleEndian>(GLB_MAGIC)?;
    output.write_u32::<LittleEndian>(GLB_VERSION)?;
    output.write_u32::<LittleEndian>(total_u32)?;

    // JSON chunk; lengths below fit since the total does
    write_chunk_header(&mut output, json_chunk_len, CHUNK_JSON)?;
    output.write_all(&json)?;
    output.extend(std::iter::repeat_n(b' ', json_padding));

    // Binary chunk
    if !payload.is_empty() {
        write_chunk_header(&mut output, bin_chunk_len, CHUNK_BIN)?;
        output.write_all(payload)?;
        output.extend(std::iter::repeat_n(0u8, bin_padding));
    }

    tracing::debug!(
        "Encoded GLB: {} bytes (JSON {}, BIN {})",
        total_len,
        json_chunk_len,
        if payload.is_empty() { 0 } else { bin_chunk_len }
    );

    Ok(output)
}

fn write_chunk_header(output: &mut Vec<u8>, length: usize, kind: u32) -> Result<()> {
    let length = u32::try_from(length).map_err(|_| Error::GlbTooLarge { size: length })?;
    output.write_u32::<LittleEndian>(length)?;
    output.write_u32::<LittleEndian>(kind)?;
    Ok(())
}

/// Encode and write a .glb file.
///
/// The container is written to a temporary file next to `path` and renamed
/// into place, so a failed write never leaves a partial file behind.
///
/// # Errors
///
/// Returns any error from [`write_glb_bytes`], [`Error::Io`] if the temporary
/// file cannot be written, or [`Error::PersistFailed`] if the rename fails.
///
/// [`Error::Io`]: crate::Error::Io
/// [`Error::PersistFailed`]: crate::Error::PersistFailed
pub fn write_glb<P: AsRef<Path>>(path: P, doc: &GltfDocument, payload: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let bytes = write_glb_bytes(doc, payload)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(&bytes)?;
    file.as_file().sync_all()?;
    file.persist(path)?;

    tracing::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::glb::{GltfNode, parse_glb_bytes};

    fn sample_doc() -> GltfDocument {
        let mut doc = GltfDocument::default();
        doc.push_node(GltfNode {
            name: Some("Cube".to_string()),
            ..GltfNode::default()
        });
        doc
    }

    #[test]
    fn test_header_and_alignment() {
        let glb = write_glb_bytes(&sample_doc(), &[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(&glb[0..4], b"glTF");
        assert_eq!(u32::from_le_bytes(glb[4..8].try_into().unwrap()), 2);
        assert_eq!(
            u32::from_le_bytes(glb[8..12].try_into().unwrap()) as usize,
            glb.len()
        );
        assert_eq!(glb.len() % 4, 0);

        let json_len = u32::from_le_bytes(glb[12..16].try_into().unwrap()) as usize;
        assert_eq!(json_len % 4, 0);
        let bin_header = HEADER_SIZE + CHUNK_HEADER_SIZE + json_len;
        let bin_len =
            u32::from_le_bytes(glb[bin_header..bin_header + 4].try_into().unwrap()) as usize;
        assert_eq!(bin_len, 8);
        assert_eq!(&glb[glb.len() - 3..], &[0, 0, 0]);
    }

    #[test]
    fn test_empty_payload_omits_bin_chunk() {
        let glb = write_glb_bytes(&sample_doc(), &[]).unwrap();
        let json_len = u32::from_le_bytes(glb[12..16].try_into().unwrap()) as usize;
        assert_eq!(glb.len(), HEADER_SIZE + CHUNK_HEADER_SIZE + json_len);
    }

    #[test]
    fn test_round_trip_pads_payload_with_zeros() {
        let doc = sample_doc();
        let glb = write_glb_bytes(&doc, &[9, 8, 7]).unwrap();
        let container = parse_glb_bytes(&glb).unwrap();
        assert_eq!(container.document, doc);
        assert_eq!(container.payload, vec![9, 8, 7, 0]);
    }

    #[test]
    fn test_write_glb_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.glb");
        write_glb(&path, &sample_doc(), &[0; 4]).unwrap();
        let container = crate::formats::glb::read_glb(&path).unwrap();
        assert_eq!(container.document.nodes.len(), 1);
        assert_eq!(container.payload.len(), 4);
    }
}
