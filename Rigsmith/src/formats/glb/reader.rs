//! GLB container reading and parsing

use super::{
    CHUNK_BIN, CHUNK_HEADER_SIZE, CHUNK_JSON, GLB_MAGIC, GLB_VERSION, GlbContainer, GltfDocument,
    HEADER_SIZE,
};
use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::path::Path;

/// Read a .glb file from disk
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened or read, or any of the
/// container errors documented on [`parse_glb_bytes`].
///
/// [`Error::Io`]: crate::Error::Io
pub fn read_glb<P: AsRef<Path>>(path: P) -> Result<GlbContainer> {
    let data = std::fs::read(path)?;
    parse_glb_bytes(&data)
}

/// Parse GLB data from bytes
///
/// Chunks of unknown type are skipped. Bytes past the header's declared
/// total length are ignored.
///
/// # Errors
///
/// Returns [`Error::InvalidGlbMagic`] or [`Error::UnsupportedGlbVersion`] for
/// a foreign header, [`Error::GlbTruncated`] / [`Error::ChunkOverrun`] when
/// lengths do not fit, and [`Error::MissingJsonChunk`],
/// [`Error::DuplicateBinChunk`] or [`Error::InvalidJsonChunk`] for a bad
/// chunk sequence.
///
/// [`Error::InvalidGlbMagic`]: crate::Error::InvalidGlbMagic
/// [`Error::UnsupportedGlbVersion`]: crate::Error::UnsupportedGlbVersion
/// [`Error::GlbTruncated`]: crate::Error::GlbTruncated
/// [`Error::ChunkOverrun`]: crate::Error::ChunkOverrun
/// [`Error::MissingJsonChunk`]: crate::Error::MissingJsonChunk
/// [`Error::DuplicateBinChunk`]: crate::Error::DuplicateBinChunk
/// [`Error::InvalidJsonChunk`]: crate::Error::InvalidJsonChunk
pub fn parse_glb_bytes(data: &[u8]) -> Result<GlbContainer> {
    if data.len() < HEADER_SIZE {
        return Err(Error::GlbTruncated {
            declared: HEADER_SIZE,
            actual: data.len(),
        });
    }

    let mut cursor = Cursor::new(data);

    // Read header (12 bytes)
    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic)?;
    if u32::from_le_bytes(magic) != GLB_MAGIC {
        return Err(Error::InvalidGlbMagic(magic));
    }

    let version = cursor.read_u32::<LittleEndian>()?;
    if version != GLB_VERSION {
        return Err(Error::UnsupportedGlbVersion { version });
    }

    let total = cursor.read_u32::<LittleEndian>()? as usize;
    if total > data.len() {
        return Err(Error::GlbTruncated {
            declared: total,
            actual: data.len(),
        });
    }

    let mut document: Option<GltfDocument> = None;
    let mut payload: Option<Vec<u8>> = None;
    let mut offset = HEADER_SIZE;
    let mut chunk = 0usize;

    while offset < total {
        if offset + CHUNK_HEADER_SIZE > total {
            return Err(Error::ChunkOverrun {
                chunk,
                offset,
                length: CHUNK_HEADER_SIZE,
                total,
            });
        }

        cursor.set_position(offset as u64);
        let length = cursor.read_u32::<LittleEndian>()? as usize;
        let kind = cursor.read_u32::<LittleEndian>()?;

        let body_start = offset + CHUNK_HEADER_SIZE;
        let body_end = body_start
            .checked_add(length)
            .filter(|&end| end <= total)
            .ok_or(Error::ChunkOverrun {
                chunk,
                offset,
                length,
                total,
            })?;
        let body = &data[body_start..body_end];

        match kind {
            CHUNK_JSON if chunk == 0 => {
                document = Some(parse_json_chunk(body)?);
            }
            _ if chunk == 0 => return Err(Error::MissingJsonChunk),
            CHUNK_JSON => {
                tracing::debug!("Skipping extra JSON chunk {} at offset {}", chunk, offset);
            }
            CHUNK_BIN => {
                if payload.is_some() {
                    return Err(Error::DuplicateBinChunk { chunk });
                }
                payload = Some(body.to_vec());
            }
            other => {
                tracing::debug!(
                    "Skipping unknown chunk type {:#010x} ({} bytes) at offset {}",
                    other,
                    length,
                    offset
                );
            }
        }

        offset = body_end;
        chunk += 1;
    }

    let document = document.ok_or(Error::MissingJsonChunk)?;
    let payload = payload.unwrap_or_default();

    tracing::debug!(
        "Parsed GLB: {} bytes, {} chunks, {} nodes, {} accessors, {} payload bytes",
        total,
        chunk,
        document.nodes.len(),
        document.accessors.len(),
        payload.len()
    );

    Ok(GlbContainer { document, payload })
}

/// Decode the JSON chunk, tolerating trailing space or NUL padding.
fn parse_json_chunk(body: &[u8]) -> Result<GltfDocument> {
    let end = body
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |i| i + 1);
    serde_json::from_slice(&body[..end]).map_err(Error::InvalidJsonChunk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn header(total: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&total.to_le_bytes());
        out
    }

    fn chunk(kind: u32, body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    fn assemble(chunks: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = chunks.concat();
        let mut out = header((HEADER_SIZE + body.len()) as u32);
        out.extend_from_slice(&body);
        out
    }

    const JSON: &[u8] = br#"{"asset":{"version":"2.0"}}    "#;

    #[test]
    fn test_parse_json_only() {
        let glb = assemble(&[chunk(CHUNK_JSON, JSON)]);
        let container = parse_glb_bytes(&glb).unwrap();
        assert_eq!(container.document.asset.version, "2.0");
        assert!(container.payload.is_empty());
    }

    #[test]
    fn test_parse_with_bin_and_unknown_chunk() {
        let glb = assemble(&[
            chunk(CHUNK_JSON, JSON),
            chunk(0x5458_4554, b"skip"),
            chunk(CHUNK_BIN, &[1, 2, 3, 4]),
        ]);
        let container = parse_glb_bytes(&glb).unwrap();
        assert_eq!(container.payload, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_bad_magic() {
        let mut glb = assemble(&[chunk(CHUNK_JSON, JSON)]);
        glb[0] = b'X';
        let err = parse_glb_bytes(&glb).unwrap_err();
        assert!(matches!(err, Error::InvalidGlbMagic(m) if &m == b"XlTF"));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_bad_version() {
        let mut glb = assemble(&[chunk(CHUNK_JSON, JSON)]);
        glb[4] = 1;
        assert!(matches!(
            parse_glb_bytes(&glb),
            Err(Error::UnsupportedGlbVersion { version: 1 })
        ));
    }

    #[test]
    fn test_chunk_overruns_declared_length() {
        let mut glb = assemble(&[chunk(CHUNK_JSON, JSON), chunk(CHUNK_BIN, &[0; 8])]);
        // Claim the BIN chunk is longer than what remains.
        let bin_header = HEADER_SIZE + CHUNK_HEADER_SIZE + JSON.len();
        glb[bin_header..bin_header + 4].copy_from_slice(&64u32.to_le_bytes());
        match parse_glb_bytes(&glb) {
            Err(Error::ChunkOverrun { chunk, length, .. }) => {
                assert_eq!(chunk, 1);
                assert_eq!(length, 64);
            }
            other => panic!("expected overrun, got {other:?}"),
        }
    }

    #[test]
    fn test_declared_length_past_end() {
        let mut glb = assemble(&[chunk(CHUNK_JSON, JSON)]);
        let bogus = (glb.len() + 16) as u32;
        glb[8..12].copy_from_slice(&bogus.to_le_bytes());
        assert!(matches!(parse_glb_bytes(&glb), Err(Error::GlbTruncated { .. })));
    }

    #[test]
    fn test_first_chunk_must_be_json() {
        let glb = assemble(&[chunk(CHUNK_BIN, &[0; 4]), chunk(CHUNK_JSON, JSON)]);
        assert!(matches!(parse_glb_bytes(&glb), Err(Error::MissingJsonChunk)));
    }

    #[test]
    fn test_second_bin_chunk_rejected() {
        let glb = assemble(&[
            chunk(CHUNK_JSON, JSON),
            chunk(CHUNK_BIN, &[0; 4]),
            chunk(CHUNK_BIN, &[0; 4]),
        ]);
        assert!(matches!(
            parse_glb_bytes(&glb),
            Err(Error::DuplicateBinChunk { chunk: 2 })
        ));
    }

    #[test]
    fn test_malformed_json() {
        let glb = assemble(&[chunk(CHUNK_JSON, br#"{"asset": [1, 2"#)]);
        let err = parse_glb_bytes(&glb).unwrap_err();
        assert!(matches!(err, Error::InvalidJsonChunk(_)));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_too_short_for_header() {
        assert!(matches!(
            parse_glb_bytes(b"glTF"),
            Err(Error::GlbTruncated { declared: 12, actual: 4 })
        ));
    }
}
