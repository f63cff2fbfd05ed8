//! Packfile stream parsing (spec components F and G): locating the
//! `PACK` signature behind any leading sideband framing, reading the
//! header, and decoding each variable-length-framed, zlib-compressed
//! object entry.
//!
//! A pack entry's declared size and compressed payload refer to the raw
//! object content only - the `kind len\0` framing used by the object
//! store is never present inside a pack.

use flate2::{Decompress, FlushDecompress, Status};

use crate::error::{GitError, Result};
use crate::object::ObjectId;
use crate::pkt_line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackEntryKind {
    Commit,
    Tree,
    Blob,
    Tag,
    OfsDelta,
    RefDelta,
}

impl PackEntryKind {
    fn from_type_id(type_id: u8) -> Result<Self> {
        match type_id {
            1 => Ok(PackEntryKind::Commit),
            2 => Ok(PackEntryKind::Tree),
            3 => Ok(PackEntryKind::Blob),
            4 => Ok(PackEntryKind::Tag),
            6 => Ok(PackEntryKind::OfsDelta),
            7 => Ok(PackEntryKind::RefDelta),
            other => Err(GitError::UnknownType(other)),
        }
    }
}

#[derive(Debug)]
pub struct RawPackEntry {
    pub kind: PackEntryKind,
    pub declared_size: usize,
    /// Decompressed bytes: raw object content for non-delta kinds, the
    /// delta instruction stream for `RefDelta`, unused for `OfsDelta`.
    pub payload: Vec<u8>,
    pub base_id: Option<ObjectId>,
}

/// Parses the `command=fetch` response body: a leading `packfile`
/// announcement pkt-line, arbitrary sideband bytes, the `PACK` signature,
/// a version/count header, then `count` object entries. The trailing
/// 20-byte pack checksum is read but not verified (non-goal).
pub fn parse_pack_stream(bytes: &[u8]) -> Result<Vec<RawPackEntry>> {
    let (announcement, consumed) = pkt_line::decode(bytes)?;
    match announcement {
        Some(payload) if payload.starts_with(b"packfile\n") => {}
        other => {
            return Err(GitError::ProtocolError(format!(
                "expected packfile announcement pkt-line, got {other:?}"
            )))
        }
    }

    let mut offset = find_pack_signature(bytes, consumed)?;
    offset += 4; // the signature itself

    let version = read_u32_be(bytes, &mut offset)?;
    if version != 2 && version != 3 {
        return Err(GitError::UnsupportedVersion(version));
    }

    let count = read_u32_be(bytes, &mut offset)?;
    log::info!("pack header declares {count} object(s), version {version}");

    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        entries.push(parse_entry(bytes, &mut offset)?);
    }

    Ok(entries)
}

/// Scans one byte at a time for the `PACK` signature, tolerating
/// interleaved sideband bytes the server may have put in front of it.
fn find_pack_signature(bytes: &[u8], start: usize) -> Result<usize> {
    let mut i = start;
    while i + 4 <= bytes.len() {
        if &bytes[i..i + 4] == b"PACK" {
            return Ok(i);
        }
        i += 1;
    }
    Err(GitError::ProtocolError(
        "PACK signature not found in response body".into(),
    ))
}

fn read_u8(bytes: &[u8], offset: &mut usize) -> Result<u8> {
    let byte = *bytes
        .get(*offset)
        .ok_or_else(|| GitError::ProtocolError("truncated pack entry header".into()))?;
    *offset += 1;
    Ok(byte)
}

fn read_u32_be(bytes: &[u8], offset: &mut usize) -> Result<u32> {
    if *offset + 4 > bytes.len() {
        return Err(GitError::ProtocolError("truncated pack header".into()));
    }
    let value = u32::from_be_bytes(bytes[*offset..*offset + 4].try_into().unwrap());
    *offset += 4;
    Ok(value)
}

/// Type id in bits 4-6 of the first byte, size as a 7-bit little-endian
/// continuation varint starting with the low 4 bits of that first byte.
fn read_type_and_size(bytes: &[u8], offset: &mut usize) -> Result<(u8, usize)> {
    let first = read_u8(bytes, offset)?;
    let type_id = (first >> 4) & 0x07;
    let mut size = (first & 0x0F) as usize;
    let mut shift = 4;
    let mut byte = first;
    while byte & 0x80 != 0 {
        byte = read_u8(bytes, offset)?;
        size |= ((byte & 0x7F) as usize) << shift;
        shift += 7;
    }
    Ok((type_id, size))
}

/// `OFS_DELTA` base offsets use their own continuation-bit varint; this
/// system never resolves them (non-goal), so we only need to consume the
/// right number of bytes to keep the cursor aligned.
fn skip_ofs_delta_offset(bytes: &[u8], offset: &mut usize) -> Result<()> {
    loop {
        let byte = read_u8(bytes, offset)?;
        if byte & 0x80 == 0 {
            break;
        }
    }
    Ok(())
}

fn parse_entry(bytes: &[u8], offset: &mut usize) -> Result<RawPackEntry> {
    let (type_id, declared_size) = read_type_and_size(bytes, offset)?;
    let kind = PackEntryKind::from_type_id(type_id)?;

    let base_id = match kind {
        PackEntryKind::OfsDelta => {
            skip_ofs_delta_offset(bytes, offset)?;
            None
        }
        PackEntryKind::RefDelta => {
            if *offset + 20 > bytes.len() {
                return Err(GitError::ProtocolError(
                    "truncated ref-delta base object id".into(),
                ));
            }
            let mut id_bytes = [0u8; 20];
            id_bytes.copy_from_slice(&bytes[*offset..*offset + 20]);
            *offset += 20;
            Some(ObjectId::from_bytes(id_bytes))
        }
        _ => None,
    };

    let (payload, consumed) = zlib_decompress_one(&bytes[*offset..])?;
    *offset += consumed;

    let is_delta = matches!(kind, PackEntryKind::OfsDelta | PackEntryKind::RefDelta);
    if !is_delta && payload.len() != declared_size {
        return Err(GitError::MalformedObject(format!(
            "pack entry declared size {declared_size} does not match decompressed length {}",
            payload.len()
        )));
    }

    Ok(RawPackEntry {
        kind,
        declared_size,
        payload,
        base_id,
    })
}

/// Decompresses exactly one zlib stream starting at `data[0]`, stopping
/// at its logical end and reporting how many input bytes were consumed
/// so the caller's cursor lands at the first byte of the next entry.
fn zlib_decompress_one(data: &[u8]) -> Result<(Vec<u8>, usize)> {
    let mut decompress = Decompress::new(true);
    let mut output = Vec::with_capacity(4096);

    loop {
        if output.len() == output.capacity() {
            output.reserve(output.capacity().max(4096));
        }
        let input = &data[decompress.total_in() as usize..];
        let status = decompress
            .decompress_vec(input, &mut output, FlushDecompress::None)
            .map_err(|e| GitError::MalformedObject(format!("zlib stream error: {e}")))?;

        if status == Status::StreamEnd {
            break;
        }
        if decompress.total_in() as usize >= data.len() {
            return Err(GitError::MalformedObject(
                "zlib stream truncated inside pack entry".into(),
            ));
        }
    }

    Ok((output, decompress.total_in() as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn zlib_compress(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn build_pack(entries: &[(u8, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(b"PACK");
        body.extend_from_slice(&2u32.to_be_bytes());
        body.extend_from_slice(&(entries.len() as u32).to_be_bytes());

        for (type_id, content) in entries {
            let mut first = (*type_id & 0x07) << 4;
            let mut size = content.len();
            let mut low = (size & 0x0F) as u8;
            size >>= 4;
            let mut continuation = size > 0;
            first |= low;
            if continuation {
                first |= 0x80;
            }
            body.push(first);
            while continuation {
                low = (size & 0x7F) as u8;
                size >>= 7;
                continuation = size > 0;
                body.push(if continuation { low | 0x80 } else { low });
            }
            body.extend_from_slice(&zlib_compress(content));
        }

        let mut framed = pkt_line::encode_str("packfile\n");
        framed.extend_from_slice(&body);
        framed
    }

    #[test]
    fn parses_single_blob_entry() {
        let pack = build_pack(&[(3, b"hello")]);
        let entries = parse_pack_stream(&pack).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, PackEntryKind::Blob);
        assert_eq!(entries[0].payload, b"hello");
        assert_eq!(entries[0].declared_size, 5);
    }

    #[test]
    fn tolerates_leading_sideband_bytes_before_pack() {
        let mut pack = build_pack(&[(3, b"hi")]);
        // splice some junk bytes right after the announcement pkt-line,
        // before the PACK signature, simulating sideband interleaving.
        let announce_len = pkt_line::encode_str("packfile\n").len();
        let mut spliced = pack[..announce_len].to_vec();
        spliced.extend_from_slice(&[1, 2, 3, 4, 5]);
        spliced.extend_from_slice(&pack.split_off(announce_len));

        let entries = parse_pack_stream(&spliced).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].payload, b"hi");
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut pack = pkt_line::encode_str("packfile\n");
        pack.extend_from_slice(b"PACK");
        pack.extend_from_slice(&99u32.to_be_bytes());
        pack.extend_from_slice(&0u32.to_be_bytes());
        match parse_pack_stream(&pack) {
            Err(GitError::UnsupportedVersion(99)) => {}
            other => panic!("expected UnsupportedVersion(99), got {other:?}"),
        }
    }

    #[test]
    fn ref_delta_entry_captures_base_id() {
        let base_id = [7u8; 20];
        let mut body = Vec::new();
        body.extend_from_slice(b"PACK");
        body.extend_from_slice(&2u32.to_be_bytes());
        body.extend_from_slice(&1u32.to_be_bytes());
        // type 7 (ref_delta), size doesn't matter for this test
        body.push(0x70);
        body.extend_from_slice(&base_id);
        body.extend_from_slice(&zlib_compress(b"\x05\x07\x90\x05\x02HI"));

        let mut framed = pkt_line::encode_str("packfile\n");
        framed.extend_from_slice(&body);

        let entries = parse_pack_stream(&framed).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, PackEntryKind::RefDelta);
        assert_eq!(entries[0].base_id.unwrap().as_bytes(), &base_id);
    }
}
