//! The delta instruction interpreter and fixpoint resolver (spec
//! component H): reconstructs byte-exact target content from a base
//! payload plus a stream of copy/insert instructions, then resolves an
//! entire pack's worth of ref-deltas against each other and against the
//! non-delta objects already written to the store.

use std::collections::HashMap;

use crate::error::{GitError, Result};
use crate::object::{ObjectId, ObjectKind};
use crate::pack::{PackEntryKind, RawPackEntry};
use crate::store::ObjectStore;

/// Reads a 7-bit little-endian continuation varint, returning the value
/// and the number of bytes consumed.
fn read_varint(data: &[u8]) -> Result<(usize, usize)> {
    let mut value = 0usize;
    let mut shift = 0;
    let mut pos = 0;
    loop {
        let byte = *data
            .get(pos)
            .ok_or_else(|| GitError::MalformedDelta("truncated varint".into()))?;
        value |= ((byte & 0x7F) as usize) << shift;
        pos += 1;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }
    Ok((value, pos))
}

/// Applies a delta instruction stream to `base`, producing `target`.
pub fn apply_delta(base: &[u8], delta: &[u8]) -> Result<Vec<u8>> {
    let (base_size, mut pos) = read_varint(delta)?;
    if base_size != base.len() {
        return Err(GitError::DeltaBaseSizeMismatch {
            expected: base_size,
            actual: base.len(),
        });
    }

    let (target_size, consumed) = read_varint(&delta[pos..])?;
    pos += consumed;

    let mut target = Vec::with_capacity(target_size);

    while pos < delta.len() {
        let cmd = delta[pos];
        pos += 1;

        if cmd & 0x80 != 0 {
            // Copy: up to 4 offset bytes (bits 0-3) then up to 3 size
            // bytes (bits 4-6), each present only if its flag bit is set.
            let mut copy_offset: u32 = 0;
            for i in 0..4 {
                if cmd & (1 << i) != 0 {
                    let byte = *delta
                        .get(pos)
                        .ok_or_else(|| GitError::MalformedDelta("truncated copy offset".into()))?;
                    copy_offset |= (byte as u32) << (i * 8);
                    pos += 1;
                }
            }
            let mut copy_size: u32 = 0;
            for i in 0..3 {
                if cmd & (1 << (i + 4)) != 0 {
                    let byte = *delta
                        .get(pos)
                        .ok_or_else(|| GitError::MalformedDelta("truncated copy size".into()))?;
                    copy_size |= (byte as u32) << (i * 8);
                    pos += 1;
                }
            }
            if copy_size == 0 {
                copy_size = 0x10000;
            }

            let start = copy_offset as usize;
            let end = start
                .checked_add(copy_size as usize)
                .ok_or_else(|| GitError::MalformedDelta("copy range overflow".into()))?;
            let slice = base
                .get(start..end)
                .ok_or_else(|| GitError::MalformedDelta("copy range out of bounds".into()))?;
            target.extend_from_slice(slice);
        } else if cmd != 0 {
            let len = cmd as usize;
            let slice = delta
                .get(pos..pos + len)
                .ok_or_else(|| GitError::MalformedDelta("truncated insert data".into()))?;
            target.extend_from_slice(slice);
            pos += len;
        } else {
            return Err(GitError::MalformedDelta(
                "command byte 0 is reserved".into(),
            ));
        }
    }

    if target.len() != target_size {
        return Err(GitError::DeltaTargetSizeMismatch {
            expected: target_size,
            actual: target.len(),
        });
    }

    Ok(target)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IngestStats {
    pub direct_objects: usize,
    pub resolved_deltas: usize,
    pub dropped_ofs_deltas: usize,
}

/// Writes every non-delta entry to the store, then resolves ref-deltas
/// against each other (and against those bases) to a fixpoint, writing
/// each resolved object as it is produced. Non-delta objects are always
/// written before any delta is applied, and each resolved delta is
/// written before the next pass begins, so a crash mid-ingest leaves a
/// consistent, idempotent subset of the final state on disk.
pub fn resolve_and_store(entries: Vec<RawPackEntry>, store: &ObjectStore) -> Result<IngestStats> {
    let mut known: HashMap<ObjectId, (ObjectKind, Vec<u8>)> = HashMap::new();
    let mut pending: Vec<(ObjectId, Vec<u8>)> = Vec::new();
    let mut stats = IngestStats::default();

    for entry in entries {
        match entry.kind {
            PackEntryKind::OfsDelta => {
                stats.dropped_ofs_deltas += 1;
                log::warn!("dropping unsupported OFS_DELTA pack entry");
            }
            PackEntryKind::RefDelta => {
                let base_id = entry
                    .base_id
                    .expect("ref-delta entries always carry a base id");
                pending.push((base_id, entry.payload));
            }
            _ => {
                let kind = match entry.kind {
                    PackEntryKind::Commit => ObjectKind::Commit,
                    PackEntryKind::Tree => ObjectKind::Tree,
                    PackEntryKind::Blob => ObjectKind::Blob,
                    PackEntryKind::Tag => ObjectKind::Tag,
                    PackEntryKind::OfsDelta | PackEntryKind::RefDelta => unreachable!(),
                };
                let id = store.put(kind, &entry.payload)?;
                known.insert(id, (kind, entry.payload));
                stats.direct_objects += 1;
            }
        }
    }

    while !pending.is_empty() {
        let mut made_progress = false;
        let mut still_pending = Vec::new();

        for (base_id, delta_payload) in pending {
            match known.get(&base_id) {
                Some((base_kind, base_payload)) => {
                    let resolved = apply_delta(base_payload, &delta_payload)?;
                    let id = store.put(*base_kind, &resolved)?;
                    known.insert(id, (*base_kind, resolved));
                    stats.resolved_deltas += 1;
                    made_progress = true;
                }
                None => still_pending.push((base_id, delta_payload)),
            }
        }

        if !made_progress && !still_pending.is_empty() {
            return Err(GitError::UnresolvedDelta(still_pending.len()));
        }
        pending = still_pending;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object;

    #[test]
    fn copy_then_insert() {
        // src=5, tgt=7, copy(offset=0,size=5), insert("HI")
        let delta = [0x05, 0x07, 0x90, 0x05, 0x02, b'H', b'I'];
        let result = apply_delta(b"world", &delta).unwrap();
        assert_eq!(result, b"worldHI");
    }

    #[test]
    fn rejects_base_size_mismatch() {
        let delta = [0x05, 0x00];
        assert!(matches!(
            apply_delta(b"wrong", &delta),
            Err(GitError::DeltaBaseSizeMismatch { .. })
        ));
    }

    fn push_varint(out: &mut Vec<u8>, mut value: usize) {
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value > 0 {
                byte |= 0x80;
            }
            out.push(byte);
            if value == 0 {
                break;
            }
        }
    }

    #[test]
    fn zero_copy_size_means_64k() {
        let base = vec![b'x'; 0x10000];
        let mut delta = Vec::new();
        push_varint(&mut delta, base.len());
        push_varint(&mut delta, base.len());
        delta.push(0x80); // copy, no offset/size bytes present -> offset 0, size 0 -> 0x10000

        let result = apply_delta(&base, &delta).unwrap();
        assert_eq!(result.len(), 0x10000);
        assert_eq!(result, base);
    }

    #[test]
    fn resolves_delta_arriving_before_its_base_in_two_passes() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path());

        let base_payload = b"world".to_vec();
        let (base_id, _) = object::encode_and_hash(ObjectKind::Blob, &base_payload);

        let delta_instructions = vec![0x05, 0x07, 0x90, 0x05, 0x02, b'H', b'I'];

        let entries = vec![
            RawPackEntry {
                kind: PackEntryKind::RefDelta,
                declared_size: delta_instructions.len(),
                payload: delta_instructions,
                base_id: Some(base_id),
            },
            RawPackEntry {
                kind: PackEntryKind::Blob,
                declared_size: base_payload.len(),
                payload: base_payload,
                base_id: None,
            },
        ];

        let stats = resolve_and_store(entries, &store).unwrap();
        assert_eq!(stats.direct_objects, 1);
        assert_eq!(stats.resolved_deltas, 1);

        let (kind, payload) = store.get(&base_id).unwrap();
        assert_eq!(kind, ObjectKind::Blob);
        assert_eq!(payload, b"world");

        let (target_id, _) = object::encode_and_hash(ObjectKind::Blob, b"worldHI");
        let (kind, payload) = store.get(&target_id).unwrap();
        assert_eq!(kind, ObjectKind::Blob);
        assert_eq!(payload, b"worldHI");
    }

    #[test]
    fn unresolvable_delta_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path());
        let missing_base = ObjectId::from_hex(&"f".repeat(40)).unwrap();
        let entries = vec![RawPackEntry {
            kind: PackEntryKind::RefDelta,
            declared_size: 2,
            payload: vec![0x00, 0x00],
            base_id: Some(missing_base),
        }];
        match resolve_and_store(entries, &store) {
            Err(GitError::UnresolvedDelta(1)) => {}
            other => panic!("expected UnresolvedDelta(1), got {other:?}"),
        }
    }
}
