//! The object store (spec component B): content-addressed, sharded
//! directory persistence for framed, zlib-compressed objects.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{GitError, Result};
use crate::object::{self, ObjectId, ObjectKind};

pub struct ObjectStore {
    objects_dir: PathBuf,
}

impl ObjectStore {
    /// `git_dir` is the `.git` directory root; objects live under
    /// `git_dir/objects`.
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        ObjectStore {
            objects_dir: git_dir.into().join("objects"),
        }
    }

    fn shard_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.objects_dir.join(&hex[..2]).join(&hex[2..])
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.shard_path(id).is_file()
    }

    /// Idempotent: writing an id that already exists is a no-op and must
    /// not fail.
    pub fn put(&self, kind: ObjectKind, payload: &[u8]) -> Result<ObjectId> {
        let (id, framed) = object::encode_and_hash(kind, payload);
        let path = self.shard_path(&id);
        if path.is_file() {
            return Ok(id);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&framed)?;
        let compressed = encoder.finish()?;

        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, &compressed)?;
        fs::rename(&tmp_path, &path)?;

        Ok(id)
    }

    pub fn get(&self, id: &ObjectId) -> Result<(ObjectKind, Vec<u8>)> {
        let path = self.shard_path(id);
        let compressed = fs::read(&path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                GitError::NotFound(id.to_hex())
            } else {
                GitError::IOError(err)
            }
        })?;

        let mut decoder = ZlibDecoder::new(compressed.as_slice());
        let mut framed = Vec::new();
        decoder.read_to_end(&mut framed)?;

        object::decode(&framed)
    }

    pub fn get_by_hex(&self, hex_id: &str) -> Result<(ObjectKind, Vec<u8>)> {
        self.get(&ObjectId::from_hex(hex_id)?)
    }

    /// Path an object with the given id would live at, whether or not it
    /// exists yet - used by `commit-tree` to check tree existence cheaply.
    pub fn path_for(&self, id: &ObjectId) -> PathBuf {
        self.shard_path(id)
    }

    pub fn git_dir(&self) -> &Path {
        self.objects_dir
            .parent()
            .expect("objects dir always has a parent")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;

    #[test]
    fn put_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path());
        let id = store.put(ObjectKind::Blob, b"hello").unwrap();
        assert_eq!(id.to_hex(), "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0");

        let (kind, payload) = store.get(&id).unwrap();
        assert_eq!(kind, ObjectKind::Blob);
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn put_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path());
        let id1 = store.put(ObjectKind::Blob, b"same content").unwrap();
        let bytes1 = fs::read(store.path_for(&id1)).unwrap();
        let id2 = store.put(ObjectKind::Blob, b"same content").unwrap();
        let bytes2 = fs::read(store.path_for(&id2)).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(bytes1, bytes2);
    }

    #[test]
    fn get_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path());
        let id = ObjectId::from_hex(&"0".repeat(40)).unwrap();
        match store.get(&id) {
            Err(GitError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
