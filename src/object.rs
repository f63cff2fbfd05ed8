//! The object codec (spec component A): framing, hashing and tree/commit
//! payload shapes. Nothing in this module touches the filesystem - see
//! `store` for that.

use std::fmt;
use std::str::FromStr;

use sha1::{Digest, Sha1};

use crate::error::{GitError, Result};

/// The four persisted object kinds. `OfsDelta`/`RefDelta` are transient
/// pack-entry tags and never escape `pack`/`delta` as a resolved object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
            ObjectKind::Tag => "tag",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = GitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "blob" => Ok(ObjectKind::Blob),
            "tree" => Ok(ObjectKind::Tree),
            "commit" => Ok(ObjectKind::Commit),
            "tag" => Ok(ObjectKind::Tag),
            other => Err(GitError::MalformedObject(format!(
                "unknown object kind '{other}'"
            ))),
        }
    }
}

/// A 20-byte SHA-1 object id, rendered as 40 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 20]);

impl ObjectId {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        ObjectId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| GitError::MalformedObject(format!("invalid hex id '{hex_str}': {e}")))?;
        let array: [u8; 20] = bytes.as_slice().try_into().map_err(|_| {
            GitError::MalformedObject(format!(
                "object id '{hex_str}' is not 20 bytes when decoded"
            ))
        })?;
        Ok(ObjectId(array))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Encodes `kind_ascii ' ' ascii_decimal(len) '\0' payload`. Never quotes
/// or pads the length.
pub fn encode(kind: ObjectKind, payload: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(payload.len() + 16);
    framed.extend_from_slice(kind.as_str().as_bytes());
    framed.push(b' ');
    framed.extend_from_slice(payload.len().to_string().as_bytes());
    framed.push(0);
    framed.extend_from_slice(payload);
    framed
}

/// SHA-1 of the framed form, the object's content-addressed identity.
pub fn hash(framed: &[u8]) -> ObjectId {
    let mut hasher = Sha1::new();
    hasher.update(framed);
    let digest = hasher.finalize();
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest);
    ObjectId(bytes)
}

/// Encode + hash in one step, returning both the id and the framed bytes
/// a caller typically wants to compress and persist next.
pub fn encode_and_hash(kind: ObjectKind, payload: &[u8]) -> (ObjectId, Vec<u8>) {
    let framed = encode(kind, payload);
    let id = hash(&framed);
    (id, framed)
}

/// Splits a framed object back into its kind and payload, validating that
/// the declared length matches the remaining bytes exactly.
pub fn decode(framed: &[u8]) -> Result<(ObjectKind, Vec<u8>)> {
    let space = framed
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| GitError::MalformedObject("missing type/length separator".into()))?;
    let nul = framed
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| GitError::MalformedObject("missing header terminator".into()))?;
    if nul < space {
        return Err(GitError::MalformedObject(
            "header terminator precedes separator".into(),
        ));
    }

    let kind_str = std::str::from_utf8(&framed[..space])
        .map_err(|_| GitError::MalformedObject("object kind is not valid UTF-8".into()))?;
    let kind: ObjectKind = kind_str.parse()?;

    let len_str = std::str::from_utf8(&framed[space + 1..nul])
        .map_err(|_| GitError::MalformedObject("declared length is not valid UTF-8".into()))?;
    let declared_len: usize = len_str.parse().map_err(|_| {
        GitError::MalformedObject(format!("declared length '{len_str}' not a number"))
    })?;

    let payload = &framed[nul + 1..];
    if payload.len() != declared_len {
        return Err(GitError::MalformedObject(format!(
            "declared length {declared_len} does not match payload length {}",
            payload.len()
        )));
    }

    Ok((kind, payload.to_vec()))
}

/// Tree entry file modes. Entries not matching one of these four are
/// `UnsupportedMode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Directory,
    File,
    Executable,
    Symlink,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Directory => "40000",
            Mode::File => "100644",
            Mode::Executable => "100755",
            Mode::Symlink => "120000",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "40000" => Ok(Mode::Directory),
            "100644" => Ok(Mode::File),
            "100755" => Ok(Mode::Executable),
            "120000" => Ok(Mode::Symlink),
            other => Err(GitError::UnsupportedMode(other.to_string())),
        }
    }

    pub fn is_directory(self) -> bool {
        matches!(self, Mode::Directory)
    }
}

#[derive(Debug, Clone)]
pub struct TreeEntry {
    pub mode: Mode,
    pub name: Vec<u8>,
    pub target: ObjectId,
}

/// Concatenates `mode_ascii ' ' name '\0' raw20id` for every entry, after
/// sorting by raw `name` bytes (plain lexicographic order - see
/// SPEC_FULL.md §9 on why this deliberately does not special-case
/// directories).
pub fn encode_tree(entries: &[TreeEntry]) -> Vec<u8> {
    let mut sorted: Vec<&TreeEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut payload = Vec::new();
    for entry in sorted {
        payload.extend_from_slice(entry.mode.as_str().as_bytes());
        payload.push(b' ');
        payload.extend_from_slice(&entry.name);
        payload.push(0);
        payload.extend_from_slice(entry.target.as_bytes());
    }
    payload
}

/// Parses a tree payload into its entries, in on-disk order.
pub fn decode_tree(payload: &[u8]) -> Result<Vec<TreeEntry>> {
    let mut entries = Vec::new();
    let mut cursor = 0usize;

    while cursor < payload.len() {
        let space = payload[cursor..]
            .iter()
            .position(|&b| b == b' ')
            .map(|i| i + cursor)
            .ok_or_else(|| GitError::MalformedObject("tree entry missing mode separator".into()))?;
        let nul = payload[cursor..]
            .iter()
            .position(|&b| b == 0)
            .map(|i| i + cursor)
            .ok_or_else(|| {
                GitError::MalformedObject("tree entry missing name terminator".into())
            })?;

        let mode_str = std::str::from_utf8(&payload[cursor..space])
            .map_err(|_| GitError::MalformedObject("tree entry mode is not valid UTF-8".into()))?;
        let mode = Mode::from_str(mode_str)?;
        let name = payload[space + 1..nul].to_vec();

        let id_start = nul + 1;
        let id_end = id_start + 20;
        if id_end > payload.len() {
            return Err(GitError::MalformedObject(
                "tree entry truncated before 20-byte id".into(),
            ));
        }
        let mut id_bytes = [0u8; 20];
        id_bytes.copy_from_slice(&payload[id_start..id_end]);

        entries.push(TreeEntry {
            mode,
            name,
            target: ObjectId::from_bytes(id_bytes),
        });
        cursor = id_end;
    }

    Ok(entries)
}

/// Extracts the `tree <hex>` line's id from a commit payload.
pub fn commit_tree_id(payload: &[u8]) -> Result<ObjectId> {
    for line in payload.split(|&b| b == b'\n') {
        if let Some(rest) = line.strip_prefix(b"tree ") {
            let hex_str = std::str::from_utf8(rest)
                .map_err(|_| GitError::MalformedObject("commit tree line is not UTF-8".into()))?;
            return ObjectId::from_hex(hex_str.trim());
        }
    }
    Err(GitError::MalformedObject(
        "commit payload has no tree line".into(),
    ))
}

/// Extracts the first `parent <hex>` line's id, if present. Only a single
/// parent is consumed by this system, per spec.
pub fn commit_parent_id(payload: &[u8]) -> Result<Option<ObjectId>> {
    for line in payload.split(|&b| b == b'\n') {
        if let Some(rest) = line.strip_prefix(b"parent ") {
            let hex_str = std::str::from_utf8(rest)
                .map_err(|_| GitError::MalformedObject("commit parent line is not UTF-8".into()))?;
            return Ok(Some(ObjectId::from_hex(hex_str.trim())?));
        }
    }
    Ok(None)
}
