use std::fs;
use std::path::Path;

use anyhow::Context;

use git_minimal::object::{self, ObjectId, ObjectKind};
use git_minimal::store::ObjectStore;

/// git hash-object command
pub fn invoke(path: impl AsRef<Path>, write: bool) -> anyhow::Result<ObjectId> {
    let path = path.as_ref();
    let content = fs::read(path).with_context(|| format!("reading {}", path.display()))?;

    let id = if write {
        let store = ObjectStore::new(".git");
        store
            .put(ObjectKind::Blob, &content)
            .context("writing blob to object store")?
    } else {
        object::encode_and_hash(ObjectKind::Blob, &content).0
    };

    Ok(id)
}
