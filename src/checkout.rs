//! Tree checkout (spec component I): materializes a commit's root tree
//! into a working directory.

use std::fs;
use std::path::Path;

use crate::error::{GitError, Result};
use crate::object::{self, Mode, ObjectId, ObjectKind};
use crate::store::ObjectStore;

pub fn checkout(store: &ObjectStore, commit_id: &ObjectId, work_root: &Path) -> Result<()> {
    let (kind, payload) = store.get(commit_id)?;
    if kind != ObjectKind::Commit {
        return Err(GitError::MalformedObject(format!(
            "checkout target {commit_id} is not a commit"
        )));
    }
    let tree_id = object::commit_tree_id(&payload)?;
    checkout_tree(store, &tree_id, work_root)
}

fn checkout_tree(store: &ObjectStore, tree_id: &ObjectId, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    let (kind, payload) = store.get(tree_id)?;
    if kind != ObjectKind::Tree {
        return Err(GitError::MalformedObject(format!(
            "{tree_id} is not a tree"
        )));
    }

    for entry in object::decode_tree(&payload)? {
        let name = String::from_utf8_lossy(&entry.name).to_string();
        let path = dir.join(name);

        match entry.mode {
            Mode::Directory => checkout_tree(store, &entry.target, &path)?,
            Mode::File | Mode::Executable => {
                let (blob_kind, blob_payload) = store.get(&entry.target)?;
                if blob_kind != ObjectKind::Blob {
                    return Err(GitError::MalformedObject(format!(
                        "tree entry {} does not reference a blob",
                        entry.target
                    )));
                }
                fs::write(&path, &blob_payload)?;
                set_mode(&path, entry.mode)?;
            }
            Mode::Symlink => {
                let (blob_kind, blob_payload) = store.get(&entry.target)?;
                if blob_kind != ObjectKind::Blob {
                    return Err(GitError::MalformedObject(format!(
                        "symlink entry {} does not reference a blob",
                        entry.target
                    )));
                }
                write_symlink(&blob_payload, &path)?;
            }
        }
    }

    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: Mode) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let bits = match mode {
        Mode::Executable => 0o755,
        _ => 0o644,
    };
    fs::set_permissions(path, fs::Permissions::from_mode(bits))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: Mode) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn write_symlink(target_bytes: &[u8], path: &Path) -> Result<()> {
    let target = String::from_utf8_lossy(target_bytes).to_string();
    std::os::unix::fs::symlink(target, path)?;
    Ok(())
}

#[cfg(not(unix))]
fn write_symlink(target_bytes: &[u8], path: &Path) -> Result<()> {
    // Symlinks aren't universally available; fall back to writing the
    // target text as a regular file, per spec.
    fs::write(path, target_bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{encode_and_hash, Mode, TreeEntry};

    #[test]
    fn checks_out_nested_tree() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path().join(".git"));

        let blob_id = store.put(ObjectKind::Blob, b"contents").unwrap();
        let sub_entries = vec![TreeEntry {
            mode: Mode::File,
            name: b"inner.txt".to_vec(),
            target: blob_id,
        }];
        let sub_tree_payload = object::encode_tree(&sub_entries);
        let sub_tree_id = store.put(ObjectKind::Tree, &sub_tree_payload).unwrap();

        let root_entries = vec![
            TreeEntry {
                mode: Mode::File,
                name: b"a.txt".to_vec(),
                target: blob_id,
            },
            TreeEntry {
                mode: Mode::Directory,
                name: b"sub".to_vec(),
                target: sub_tree_id,
            },
        ];
        let root_tree_payload = object::encode_tree(&root_entries);
        let root_tree_id = store.put(ObjectKind::Tree, &root_tree_payload).unwrap();

        let commit_payload = format!("tree {root_tree_id}\n\nmsg\n");
        let (commit_id, _) = encode_and_hash(ObjectKind::Commit, commit_payload.as_bytes());
        store.put(ObjectKind::Commit, commit_payload.as_bytes()).unwrap();

        let work_root = dir.path().join("work");
        checkout(&store, &commit_id, &work_root).unwrap();

        assert_eq!(
            std::fs::read(work_root.join("a.txt")).unwrap(),
            b"contents"
        );
        assert_eq!(
            std::fs::read(work_root.join("sub").join("inner.txt")).unwrap(),
            b"contents"
        );
    }
}
