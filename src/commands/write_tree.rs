use std::{fs, path::Path};

use anyhow::Context;

use git_minimal::object::{self, Mode, ObjectId, ObjectKind, TreeEntry};
use git_minimal::store::ObjectStore;

/// git write-tree command
pub fn invoke() -> anyhow::Result<()> {
    let store = ObjectStore::new(".git");
    let Some(id) =
        write_tree_for(Path::new("."), &store).context("constructing root tree object")?
    else {
        anyhow::bail!("asked to make tree object for empty tree");
    };

    println!("{id}");

    Ok(())
}

fn write_tree_for(path: &Path, store: &ObjectStore) -> anyhow::Result<Option<ObjectId>> {
    let mut dir_entries = Vec::new();
    for entry in fs::read_dir(path).context("opening a directory")? {
        let entry = entry.with_context(|| format!("bad directory entry in {}", path.display()))?;
        if entry.file_name() == ".git" {
            continue;
        }
        dir_entries.push(entry);
    }

    let mut entries = Vec::new();
    for entry in dir_entries {
        let metadata = entry
            .metadata()
            .with_context(|| format!("metadata for {}", entry.path().display()))?;
        let name = entry.file_name().as_encoded_bytes().to_vec();

        if metadata.is_dir() {
            if let Some(target) = write_tree_for(&entry.path(), store)? {
                entries.push(TreeEntry {
                    mode: Mode::Directory,
                    name,
                    target,
                });
            }
            continue;
        }

        let mode = mode_for(&metadata);
        let content = if mode == Mode::Symlink {
            fs::read_link(entry.path())
                .with_context(|| format!("reading link target of {}", entry.path().display()))?
                .into_os_string()
                .into_encoded_bytes()
        } else {
            fs::read(entry.path())
                .with_context(|| format!("reading {}", entry.path().display()))?
        };
        let target = store
            .put(ObjectKind::Blob, &content)
            .context("writing blob to object store")?;

        entries.push(TreeEntry {
            mode,
            name,
            target,
        });
    }

    if entries.is_empty() {
        return Ok(None);
    }

    let payload = object::encode_tree(&entries);
    let id = store
        .put(ObjectKind::Tree, &payload)
        .context("writing tree to object store")?;

    Ok(Some(id))
}

#[cfg(unix)]
fn mode_for(metadata: &fs::Metadata) -> Mode {
    use std::os::unix::fs::PermissionsExt;
    if metadata.is_symlink() {
        Mode::Symlink
    } else if metadata.permissions().mode() & 0o111 != 0 {
        Mode::Executable
    } else {
        Mode::File
    }
}

#[cfg(not(unix))]
fn mode_for(metadata: &fs::Metadata) -> Mode {
    if metadata.is_symlink() {
        Mode::Symlink
    } else {
        Mode::File
    }
}
