use anyhow::Context;

use git_minimal::object::{self, ObjectId, ObjectKind};
use git_minimal::store::ObjectStore;

/// git ls-tree --name-only command
pub fn invoke(hash: &str, name_only: bool) -> anyhow::Result<()> {
    let store = ObjectStore::new(".git");
    let id = ObjectId::from_hex(hash).context("parsing tree id")?;
    let (kind, payload) = store.get(&id).context("reading tree from store")?;
    anyhow::ensure!(kind == ObjectKind::Tree, "incorrect object type '{kind}'");

    let mut entries = object::decode_tree(&payload).context("decoding tree entries")?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    for entry in entries {
        let name = String::from_utf8_lossy(&entry.name);
        if name_only {
            println!("{name}");
        } else {
            println!("{} {} {}\t{name}", entry.mode.as_str(), object_kind_for(&entry), entry.target);
        }
    }

    Ok(())
}

fn object_kind_for(entry: &git_minimal::object::TreeEntry) -> &'static str {
    if entry.mode.is_directory() {
        "tree"
    } else {
        "blob"
    }
}
