use std::fmt::Write;

use anyhow::Context;

use git_minimal::config::{self, Identity};
use git_minimal::object::{ObjectId, ObjectKind};
use git_minimal::store::ObjectStore;

/// git commit-tree command
pub fn invoke(
    tree_hash: &str,
    message: &str,
    parent_hash: Option<String>,
) -> anyhow::Result<ObjectId> {
    let store = ObjectStore::new(".git");
    let tree_id = ObjectId::from_hex(tree_hash).context("parsing tree id")?;
    anyhow::ensure!(
        store.contains(&tree_id),
        "tree object does not exist: {tree_hash}"
    );

    let mut commit = String::new();
    writeln!(commit, "tree {tree_hash}")?;

    if let Some(parent_hash) = &parent_hash {
        writeln!(commit, "parent {parent_hash}")?;
    }

    let identity = Identity::from_env();
    let epoch_secs = config::now_epoch_secs().context("reading current time")?;
    let signature = identity.signature_line(epoch_secs);

    writeln!(commit, "author {signature}")?;
    writeln!(commit, "committer {signature}")?;
    writeln!(commit, "\n{message}")?;

    store
        .put(ObjectKind::Commit, commit.as_bytes())
        .context("writing commit to object store")
}
