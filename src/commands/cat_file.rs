use std::io::Write;

use anyhow::Context;

use git_minimal::object::ObjectId;
use git_minimal::store::ObjectStore;

/// git cat-file -p command
pub fn invoke(hash: &str, type_only: bool, size_only: bool) -> anyhow::Result<()> {
    let store = ObjectStore::new(".git");
    let id = ObjectId::from_hex(hash).context("parsing object id")?;
    let (kind, payload) = store.get(&id).context("reading object from store")?;

    if type_only {
        println!("{kind}");
        return Ok(());
    }

    if size_only {
        println!("{}", payload.len());
        return Ok(());
    }

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&payload)
        .context("writing object payload to stdout")?;

    Ok(())
}
