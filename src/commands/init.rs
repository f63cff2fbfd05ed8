use std::path::Path;

use anyhow::Context;

use git_minimal::repo;

/// git init command
pub fn invoke() -> anyhow::Result<()> {
    repo::init_repository(Path::new(".")).context("creating git directories")?;
    println!("Initialized git directory");
    Ok(())
}
