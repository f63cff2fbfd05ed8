//! On-disk repository layout helpers shared by `init` and `clone`: the
//! `.git` directory skeleton, the symbolic `HEAD`, and `refs/heads/main`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::object::ObjectId;

pub const DEFAULT_BRANCH: &str = "main";

/// Creates `<root>/.git/{objects,refs/heads}` and a symbolic `HEAD`
/// pointing at `refs/heads/main`. Returns the `.git` directory path.
pub fn init_repository(root: &Path) -> Result<PathBuf> {
    let git_dir = root.join(".git");
    fs::create_dir_all(git_dir.join("objects"))?;
    fs::create_dir_all(git_dir.join("refs").join("heads"))?;
    fs::write(
        git_dir.join("HEAD"),
        format!("ref: refs/heads/{DEFAULT_BRANCH}\n"),
    )?;
    Ok(git_dir)
}

/// Writes `refs/heads/main` containing `<head_id>\n`, creating parent
/// directories as needed.
pub fn write_main_ref(git_dir: &Path, head_id: &ObjectId) -> Result<()> {
    let refs_dir = git_dir.join("refs").join("heads");
    fs::create_dir_all(&refs_dir)?;
    fs::write(
        refs_dir.join(DEFAULT_BRANCH),
        format!("{}\n", head_id.to_hex()),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_expected_layout() {
        let dir = tempfile::tempdir().unwrap();
        let git_dir = init_repository(dir.path()).unwrap();
        assert!(git_dir.join("objects").is_dir());
        assert!(git_dir.join("refs").join("heads").is_dir());
        assert_eq!(
            fs::read_to_string(git_dir.join("HEAD")).unwrap(),
            "ref: refs/heads/main\n"
        );
    }

    #[test]
    fn write_main_ref_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let git_dir = dir.path().join(".git");
        let id = ObjectId::from_hex(&"c".repeat(40)).unwrap();
        write_main_ref(&git_dir, &id).unwrap();
        assert_eq!(
            fs::read_to_string(git_dir.join("refs").join("heads").join("main")).unwrap(),
            format!("{}\n", "c".repeat(40))
        );
    }
}
