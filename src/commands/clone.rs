use std::path::Path;

use anyhow::Context;

/// git clone command
pub fn invoke(repository_url: &str, dir: &str) -> anyhow::Result<()> {
    println!("Cloning into '{dir}'...");

    let report = git_minimal::clone::clone(repository_url, Path::new(dir))
        .with_context(|| format!("cloning {repository_url} into {dir}"))?;

    println!("HEAD is now at {}", report.head_id);
    println!("Received objects: {}", report.stats.direct_objects);
    println!("Resolved deltas: {}", report.stats.resolved_deltas);
    if report.stats.dropped_ofs_deltas > 0 {
        println!(
            "Dropped unsupported OFS_DELTA entries: {}",
            report.stats.dropped_ofs_deltas
        );
    }

    Ok(())
}
