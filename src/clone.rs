//! The clone orchestrator (spec component J): wires together ref
//! discovery, the fetch transport, pack ingestion and checkout.

use std::path::Path;

use crate::delta::{self, IngestStats};
use crate::error::Result;
use crate::pack;
use crate::pkt_line;
use crate::refs;
use crate::repo;
use crate::store::ObjectStore;
use crate::transport::{Method, Transport};

pub struct CloneReport {
    pub head_id: crate::object::ObjectId,
    pub stats: IngestStats,
}

/// `clone(url, dir)`:
/// 1. init `dir/.git`.
/// 2. discover HEAD.
/// 3. fetch the pack for HEAD.
/// 4. parse and resolve it into the object store.
/// 5. write `refs/heads/main`.
/// 6. check out HEAD's tree into `dir`.
pub fn clone(url: &str, dir: &Path) -> Result<CloneReport> {
    let url = url.trim_end_matches('/');

    log::info!("initializing repository in {}", dir.display());
    let git_dir = repo::init_repository(dir)?;
    let store = ObjectStore::new(&git_dir);

    let transport = Transport::new();

    log::info!("discovering HEAD from {url}");
    let head_id = refs::discover_head(&transport, url)?;
    log::info!("HEAD is {head_id}");

    let pack_bytes = fetch_pack(&transport, url, &head_id)?;

    log::info!("parsing packfile");
    let entries = pack::parse_pack_stream(&pack_bytes)?;
    log::info!("packfile contains {} entries", entries.len());

    let stats = delta::resolve_and_store(entries, &store)?;
    log::info!(
        "ingested {} direct object(s), resolved {} delta(s), dropped {} OFS_DELTA entry(ies)",
        stats.direct_objects,
        stats.resolved_deltas,
        stats.dropped_ofs_deltas
    );

    repo::write_main_ref(&git_dir, &head_id)?;

    log::info!("checking out working tree");
    crate::checkout::checkout(&store, &head_id, dir)?;

    Ok(CloneReport { head_id, stats })
}

fn fetch_pack(
    transport: &Transport,
    url: &str,
    head_id: &crate::object::ObjectId,
) -> Result<Vec<u8>> {
    let mut body = pkt_line::encode_str("command=fetch");
    body.extend_from_slice(pkt_line::DELIMITER);
    body.extend_from_slice(&pkt_line::encode_str("no-progress"));
    body.extend_from_slice(&pkt_line::encode_str(&format!("want {head_id}")));
    body.extend_from_slice(pkt_line::FLUSH);

    let fetch_url = format!("{url}/git-upload-pack");
    transport.request(&fetch_url, Method::Post, Some(body))
}
