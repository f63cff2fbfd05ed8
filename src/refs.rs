//! Ref discovery (spec component E): finds the remote's HEAD object id
//! over the v2 smart-HTTP protocol.

use crate::error::{GitError, Result};
use crate::object::ObjectId;
use crate::pkt_line;
use crate::transport::{Method, Transport};

/// 1. `GET {base_url}/info/refs?service=git-upload-pack`, expecting the
///    first pkt-line to be `# service=git-upload-pack` followed by a
///    flush (remaining capability pkt-lines, if any, are skipped).
/// 2. `POST {base_url}/git-upload-pack` with an `ls-refs` command.
/// 3. Scan the response for a line mentioning `HEAD` and take its first
///    40 hex characters as the head id.
pub fn discover_head(transport: &Transport, base_url: &str) -> Result<ObjectId> {
    let info_refs_url = format!("{base_url}/info/refs?service=git-upload-pack");
    let advertisement = transport.request(&info_refs_url, Method::Get, None)?;

    let (first_line, consumed) = pkt_line::decode(&advertisement)?;
    match first_line {
        Some(payload) if payload.starts_with(b"# service=git-upload-pack") => {}
        other => {
            return Err(GitError::ProtocolError(format!(
                "unexpected first pkt-line in service advertisement: {other:?}"
            )))
        }
    }

    // Skip forward past the announcement's flush, then any capability
    // pkt-lines up to their own flush.
    let mut offset = consumed;
    let (_flush, offset_after_announcement) = pkt_line::read_section(&advertisement, offset)?;
    offset = offset_after_announcement;
    let (_capabilities, _offset_after_caps) = pkt_line::read_section(&advertisement, offset)?;

    let mut body = pkt_line::encode_str("command=ls-refs");
    body.extend_from_slice(pkt_line::FLUSH);

    let upload_pack_url = format!("{base_url}/git-upload-pack");
    let response = transport.request(&upload_pack_url, Method::Post, Some(body))?;

    let (lines, _consumed) = pkt_line::read_section(&response, 0)?;
    for line in lines {
        if let Some(idx) = find_subsequence(&line, b"HEAD") {
            let _ = idx;
            if line.len() < 40 {
                continue;
            }
            let hex_str = std::str::from_utf8(&line[..40])
                .map_err(|_| GitError::ProtocolError("HEAD line is not ASCII hex".into()))?;
            return ObjectId::from_hex(hex_str);
        }
    }

    Err(GitError::HeadNotFound)
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_head_in_ls_refs_response() {
        let head_hex = "a".repeat(40);
        let mut line = head_hex.clone().into_bytes();
        line.extend_from_slice(b" HEAD");
        let mut response = pkt_line::encode(&line);
        response.extend_from_slice(pkt_line::FLUSH);

        let (lines, _) = pkt_line::read_section(&response, 0).unwrap();
        let found = lines
            .iter()
            .find(|l| find_subsequence(l, b"HEAD").is_some())
            .unwrap();
        let id = ObjectId::from_hex(std::str::from_utf8(&found[..40]).unwrap()).unwrap();
        assert_eq!(id.to_hex(), head_hex);
    }
}
