//! Pkt-line framing (spec component C): a 4-hex-digit length prefix
//! (inclusive of itself) followed by payload, plus the `0000` flush and
//! `0001` delimiter sentinels.

use crate::error::{GitError, Result};

pub const FLUSH: &[u8] = b"0000";
pub const DELIMITER: &[u8] = b"0001";

/// `printf("%04x", len(payload) + 4) + payload`.
pub fn encode(payload: &[u8]) -> Vec<u8> {
    let total_len = payload.len() + 4;
    let mut out = format!("{total_len:04x}").into_bytes();
    out.extend_from_slice(payload);
    out
}

pub fn encode_str(payload: &str) -> Vec<u8> {
    encode(payload.as_bytes())
}

/// Decodes a single pkt-line at the start of `buf`.
///
/// Returns `(None, 0)` for a flush line. Otherwise returns the payload
/// slice (possibly empty, as for the `0001` delimiter) and the total
/// number of bytes consumed including the 4-byte length header.
pub fn decode(buf: &[u8]) -> Result<(Option<&[u8]>, usize)> {
    if buf.len() < 4 {
        return Err(GitError::MalformedFrame(
            "buffer shorter than a pkt-line length header".into(),
        ));
    }

    let len_str = std::str::from_utf8(&buf[..4])
        .map_err(|_| GitError::MalformedFrame("length prefix is not ASCII hex".into()))?;
    let len = usize::from_str_radix(len_str, 16)
        .map_err(|_| GitError::MalformedFrame(format!("invalid length prefix '{len_str}'")))?;

    if len == 0 {
        return Ok((None, 0));
    }
    if len == 1 {
        // The `0001` delimiter/section sentinel: a valid line with no payload.
        return Ok((Some(&buf[4..4]), 4));
    }
    if len < 4 {
        return Err(GitError::MalformedFrame(format!(
            "length {len} is invalid (2-3 are reserved)"
        )));
    }
    if buf.len() < len {
        return Err(GitError::MalformedFrame(
            "pkt-line payload truncated".into(),
        ));
    }

    Ok((Some(&buf[4..len]), len))
}

/// Iterates pkt-lines in `buf` starting at `offset` until a flush line or
/// the end of the buffer, returning the consumed length and every payload
/// seen along the way (flush lines themselves are not included).
pub fn read_section(buf: &[u8], mut offset: usize) -> Result<(Vec<Vec<u8>>, usize)> {
    let mut lines = Vec::new();
    while offset < buf.len() {
        let (payload, consumed) = decode(&buf[offset..])?;
        match payload {
            None => {
                offset += 4;
                break;
            }
            Some(data) => {
                lines.push(data.to_vec());
                offset += consumed;
            }
        }
    }
    Ok((lines, offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_matches_git_convention() {
        assert_eq!(encode_str("hello"), b"0009hello");
        assert_eq!(encode(b""), b"0004");
    }

    #[test]
    fn decode_flush() {
        assert_eq!(decode(b"0000").unwrap(), (None, 0));
    }

    #[test]
    fn decode_payload() {
        let line = encode_str("hello");
        let (payload, consumed) = decode(&line).unwrap();
        assert_eq!(payload, Some(b"hello".as_slice()));
        assert_eq!(consumed, line.len());
    }

    #[test]
    fn decode_rejects_short_length() {
        assert!(decode(b"0001").is_ok()); // delimiter: payload is empty, not an error
        assert!(decode(b"0002x").is_err());
        assert!(decode(b"0003xx").is_err());
    }

    #[test]
    fn read_section_stops_at_flush() {
        let mut buf = encode_str("a");
        buf.extend(encode_str("b"));
        buf.extend(FLUSH);
        buf.extend(encode_str("c"));

        let (lines, consumed) = read_section(&buf, 0).unwrap();
        assert_eq!(lines, vec![b"a".to_vec(), b"b".to_vec()]);
        assert_eq!(consumed, buf.len() - encode_str("c").len());
    }
}
