use std::fmt;

/// Typed failure modes for the object/pack pipeline.
///
/// Command code mostly just bubbles these up through `anyhow::Context`
/// (matching the rest of the crate), but keeping a closed enum here lets
/// callers that care - like the delta resolver's fixpoint loop - match on
/// a specific kind instead of grepping a formatted string.
#[derive(Debug)]
pub enum GitError {
    MalformedObject(String),
    MalformedFrame(String),
    UnsupportedVersion(u32),
    UnknownType(u8),
    MalformedDelta(String),
    DeltaBaseSizeMismatch { expected: usize, actual: usize },
    DeltaTargetSizeMismatch { expected: usize, actual: usize },
    UnresolvedDelta(usize),
    UnsupportedMode(String),
    ProtocolError(String),
    HeadNotFound,
    NotFound(String),
    IOError(std::io::Error),
    TransportError(String),
}

impl fmt::Display for GitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitError::MalformedObject(msg) => write!(f, "malformed object: {msg}"),
            GitError::MalformedFrame(msg) => write!(f, "malformed pkt-line frame: {msg}"),
            GitError::UnsupportedVersion(v) => write!(f, "unsupported packfile version {v}"),
            GitError::UnknownType(t) => write!(f, "unknown pack object type id {t}"),
            GitError::MalformedDelta(msg) => write!(f, "malformed delta instructions: {msg}"),
            GitError::DeltaBaseSizeMismatch { expected, actual } => write!(
                f,
                "delta base size mismatch: expected {expected}, got {actual}"
            ),
            GitError::DeltaTargetSizeMismatch { expected, actual } => write!(
                f,
                "delta target size mismatch: expected {expected}, got {actual}"
            ),
            GitError::UnresolvedDelta(remaining) => {
                write!(f, "{remaining} ref-delta object(s) could not be resolved")
            }
            GitError::UnsupportedMode(mode) => write!(f, "unsupported tree entry mode '{mode}'"),
            GitError::ProtocolError(msg) => write!(f, "protocol error: {msg}"),
            GitError::HeadNotFound => write!(f, "remote did not advertise a HEAD reference"),
            GitError::NotFound(id) => write!(f, "object not found: {id}"),
            GitError::IOError(err) => write!(f, "i/o error: {err}"),
            GitError::TransportError(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

impl std::error::Error for GitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GitError::IOError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GitError {
    fn from(err: std::io::Error) -> Self {
        GitError::IOError(err)
    }
}

impl From<reqwest::Error> for GitError {
    fn from(err: reqwest::Error) -> Self {
        GitError::TransportError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GitError>;
