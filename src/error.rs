use std::io;
use std::path::PathBuf;

use crate::digest::Digest;
use crate::storable::ObjectKind;

/// Errors from object store operations.
///
/// Each category gets its own variant so callers can pick a recovery policy: only [`Error::Io`]
/// is ever worth retrying.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No file exists at the location derived from the digest.
    #[error("object not found: {0:x}")]
    ObjectNotFound(Digest),

    /// The header or payload does not follow the object grammar.
    #[error("malformed object: {reason}")]
    MalformedObject { reason: String },

    /// A type-checked read found a differently-typed object.
    #[error("object {oid:x} is a {actual}, expected a {expected}")]
    WrongObjectType {
        oid: Digest,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    /// The compressed envelope failed to inflate, or ended early.
    #[error("corrupt object: {reason}")]
    CorruptObject { reason: String },

    #[error("invalid digest {input:?}: {source}")]
    InvalidDigest {
        input: String,
        #[source]
        source: hex::FromHexError,
    },

    #[error("path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    /// The content stream did not hold the number of bytes the caller declared.
    #[error("size mismatch: declared {declared} bytes, read {actual}")]
    SizeMismatch { declared: u64, actual: u64 },

    /// An existing HEAD file holds something other than a symbolic or detached ref.
    #[error("HEAD at {} has unexpected contents: {contents:?}", .path.display())]
    CorruptHead { path: PathBuf, contents: String },

    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedObject {
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptObject {
            reason: reason.into(),
        }
    }

    /// Whether the failure may be transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Smuggle a typed error through an [`io::Read`] implementation. The matching
    /// `From<io::Error>` impl unwraps it again.
    pub(crate) fn into_io(self) -> io::Error {
        match self {
            Self::Io(e) => e,
            e => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        let typed = e
            .get_ref()
            .map_or(false, |inner| inner.downcast_ref::<Error>().is_some());
        if !typed {
            return Self::Io(e);
        }
        match e.into_inner().map(|inner| inner.downcast::<Error>()) {
            Some(Ok(inner)) => *inner,
            _ => unreachable!("inner error was checked to be an odb::Error"),
        }
    }
}

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;
