pub mod blob;
pub mod commit;
pub mod tree;

use std::fmt::Display;
use std::io::{self, Read, Write};

use crate::digest::Digest;
use crate::{Error, Result};

/// Longest kind token, `"commit"`.
const MAX_KIND_LEN: usize = 6;
/// `u64::MAX` has 20 decimal digits.
const MAX_SIZE_DIGITS: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl ObjectKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }

    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"blob" => Some(Self::Blob),
            b"tree" => Some(Self::Tree),
            b"commit" => Some(Self::Commit),
            _ => None,
        }
    }
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The `"{kind} {size}\0"` prefix of every encoded object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub kind: ObjectKind,
    pub size: u64,
}

impl Header {
    pub fn new(kind: ObjectKind, size: u64) -> Self {
        Self { kind, size }
    }

    pub fn encode(&self) -> Vec<u8> {
        format!("{} {}\0", self.kind, self.size).into_bytes()
    }

    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_all(&self.encode())
    }

    /// Parse a header from the front of a stream, leaving the reader positioned at the first
    /// payload byte. Only the header bytes are consumed.
    pub fn read_from<R: Read>(mut r: R) -> Result<Self> {
        let mut token = Vec::with_capacity(MAX_KIND_LEN);
        loop {
            match next_byte(&mut r)? {
                None => return Err(Error::malformed("unexpected end of header in kind")),
                Some(b' ') => break,
                Some(b) if token.len() < MAX_KIND_LEN => token.push(b),
                Some(_) => {
                    return Err(Error::malformed(format!(
                        "unknown object kind starting {:?}",
                        String::from_utf8_lossy(&token)
                    )))
                }
            }
        }
        let kind = ObjectKind::from_name(&token).ok_or_else(|| {
            Error::malformed(format!(
                "unknown object kind {:?}",
                String::from_utf8_lossy(&token)
            ))
        })?;

        let mut digits = Vec::with_capacity(MAX_SIZE_DIGITS);
        loop {
            match next_byte(&mut r)? {
                None => return Err(Error::malformed("unexpected end of header in size")),
                Some(b'\0') => break,
                Some(b @ b'0'..=b'9') if digits.len() < MAX_SIZE_DIGITS => digits.push(b),
                Some(b'0'..=b'9') => {
                    return Err(Error::malformed("object size does not fit in 64 bits"))
                }
                Some(b) => {
                    return Err(Error::malformed(format!(
                        "expected a digit in object size, got byte {b:#04x}"
                    )))
                }
            }
        }

        Ok(Self {
            kind,
            size: parse_decimal(&digits)?,
        })
    }
}

/// Parse an ASCII-decimal length: non-empty, digits only, no leading zero unless it is `0`.
fn parse_decimal(digits: &[u8]) -> Result<u64> {
    match digits {
        [] => return Err(Error::malformed("empty object size")),
        [b'0', _, ..] => return Err(Error::malformed("object size has a leading zero")),
        _ => {}
    }
    digits.iter().try_fold(0u64, |acc, &d| {
        acc.checked_mul(10)
            .and_then(|acc| acc.checked_add(u64::from(d - b'0')))
            .ok_or_else(|| Error::malformed("object size does not fit in 64 bits"))
    })
}

/// Read a single byte, `None` at end of stream.
pub(crate) fn next_byte<R: Read>(mut r: R) -> Result<Option<u8>> {
    let mut b = [0u8; 1];
    loop {
        match r.read(&mut b) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(b[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Produce the canonical encoding `"{kind} {len}\0{payload}"`.
pub fn encode(kind: ObjectKind, payload: &[u8]) -> Vec<u8> {
    let mut formatted = Header::new(kind, payload.len() as u64).encode();
    formatted.extend_from_slice(payload);
    formatted
}

/// An object whose payload can be produced in memory.
pub trait Storable {
    fn kind(&self) -> ObjectKind;

    /// The payload, without the header.
    fn format(&self) -> Vec<u8>;
}

/// The encoded form of a [`Storable`] together with its digest.
pub struct DatabaseObject {
    kind: ObjectKind,
    formatted: Vec<u8>,
    header_len: usize,
    oid: Digest,
}

impl DatabaseObject {
    pub fn new<T: Storable + ?Sized>(obj: &T) -> Self {
        let payload = obj.format();
        let formatted = encode(obj.kind(), &payload);
        let oid = Digest::new(&formatted);
        Self {
            kind: obj.kind(),
            header_len: formatted.len() - payload.len(),
            formatted,
            oid,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Returns the storable uncompressed but formatted `"{type} {len}\0{data}"`.
    /// e.g.
    /// a blob `"hello\n"` becomes `"blob 6\0hello\n"`
    pub fn formatted(&self) -> &[u8] {
        &self.formatted
    }

    /// The formatted bytes after the header.
    pub fn payload(&self) -> &[u8] {
        &self.formatted[self.header_len..]
    }

    pub fn oid(&self) -> &Digest {
        &self.oid
    }

    pub fn into_oid(self) -> Digest {
        self.oid
    }
}
