use std::io::{self, Read};

use super::{Header, ObjectKind, Storable};
use crate::digest::{Digest, HashingWriter};
use crate::{Error, Result};

/// An in-memory blob. Large content goes through [`hash`] and the database's streaming
/// writer instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    data: Vec<u8>,
}

impl Storable for Blob {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Blob
    }

    fn format(&self) -> Vec<u8> {
        self.data.clone()
    }
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Copy exactly `size` bytes of `content` into `w`, failing if the stream is shorter or longer.
pub(crate) fn copy_exact<R: Read, W: io::Write>(content: R, size: u64, w: &mut W) -> Result<()> {
    let mut content = content.take(size);
    let copied = io::copy(&mut content, w)?;
    if copied != size {
        return Err(Error::SizeMismatch {
            declared: size,
            actual: copied,
        });
    }
    let extra = io::copy(&mut content.into_inner(), &mut io::sink())?;
    if extra != 0 {
        return Err(Error::SizeMismatch {
            declared: size,
            actual: size + extra,
        });
    }
    Ok(())
}

/// Digest the blob that `content` would be stored as, without storing it.
///
/// The header is hashed along with the content, so this matches the digest `write_blob` returns
/// for the same input.
pub fn hash<R: Read>(content: R, size: u64) -> Result<Digest> {
    let mut hasher = HashingWriter::sink();
    Header::new(ObjectKind::Blob, size).write_to(&mut hasher)?;
    copy_exact(content, size, &mut hasher)?;
    Ok(hasher.finish().1)
}
