use std::io::{self, Read};

use bstr::{BStr, BString, ByteSlice};

use super::{next_byte, ObjectKind, Storable};
use crate::digest::Digest;
use crate::filemode::FileMode;
use crate::{Error, Result};

/// A tree entry as stored: `<mode> <name>\0<oid>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    mode: FileMode,
    name: BString,
    oid: Digest,
}

impl Entry {
    /// `name` must be a single path segment: non-empty, without `/` or NUL.
    pub fn new(mode: FileMode, name: impl Into<BString>, oid: Digest) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.contains(&b'/') || name.contains(&b'\0') {
            return Err(Error::malformed(format!("invalid tree entry name {name:?}")));
        }
        Ok(Self { mode, name, oid })
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    pub fn name(&self) -> &BStr {
        self.name.as_bstr()
    }

    pub fn oid(&self) -> &Digest {
        &self.oid
    }

    /// Parses one entry of the form `<mode> <name>\0<oid>`. Returns `None` if the stream is
    /// already at its end.
    fn read_from<R: Read>(mut r: R) -> Result<Option<Self>> {
        let mut mode = Vec::with_capacity(6);
        match next_byte(&mut r)? {
            None => return Ok(None),
            Some(b) => mode.push(b),
        }
        loop {
            match next_byte(&mut r)? {
                None => return Err(Error::malformed("tree entry truncated in mode")),
                Some(b' ') => break,
                Some(b) => mode.push(b),
            }
        }
        let mode = std::str::from_utf8(&mode)
            .ok()
            .and_then(|m| u32::from_str_radix(m, 8).ok())
            .map(FileMode)
            .ok_or_else(|| {
                Error::malformed(format!("invalid tree entry mode {:?}", mode.as_bstr()))
            })?;

        let mut name = Vec::new();
        loop {
            match next_byte(&mut r)? {
                None => return Err(Error::malformed("tree entry truncated in name")),
                Some(b'\0') => break,
                Some(b) => name.push(b),
            }
        }

        let mut oid = [0u8; Digest::LEN];
        r.read_exact(&mut oid).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::malformed("tree entry truncated in digest"),
            _ => Error::from(e),
        })?;

        Self::new(mode, name, Digest(oid)).map(Some)
    }

    fn write_to(&self, data: &mut Vec<u8>) {
        data.extend_from_slice(format!("{:o}", self.mode).as_bytes());
        data.push(b' ');
        data.extend_from_slice(&self.name);
        data.push(b'\0');
        data.extend_from_slice(&*self.oid);
    }
}

/// An [`Entry`] together with the kind of the object it references, as resolved from the
/// database when the tree is listed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedEntry {
    pub entry: Entry,
    pub kind: ObjectKind,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<Entry>,
}

impl Tree {
    /// Entries are sorted by name in byte order, whatever order they are given in.
    pub fn new(mut entries: Vec<Entry>) -> Self {
        entries.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        Self { entries }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    /// Decode a tree payload of exactly `size` bytes. Entries are kept in stored order.
    pub fn read_from<R: Read>(r: R, size: u64) -> Result<Self> {
        let mut r = r.take(size);
        let mut entries = Vec::new();
        while let Some(entry) = Entry::read_from(&mut r)? {
            entries.push(entry);
        }
        if r.limit() != 0 {
            return Err(Error::malformed(format!(
                "tree payload ended {} bytes short of its declared size",
                r.limit()
            )));
        }
        Ok(Self { entries })
    }
}

impl Storable for Tree {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Tree
    }

    fn format(&self) -> Vec<u8> {
        let mut data = Vec::new();
        for entry in &self.entries {
            entry.write_to(&mut data);
        }
        data
    }
}
