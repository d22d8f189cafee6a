use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use bstr::ByteSlice;
use rayon::prelude::*;
use tracing::*;
use walkdir::{DirEntry, WalkDir};

use super::database::Database;
use crate::config::GIT_DIR;
use crate::digest::Digest;
use crate::filemode::FileMode;
use crate::storable::tree::{Entry, Tree};
use crate::{Error, Result};

impl Database {
    /// Snapshot `base` into tree and blob objects and return the root tree's digest.
    ///
    /// Subdirectories become trees with [`FileMode::DIRECTORY`], regular files become blobs with
    /// [`FileMode::REGULAR`]. Metadata directories are skipped at every level, as is anything
    /// that is neither a file nor a directory. Siblings are written in parallel; entry order
    /// comes from sorting by name, never from directory listing order.
    pub fn write_tree(&self, base: &Path) -> Result<Digest> {
        if !base.is_dir() {
            return Err(Error::PathNotFound(base.to_owned()));
        }
        trace!(path = ?base, "Writing tree");
        self.write_dir(base)
    }

    fn write_dir(&self, dir: &Path) -> Result<Digest> {
        let children = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .into_iter()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(io::Error::from)?;

        let entries = children
            .par_iter()
            .map(|child| self.write_entry(child))
            .collect::<Result<Vec<_>>>()?;

        let tree = Tree::new(entries.into_iter().flatten().collect());
        let oid = self.store(&tree)?;
        debug!(path = ?dir, %oid, entries = tree.entries().len(), "Stored tree");
        Ok(oid)
    }

    fn write_entry(&self, child: &DirEntry) -> Result<Option<Entry>> {
        let name = child.file_name();
        if name == GIT_DIR {
            return Ok(None);
        }
        let raw_name = <[u8]>::from_os_str(name).ok_or_else(|| {
            Error::malformed(format!("file name is not representable: {name:?}"))
        })?;

        let file_type = child.file_type();
        if file_type.is_dir() {
            let oid = self.write_dir(child.path())?;
            Entry::new(FileMode::DIRECTORY, raw_name, oid).map(Some)
        } else if file_type.is_file() {
            let file = File::open(child.path())?;
            let size = file.metadata()?.len();
            let oid = self.write_blob(BufReader::new(file), size)?;
            trace!(path = ?child.path(), %oid, "Stored blob");
            Entry::new(FileMode::REGULAR, raw_name, oid).map(Some)
        } else {
            warn!(path = ?child.path(), "Skipping entry that is neither a file nor a directory");
            Ok(None)
        }
    }
}
