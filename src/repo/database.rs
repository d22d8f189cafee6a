use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::*;

use crate::compress::{self, Inflater};
use crate::config::Config;
use crate::digest::{Digest, HashingWriter};
use crate::storable::blob::{self, Blob};
use crate::storable::commit::Commit;
use crate::storable::tree::{Tree, TypedEntry};
use crate::storable::{DatabaseObject, Header, ObjectKind, Storable};
use crate::util;
use crate::{Error, Result};

type Decompressed = BufReader<Inflater<BufReader<File>>>;

/// The loose-object store under `<root>/.git/objects`.
///
/// Objects are immutable once written, so readers need no coordination. Writers stage into a
/// temporary file in the objects directory and rename it into place, so a reader never sees a
/// partial object and two writers of the same object race harmlessly.
#[derive(Debug, Clone)]
pub struct Database {
    database_root: PathBuf,
    config: Config,
}

impl Database {
    pub fn new(objects_dir: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            database_root: objects_dir.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.database_root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `objects/<first two hex chars>/<remaining 38>`.
    pub fn object_path(&self, oid: &Digest) -> PathBuf {
        let oid = oid.to_hex();
        let (prefix, suffix) = oid.split_at(2);
        debug_assert_eq!(prefix.len(), 2);
        self.database_root.join(prefix).join(suffix)
    }

    pub fn exists(&self, oid: &Digest) -> bool {
        self.object_path(oid).is_file()
    }

    fn open(&self, oid: &Digest) -> Result<Decompressed> {
        let path = self.object_path(oid);
        let file = File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::ObjectNotFound(*oid),
            _ => Error::Io(e),
        })?;
        Ok(BufReader::new(Inflater::new(BufReader::new(file))))
    }

    /// Open an object and decode its header. The payload is decompressed lazily as the returned
    /// reader is consumed.
    pub fn read_object(&self, oid: &Digest) -> Result<ObjectReader> {
        trace!(object = %oid, "Reading object from database");
        let mut inner = self.open(oid)?;
        let header = Header::read_from(&mut inner)?;
        Ok(ObjectReader {
            oid: *oid,
            header,
            inner: inner.take(header.size),
            verified: false,
        })
    }

    fn read_typed(&self, oid: &Digest, expected: ObjectKind) -> Result<ObjectReader> {
        let reader = self.read_object(oid)?;
        if reader.kind() != expected {
            return Err(Error::WrongObjectType {
                oid: *oid,
                expected,
                actual: reader.kind(),
            });
        }
        Ok(reader)
    }

    /// Only the header is decompressed.
    pub fn type_of(&self, oid: &Digest) -> Result<ObjectKind> {
        Ok(self.read_object(oid)?.kind())
    }

    /// Payload size in bytes. Only the header is decompressed.
    pub fn size_of(&self, oid: &Digest) -> Result<u64> {
        Ok(self.read_object(oid)?.size())
    }

    /// A lazily-read stream of the blob's content.
    pub fn read_blob(&self, oid: &Digest) -> Result<ObjectReader> {
        self.read_typed(oid, ObjectKind::Blob)
    }

    pub fn read_tree(&self, oid: &Digest) -> Result<Tree> {
        self.read_typed(oid, ObjectKind::Tree)?.into_tree()
    }

    pub fn read_commit(&self, oid: &Digest) -> Result<Commit> {
        let reader = self.read_typed(oid, ObjectKind::Commit)?;
        Commit::parse(&reader.into_vec()?)
    }

    /// The entries of a tree, in stored order, each with the kind of the object it references.
    pub fn list_tree(&self, oid: &Digest) -> Result<Vec<TypedEntry>> {
        self.read_tree(oid)?
            .into_entries()
            .into_iter()
            .map(|entry| {
                let kind = self.type_of(entry.oid())?;
                Ok(TypedEntry { entry, kind })
            })
            .collect()
    }

    /// Decode an object of any kind into memory.
    pub fn load(&self, oid: &Digest) -> Result<LoadedItem> {
        let reader = self.read_object(oid)?;
        match reader.kind() {
            ObjectKind::Blob => Ok(LoadedItem::Blob(Blob::new(reader.into_vec()?))),
            ObjectKind::Tree => Ok(LoadedItem::Tree(reader.into_tree()?)),
            ObjectKind::Commit => Ok(LoadedItem::Commit(Commit::parse(&reader.into_vec()?)?)),
        }
    }

    /// The digest `write_blob` would return for this content. Nothing is written.
    pub fn hash_blob<R: Read>(&self, content: R, size: u64) -> Result<Digest> {
        blob::hash(content, size)
    }

    /// Stream `size` bytes of `content` into a new blob.
    pub fn write_blob<R: Read>(&self, content: R, size: u64) -> Result<Digest> {
        self.write_stream(Header::new(ObjectKind::Blob, size), content)
    }

    /// Write an in-memory object. Returns early if it is already stored.
    pub fn store<T: Storable + ?Sized>(&self, obj: &T) -> Result<Digest> {
        let obj = DatabaseObject::new(obj);
        trace!(oid = %obj.oid(), kind = %obj.kind(), "Writing object to database");
        if self.exists(obj.oid()) {
            return Ok(obj.into_oid());
        }
        let payload = obj.payload();
        let header = Header::new(obj.kind(), payload.len() as u64);
        let oid = self.write_stream(header, payload)?;
        debug_assert_eq!(&oid, obj.oid());
        Ok(oid)
    }

    fn write_stream<R: Read>(&self, header: Header, content: R) -> Result<Digest> {
        fs::create_dir_all(&self.database_root)?;
        let temp_path = self.database_root.join(util::tmp_file_name());
        let file = File::options()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;

        let oid = match self.deflate_into(file, header, content) {
            Ok(oid) => oid,
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                return Err(e);
            }
        };

        if let Err(e) = self.install(&temp_path, &oid) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        debug!(oid = %oid, kind = %header.kind, size = header.size, "Stored object");
        Ok(oid)
    }

    /// Compress header and content into `file`, digesting the uncompressed bytes on the way.
    fn deflate_into<R: Read>(&self, file: File, header: Header, content: R) -> Result<Digest> {
        let encoder = compress::deflate(BufWriter::new(file), self.config.compression);
        let mut w = HashingWriter::new(encoder);
        header.write_to(&mut w)?;
        blob::copy_exact(content, header.size, &mut w)?;

        let (encoder, oid) = w.finish();
        let mut file = encoder.finish()?.into_inner().map_err(|e| e.into_error())?;
        file.flush()?;
        file.sync_all()?;
        Ok(oid)
    }

    /// Move a finished temporary file to the object's final path.
    fn install(&self, temp_path: &Path, oid: &Digest) -> Result<()> {
        let object_path = self.object_path(oid);
        if object_path.exists() {
            trace!(oid = %oid, "Object already present");
            fs::remove_file(temp_path)?;
            return Ok(());
        }
        if let Some(dirname) = object_path.parent() {
            fs::create_dir_all(dirname)?;
        }
        fs::rename(temp_path, &object_path)?;
        Ok(())
    }
}

/// The payload of a stored object, decompressed on demand.
///
/// Reports a payload that ends before its declared size, and a compressed stream that ends
/// early or carries bytes past the declared size, as errors rather than short reads.
pub struct ObjectReader {
    oid: Digest,
    header: Header,
    inner: io::Take<Decompressed>,
    verified: bool,
}

impl ObjectReader {
    pub fn oid(&self) -> &Digest {
        &self.oid
    }

    pub fn kind(&self) -> ObjectKind {
        self.header.kind
    }

    pub fn size(&self) -> u64 {
        self.header.size
    }

    pub fn into_vec(mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.size().min(1 << 20) as usize);
        self.read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn into_tree(mut self) -> Result<Tree> {
        let size = self.size();
        let tree = Tree::read_from(&mut self, size)?;
        self.finish()?;
        Ok(tree)
    }

    /// Check that the payload was consumed and the stored object ends where its header says.
    pub fn finish(mut self) -> Result<()> {
        let mut rest = [0u8; 64];
        match self.read(&mut rest)? {
            0 => Ok(()),
            _ => Err(Error::malformed(format!(
                "object {} has unread payload",
                self.oid
            ))),
        }
    }

    fn verify_end(&mut self) -> Result<()> {
        if self.inner.limit() > 0 {
            return Err(Error::malformed(format!(
                "object {} ended {} bytes short of its declared size",
                self.oid,
                self.inner.limit()
            )));
        }
        let mut rest = [0u8; 1];
        if self.inner.get_mut().read(&mut rest)? != 0 {
            return Err(Error::malformed(format!(
                "object {} has data past its declared size",
                self.oid
            )));
        }
        Ok(())
    }
}

impl Read for ObjectReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let n = self.inner.read(buf)?;
        if n == 0 && !self.verified {
            self.verify_end().map_err(Error::into_io)?;
            self.verified = true;
        }
        Ok(n)
    }
}

pub enum LoadedItem {
    Commit(Commit),
    Tree(Tree),
    Blob(Blob),
}

impl LoadedItem {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Commit(_) => ObjectKind::Commit,
            Self::Tree(_) => ObjectKind::Tree,
            Self::Blob(_) => ObjectKind::Blob,
        }
    }

    pub fn into_blob(self) -> Option<Blob> {
        if let Self::Blob(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_tree(&self) -> Option<&Tree> {
        if let Self::Tree(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_commit(&self) -> Option<&Commit> {
        if let Self::Commit(v) = self {
            Some(v)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use tempdir::TempDir;

    use super::*;
    use crate::filemode::FileMode;
    use crate::storable::tree::Entry;

    const CONTENT: &[u8] = b"hello, world\n";
    const CONTENT_HASH: &str = "4b5fa63702dd96796042e92787f464e28f09f17d";

    fn database() -> Result<(TempDir, Database)> {
        let dir = TempDir::new("odb")?;
        let db = Database::new(dir.path().join("objects"), Config::default());
        Ok((dir, db))
    }

    #[test]
    fn test_object_path_is_sharded() -> Result<()> {
        let (dir, db) = database()?;
        let path = db.object_path(&Digest::from_str(CONTENT_HASH)?);
        assert_eq!(
            path,
            dir.path()
                .join("objects/4b/5fa63702dd96796042e92787f464e28f09f17d")
        );
        Ok(())
    }

    #[test]
    fn test_write_then_read_blob() -> Result<()> {
        let (_dir, db) = database()?;
        let oid = db.write_blob(CONTENT, CONTENT.len() as u64)?;
        assert_eq!(oid.to_hex(), CONTENT_HASH);
        assert!(db.exists(&oid));
        assert_eq!(db.type_of(&oid)?, ObjectKind::Blob);
        assert_eq!(db.size_of(&oid)?, 13);
        assert_eq!(db.read_blob(&oid)?.into_vec()?, CONTENT);
        Ok(())
    }

    #[test]
    fn test_stored_bytes_inflate_to_canonical_encoding() -> Result<()> {
        let (_dir, db) = database()?;
        let oid = db.write_blob(CONTENT, CONTENT.len() as u64)?;
        let raw = fs::read(db.object_path(&oid))?;
        assert_eq!(compress::decompress_all(&raw)?, b"blob 13\0hello, world\n");
        Ok(())
    }

    #[test]
    fn test_write_is_idempotent() -> Result<()> {
        let (_dir, db) = database()?;
        let first = db.write_blob(CONTENT, CONTENT.len() as u64)?;
        let before = fs::read(db.object_path(&first))?;
        let second = db.write_blob(CONTENT, CONTENT.len() as u64)?;
        assert_eq!(first, second);
        assert_eq!(fs::read(db.object_path(&first))?, before);

        // No temporary files are left behind.
        let leftovers: Vec<_> = fs::read_dir(db.root())?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("tmp_obj_"))
            .collect();
        assert!(leftovers.is_empty());
        Ok(())
    }

    #[test]
    fn test_size_mismatch_leaves_nothing_behind() -> Result<()> {
        let (_dir, db) = database()?;
        let err = db.write_blob(CONTENT, 20).unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { .. }));
        assert_eq!(fs::read_dir(db.root())?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_missing_object() -> Result<()> {
        let (_dir, db) = database()?;
        let oid = Digest::from_str(CONTENT_HASH)?;
        assert!(!db.exists(&oid));
        assert!(matches!(db.type_of(&oid), Err(Error::ObjectNotFound(o)) if o == oid));
        assert!(matches!(db.read_blob(&oid), Err(Error::ObjectNotFound(_))));
        Ok(())
    }

    #[test]
    fn test_wrong_type() -> Result<()> {
        let (_dir, db) = database()?;
        let blob = db.write_blob(CONTENT, CONTENT.len() as u64)?;
        let tree = db.store(&Tree::new(vec![Entry::new(
            FileMode::REGULAR,
            "hello.txt",
            blob,
        )?]))?;

        match db.read_blob(&tree) {
            Err(Error::WrongObjectType {
                oid,
                expected: ObjectKind::Blob,
                actual: ObjectKind::Tree,
            }) => assert_eq!(oid, tree),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("read a tree as a blob"),
        }
        assert!(matches!(
            db.read_tree(&blob),
            Err(Error::WrongObjectType { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_list_tree_resolves_kinds() -> Result<()> {
        let (_dir, db) = database()?;
        let blob = db.write_blob(CONTENT, CONTENT.len() as u64)?;
        let empty = db.store(&Tree::default())?;
        let root = db.store(&Tree::new(vec![
            Entry::new(FileMode::REGULAR, "b.txt", blob)?,
            Entry::new(FileMode::DIRECTORY, "a", empty)?,
        ]))?;

        let listed = db.list_tree(&root)?;
        let summary: Vec<_> = listed
            .iter()
            .map(|e| (e.entry.name().to_string(), e.kind))
            .collect();
        assert_eq!(
            summary,
            [
                ("a".to_owned(), ObjectKind::Tree),
                ("b.txt".to_owned(), ObjectKind::Blob)
            ]
        );
        Ok(())
    }

    #[test]
    fn test_large_blob_streams() -> Result<()> {
        let (_dir, db) = database()?;
        let size = 4 * 1024 * 1024;
        let content = io::repeat(b'x').take(size);
        let oid = db.write_blob(content, size)?;
        assert_eq!(oid, db.hash_blob(io::repeat(b'x').take(size), size)?);

        let mut reader = db.read_blob(&oid)?;
        let mut buf = [0u8; 8192];
        let mut total = 0u64;
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            assert!(buf[..n].iter().all(|&b| b == b'x'));
            total += n as u64;
        }
        assert_eq!(total, size);
        Ok(())
    }

    #[test]
    fn test_load() -> Result<()> {
        let (_dir, db) = database()?;
        let oid = db.write_blob(CONTENT, CONTENT.len() as u64)?;
        let loaded = db.load(&oid)?;
        assert_eq!(loaded.kind(), ObjectKind::Blob);
        assert_eq!(loaded.into_blob().map(Blob::into_data), Some(CONTENT.to_vec()));
        Ok(())
    }
}
