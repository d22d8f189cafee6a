mod commit;
pub mod database;
mod workspace;

use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::*;

use database::Database;

use crate::config::{Config, GIT_DIR};
use crate::digest::Digest;
use crate::refs::Head;
use crate::{Error, Result};

#[derive(Debug)]
pub struct Repo {
    dir: PathBuf,
    git_dir: PathBuf,
    head_path: PathBuf,
    pub database: Database,
}

impl Repo {
    fn new(repo_root: PathBuf, config: Config) -> Self {
        let git_dir = repo_root.join(GIT_DIR);
        let head_path = git_dir.join("HEAD");
        let database = Database::new(git_dir.join("objects"), config);
        Self {
            dir: repo_root,
            git_dir,
            head_path,
            database,
        }
    }

    /// Create `.git/{objects,refs}` and HEAD under `repo_root`.
    ///
    /// Safe to repeat: existing objects are untouched and an existing HEAD is never
    /// overwritten. An existing HEAD that is neither a symbolic ref nor a digest is reported as
    /// [`Error::CorruptHead`] rather than repaired.
    pub fn init(repo_root: impl AsRef<Path>, config: Config) -> Result<Self> {
        let repo_root = repo_root.as_ref();
        if !repo_root.is_dir() {
            return Err(Error::PathNotFound(repo_root.to_owned()));
        }
        let repo = Self::new(repo_root.to_owned(), config);
        trace!(path = ?repo.dir, "Initialising repo");

        for d in ["objects", "refs", "refs/heads"] {
            let dir = repo.git_dir.join(d);
            trace!(path = ?dir, "Creating directory");
            fs::create_dir_all(dir)?;
        }

        match File::options()
            .write(true)
            .create_new(true)
            .open(&repo.head_path)
        {
            Ok(mut head) => {
                head.write_all(Head::default_contents().as_bytes())?;
                head.sync_all()?;
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                warn!(path = ?repo.head_path, "HEAD already exists, leaving it in place");
                repo.read_head()?;
            }
            Err(e) => return Err(e.into()),
        }

        Ok(repo)
    }

    /// Open an existing repository rooted at `repo_root`.
    pub fn open(repo_root: impl AsRef<Path>, config: Config) -> Result<Self> {
        let repo_root = repo_root.as_ref();
        let repo = Self::new(repo_root.to_owned(), config);
        if !repo.git_dir.is_dir() {
            return Err(Error::PathNotFound(repo.git_dir));
        }
        trace!(path = ?repo.dir, "Opened repo");
        Ok(repo)
    }

    pub fn root(&self) -> &Path {
        &self.dir
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn read_head(&self) -> Result<Head> {
        let contents = fs::read_to_string(&self.head_path).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => Error::CorruptHead {
                path: self.head_path.clone(),
                contents: "<not utf-8>".to_owned(),
            },
            _ => Error::Io(e),
        })?;
        Head::parse(&contents).ok_or_else(|| Error::CorruptHead {
            path: self.head_path.clone(),
            contents,
        })
    }

    /// Snapshot the working directory, skipping `.git`.
    pub fn write_tree(&self) -> Result<Digest> {
        self.database.write_tree(&self.dir)
    }

    /// Hash a file as a blob, storing it if `write` is set.
    pub fn hash_file(&self, path: &Path, write: bool) -> Result<Digest> {
        if !path.is_file() {
            return Err(Error::PathNotFound(path.to_owned()));
        }
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        let content = BufReader::new(file);
        if write {
            self.database.write_blob(content, size)
        } else {
            self.database.hash_blob(content, size)
        }
    }
}
