use flate2::Compression;

use crate::storable::commit::Signature;
use crate::timestamp::Timestamp;

/// Name of the metadata directory under a repository root.
pub const GIT_DIR: &str = ".git";

/// Branch HEAD points at in a freshly initialised repository.
pub const DEFAULT_BRANCH: &str = "main";

pub const DEFAULT_AUTHOR_NAME: &str = "Rit Author";
pub const DEFAULT_AUTHOR_EMAIL: &str = "rit@example.com";
pub const DEFAULT_AUTHOR_DATE: i64 = 1_700_000_000;

/// Settings shared by every write through a [`Database`](crate::repo::database::Database).
#[derive(Debug, Clone)]
pub struct Config {
    /// zlib level for new objects. Reads accept any level.
    pub compression: Compression,
    /// Author and committer of every commit written.
    pub identity: Signature,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            identity: Signature::new(
                DEFAULT_AUTHOR_NAME,
                DEFAULT_AUTHOR_EMAIL,
                Timestamp::from_unix(DEFAULT_AUTHOR_DATE, 0)
                    .expect("default author date is in range"),
            ),
        }
    }
}

impl Config {
    pub fn with_identity(self, identity: Signature) -> Self {
        Self { identity, ..self }
    }

    pub fn with_compression(self, compression: Compression) -> Self {
        Self {
            compression,
            ..self
        }
    }
}
