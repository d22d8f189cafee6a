//! A content-addressed store of git-compatible loose objects.
//!
//! Objects are encoded as `"{kind} {len}\0{payload}"`, identified by the SHA-1 of that encoding,
//! and stored zlib-compressed at `.git/objects/<xx>/<rest of hex digest>`.

#[cfg(test)]
mod test;

pub mod compress;
pub mod config;
pub mod digest;
pub mod error;
pub mod filemode;
pub mod refs;
pub mod repo;
pub mod storable;
pub mod timestamp;
mod util;

pub use crate::config::Config;
pub use crate::digest::Digest;
pub use crate::error::{Error, Result};
pub use crate::repo::database::Database;
pub use crate::repo::Repo;
pub use crate::storable::ObjectKind;
