use std::{
    fmt::{Debug, Display, LowerHex},
    io::{self, Write},
    ops::Deref,
    str::FromStr,
};

use hex::FromHexError;
use sha1::{Digest as _, Sha1};
use tap::Tap;

use crate::Error;

#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Digest(pub [u8; 20]);

impl Digest {
    /// Width of the raw digest in bytes.
    pub const LEN: usize = 20;

    /// The null digest, 0x00000...
    pub const NULL: Self = Digest([0; 20]);
}

impl Digest {
    /// Hash the input bytes and return the resulting digest.
    pub fn new(bytes: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(bytes);
        Self(hasher.finalize().into())
    }

    /// Build a digest from its raw binary form.
    pub fn from_bytes(bytes: &[u8]) -> crate::Result<Self> {
        let raw: [u8; 20] = bytes.try_into().map_err(|_| Error::InvalidDigest {
            input: hex::encode(bytes),
            source: FromHexError::InvalidStringLength,
        })?;
        Ok(Self(raw))
    }

    /// Format the digest as a hex string.
    ///
    /// Identical to `format!("{:x}", self)`.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Shorten a Digest, usually for display purposes.
    ///
    /// Note: This doesn't check for collisions.
    pub fn short(&self) -> String {
        self.to_hex().tap_mut(|x| x.truncate(7))
    }
}

impl Deref for Digest {
    type Target = [u8; 20];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl LowerHex for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Debug for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        let invalid = |source| Error::InvalidDigest {
            input: s.to_owned(),
            source,
        };
        if s.len() != Self::LEN * 2 {
            return Err(invalid(FromHexError::InvalidStringLength));
        }
        let mut raw = [0; 20];
        hex::decode_to_slice(s, &mut raw).map_err(invalid)?;
        Ok(Self(raw))
    }
}

/// A writer adaptor that digests every byte written through it before passing it on.
pub struct HashingWriter<W> {
    inner: W,
    hasher: Sha1,
    written: u64,
}

impl<W: Write> HashingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha1::new(),
            written: 0,
        }
    }

    /// Number of bytes that have passed through so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn finish(self) -> (W, Digest) {
        (self.inner, Digest(self.hasher.finalize().into()))
    }
}

impl HashingWriter<io::Sink> {
    /// A writer that only hashes.
    pub fn sink() -> Self {
        Self::new(io::sink())
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
