use std::fmt::Display;
use std::str::FromStr;

use bstr::{BStr, BString, ByteSlice};
use memchr::memmem;
use once_cell::sync::Lazy;
use regex::bytes::Regex;

use super::{ObjectKind, Storable};
use crate::digest::Digest;
use crate::timestamp::Timestamp;
use crate::{Error, Result};

/// An author or committer line: `<name> <<email>> <unix> <offset>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub when: Timestamp,
}

impl Signature {
    pub fn new(name: impl Into<String>, email: impl Into<String>, when: Timestamp) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            when,
        }
    }

    /// Parse a signature line from a commit, without its `author `/`committer ` keyword.
    ///
    /// ## Example
    /// `Jamie Quigley <jamie@quigley.xyz> 1658312219 +0100`
    fn parse(bytes: &[u8]) -> Result<Self> {
        static REGEX: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^([^<>\n]*) <([^<>\n]*)> (\d+ [+-]\d{4})$")
                .expect("signature regex is valid")
        });

        let invalid = || Error::malformed(format!("invalid signature line: {:?}", bytes.as_bstr()));
        let groups = REGEX.captures(bytes).ok_or_else(invalid)?;
        let field = |i: usize| std::str::from_utf8(&groups[i]).map_err(|_| invalid());

        Ok(Self {
            name: field(1)?.to_owned(),
            email: field(2)?.to_owned(),
            when: Timestamp::from_git(field(3)?)?,
        })
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}> {}", self.name, self.email, self.when)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    tree_id: Digest,
    parents: Vec<Digest>,
    author: Signature,
    committer: Signature,
    /// Header lines after `committer` (e.g. `gpgsig`), kept verbatim with their newlines.
    extra_headers: BString,
    message: BString,
}

impl Commit {
    /// The message gets a trailing newline if it does not already end in one.
    pub fn new(
        tree_id: Digest,
        parents: Vec<Digest>,
        author: Signature,
        committer: Signature,
        message: impl Into<BString>,
    ) -> Self {
        let mut message = message.into();
        if !message.ends_with(b"\n") {
            message.push(b'\n');
        }
        Self {
            tree_id,
            parents,
            author,
            committer,
            extra_headers: BString::default(),
            message,
        }
    }

    pub fn tree_id(&self) -> &Digest {
        &self.tree_id
    }

    /// First parent first.
    pub fn parents(&self) -> &[Digest] {
        self.parents.as_ref()
    }

    pub fn author(&self) -> &Signature {
        &self.author
    }

    pub fn committer(&self) -> &Signature {
        &self.committer
    }

    pub fn message(&self) -> &BStr {
        self.message.as_bstr()
    }

    /// Parse a decompressed commit payload.
    ///
    /// ## Example
    /// ```text
    /// tree 090c4c5dd61d2e84c832c4cd306b66bf2fabc1f5
    /// parent e6a49274aa0893ce2e2928589100387aee220c5b
    /// parent 14a9d8464caef987f3b5c3cf26f56db825459abd
    /// author Jamie Quigley <jamie@quigley.xyz> 1658312219 +0100
    /// committer Jamie Quigley <jamie@quigley.xyz> 1658312219 +0100
    ///
    /// Merge remote-tracking branch 'origin/renovate/clap-3.x' into develop
    ///
    /// ```
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let split = memmem::find(bytes, b"\n\n")
            .ok_or_else(|| Error::malformed("commit has no blank line before its message"))?;
        let (headers, message) = (&bytes[..=split], &bytes[split + 2..]);

        let mut lines = headers.lines_with_terminator();

        let tree_id = parse_digest(header_line(&mut lines, "tree ")?)?;

        let mut parents = Vec::new();
        let author = loop {
            let line = header_line(&mut lines, "")?;
            if let Some(parent) = line.strip_prefix(b"parent ") {
                parents.push(parse_digest(parent)?);
            } else if let Some(author) = line.strip_prefix(b"author ") {
                break Signature::parse(author)?;
            } else {
                return Err(Error::malformed(format!(
                    "unexpected commit header line: {:?}",
                    line.as_bstr()
                )));
            }
        };
        let committer = Signature::parse(header_line(&mut lines, "committer ")?)?;

        let extra_headers: BString = lines.flatten().copied().collect::<Vec<_>>().into();

        Ok(Self {
            tree_id,
            parents,
            author,
            committer,
            extra_headers,
            message: message.into(),
        })
    }
}

/// Take the next header line, which must start with `keyword`, and return the rest of it.
fn header_line<'a>(
    lines: &mut impl Iterator<Item = &'a [u8]>,
    keyword: &str,
) -> Result<&'a [u8]> {
    let what = if keyword.is_empty() { "author" } else { keyword.trim_end() };
    lines
        .next()
        .and_then(|line| line.strip_suffix(b"\n"))
        .and_then(|line| line.strip_prefix(keyword.as_bytes()))
        .ok_or_else(|| Error::malformed(format!("commit is missing its {what} line")))
}

fn parse_digest(hex: &[u8]) -> Result<Digest> {
    let hex = std::str::from_utf8(hex)
        .map_err(|_| Error::malformed(format!("invalid digest {:?}", hex.as_bstr())))?;
    Digest::from_str(hex).map_err(|e| Error::malformed(e.to_string()))
}

impl Storable for Commit {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Commit
    }

    fn format(&self) -> Vec<u8> {
        let mut data = format!("tree {:x}\n", self.tree_id);
        for parent in &self.parents {
            data.push_str(&format!("parent {parent:x}\n"));
        }
        data.push_str(&format!("author {}\n", self.author));
        data.push_str(&format!("committer {}\n", self.committer));

        let mut data = data.into_bytes();
        data.extend_from_slice(&self.extra_headers);
        data.push(b'\n');
        data.extend_from_slice(&self.message);
        data
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::storable::DatabaseObject;

    fn identity() -> Signature {
        Signature::new(
            "Rit Author",
            "rit@example.com",
            Timestamp::from_git("1700000000 +0000").unwrap(),
        )
    }

    #[test]
    fn test_parse_signature() {
        let input = "Jamie Quigley <jamie@quigley.xyz> 1658312219 +0100";

        let signature = Signature::parse(input.as_bytes()).unwrap();

        assert_eq!(signature.name, "Jamie Quigley");
        assert_eq!(signature.email, "jamie@quigley.xyz");
        assert_eq!(signature.when.to_string(), "1658312219 +0100");
        assert_eq!(signature.to_string(), input);
    }

    #[test]
    fn test_parse_signature_rejects_garbage() {
        for input in ["Jamie", "Jamie <j@q> soon +0100", "Jamie j@q 1 +0100"] {
            assert!(Signature::parse(input.as_bytes()).is_err(), "{input:?}");
        }
    }

    #[test]
    fn test_parse_commit() {
        let input = concat!(
            "tree 090c4c5dd61d2e84c832c4cd306b66bf2fabc1f5\n",
            "parent e6a49274aa0893ce2e2928589100387aee220c5b\n",
            "parent 14a9d8464caef987f3b5c3cf26f56db825459abd\n",
            "author Jamie Quigley <jamie@quigley.xyz> 1658312219 +0100\n",
            "committer Jamie Quigley <jamie@quigley.xyz> 1658312219 +0100\n",
            "gpgsig -----BEGIN PGP SIGNATURE-----\n",
            " \n",
            " iQEzBAABCAAdFiEEMLv/P6sLuz4ENfg8jo/2biro2XAFAmLX1h0ACgkQjo/2biro\n",
            " =JO5C\n",
            " -----END PGP SIGNATURE-----\n",
            "\n",
            "Merge remote-tracking branch 'origin/renovate/clap-3.x' into develop\n",
        );

        let commit = Commit::parse(input.as_bytes()).unwrap();
        assert_eq!(
            commit.tree_id,
            Digest::from_str("090c4c5dd61d2e84c832c4cd306b66bf2fabc1f5").unwrap()
        );
        assert_eq!(
            commit.parents,
            vec![
                Digest::from_str("e6a49274aa0893ce2e2928589100387aee220c5b").unwrap(),
                Digest::from_str("14a9d8464caef987f3b5c3cf26f56db825459abd").unwrap(),
            ]
        );
        assert_eq!(commit.author.name, "Jamie Quigley");
        assert_eq!(commit.committer.email, "jamie@quigley.xyz");
        assert!(commit.extra_headers.starts_with(b"gpgsig "));
        assert_eq!(
            commit.message(),
            "Merge remote-tracking branch 'origin/renovate/clap-3.x' into develop\n"
        );

        // Re-encoding what was parsed reproduces the input exactly.
        assert_eq!(commit.format().as_bstr(), input.as_bytes().as_bstr());
    }

    #[test]
    /// `echo initial | git commit-tree 03509ff...` with the identity fixed through
    /// `GIT_{AUTHOR,COMMITTER}_{NAME,EMAIL,DATE}`.
    fn test_commit_format_matches_git() {
        let tree = Digest::from_str("03509ff704b6d479d1714cd192d777de0fd9f19b").unwrap();
        let commit = Commit::new(tree, vec![], identity(), identity(), "initial");
        assert_eq!(
            commit.format().as_bstr(),
            "tree 03509ff704b6d479d1714cd192d777de0fd9f19b\n\
             author Rit Author <rit@example.com> 1700000000 +0000\n\
             committer Rit Author <rit@example.com> 1700000000 +0000\n\
             \n\
             initial\n"
                .as_bytes()
                .as_bstr()
        );
        assert_eq!(
            DatabaseObject::new(&commit).oid().to_hex(),
            "10969181b4e62a893effcfa19430d19159f5c760"
        );
    }

    #[test]
    fn test_message_newline_normalisation() {
        let with = Commit::new(Digest::NULL, vec![], identity(), identity(), "msg\n");
        let without = Commit::new(Digest::NULL, vec![], identity(), identity(), "msg");
        assert_eq!(with, without);
        assert_eq!(with.message(), "msg\n");

        let reparsed = Commit::parse(&with.format()).unwrap();
        assert_eq!(reparsed, with);
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        let no_tree = "author A <a@b> 1 +0000\ncommitter A <a@b> 1 +0000\n\nm\n";
        let no_blank = "tree 090c4c5dd61d2e84c832c4cd306b66bf2fabc1f5\n";
        let bad_parent = "tree 090c4c5dd61d2e84c832c4cd306b66bf2fabc1f5\nparent xyz\n\
                          author A <a@b> 1 +0000\ncommitter A <a@b> 1 +0000\n\nm\n";
        for input in [no_tree, no_blank, bad_parent] {
            let err = Commit::parse(input.as_bytes()).unwrap_err();
            assert!(matches!(err, Error::MalformedObject { .. }), "{input:?}");
        }
    }
}
