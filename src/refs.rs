use std::str::FromStr;

use crate::digest::Digest;

/// Contains all characters that cannot appear in a ref name.
///
/// In git, the character `'*'` is allowed in ref names if the environment variable
/// `REFNAME_REFSPEC_PATTERN` is set. We do not allow this, so `'*'` appears in this array.
///
/// See: <https://github.com/git/git/blob/795ea8776befc95ea2becd8020c7a284677b4161/refs.c#L48-L57>
const DISALLOWED_CHARACTERS: [char; 40] = [
    '\x01', '\x02', '\x03', '\x04', '\x05', '\x06', '\x07', '\x08', '\t', '\n', '\x0b', '\x0c',
    '\r', '\x0e', '\x0f', '\x10', '\x11', '\x12', '\x13', '\x14', '\x15', '\x16', '\x17', '\x18',
    '\x19', '\x1a', '\x1b', '\x1c', '\x1d', '\x1e', '\x1f', ' ', '*', ':', '?', '[', '\\', '^',
    '~', '\x7f',
];

/// Check whether a string is a valid ref name.
///
/// Disallowed paths are any path where:
///
/// - it (or any path component) begins with `'.'`
/// - it contains double dots `".."`
/// - it contains ASCII control characters
/// - it contains ':', '?', '[', '\', '^', '~', SP, or TAB anywhere
/// - it contains `'*'`
/// - it ends with `'/'`
/// - it ends with `".lock"`
/// - it contains `"@{"`
///
/// See: <https://github.com/git/git/blob/795ea8776befc95ea2becd8020c7a284677b4161/refs.c#L59-L77>
pub fn is_valid_ref_name(name: &str) -> bool {
    !(name.is_empty()
        || name.chars().any(|c| DISALLOWED_CHARACTERS.contains(&c) || c == '\0')
        || name.starts_with('.')
        || name.contains("/.")
        || name.contains("..")
        || name.ends_with('/')
        || name.ends_with(".lock")
        || name.contains("@{"))
}

/// What the HEAD file points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// `ref: refs/heads/main`
    Symbolic(String),
    /// A bare commit digest.
    Detached(Digest),
}

impl Head {
    /// The contents written to HEAD by `init`.
    pub fn default_contents() -> String {
        format!("ref: refs/heads/{}\n", crate::config::DEFAULT_BRANCH)
    }

    /// Parse the contents of a HEAD file. Returns `None` for anything that is neither a
    /// well-formed symbolic ref under `refs/` nor a full hex digest.
    pub fn parse(contents: &str) -> Option<Self> {
        let line = contents.strip_suffix('\n')?;
        if let Some(target) = line.strip_prefix("ref: ") {
            (target.starts_with("refs/") && is_valid_ref_name(target))
                .then(|| Self::Symbolic(target.to_owned()))
        } else {
            Digest::from_str(line).ok().map(Self::Detached)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_names() {
        for name in ["refs/heads/main", "refs/heads/feature/x", "refs/tags/v1.0"] {
            assert!(is_valid_ref_name(name), "{name}");
        }
        for name in [
            "",
            ".hidden",
            "refs/heads/.x",
            "refs/../x",
            "refs/heads/main.lock",
            "refs/heads/",
            "refs/heads/a b",
            "refs/heads/a@{1}",
            "refs/heads/*",
        ] {
            assert!(!is_valid_ref_name(name), "{name}");
        }
    }

    #[test]
    fn test_parse_head() {
        assert_eq!(
            Head::parse(&Head::default_contents()),
            Some(Head::Symbolic("refs/heads/main".into()))
        );
        assert_eq!(
            Head::parse("4b5fa63702dd96796042e92787f464e28f09f17d\n"),
            Some(Head::Detached(
                Digest::from_str("4b5fa63702dd96796042e92787f464e28f09f17d").unwrap()
            ))
        );
        for garbage in [
            "",
            "ref: refs/heads/main",
            "ref: heads/main\n",
            "ref: refs/heads/ma in\n",
            "hello\n",
            "\0\0\0\0",
        ] {
            assert_eq!(Head::parse(garbage), None, "{garbage:?}");
        }
    }
}
