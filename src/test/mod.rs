/// Create files under `$root`. `"path"` alone gets the contents `"path-contents\n"`;
/// `"path" => contents` writes `contents` verbatim.
macro_rules! testfiles {
    ($root:expr, [$($path:expr $(=> $contents:expr)?),* $(,)?]) => {{
        $({
            let path = $root.join($path);
            std::fs::create_dir_all(path.parent().unwrap())?;
            #[allow(unused_mut, unused_assignments)]
            let mut contents: Vec<u8> = format!("{}-contents\n", $path).into_bytes();
            $(contents = AsRef::<[u8]>::as_ref(&$contents).to_vec();)?
            std::fs::write(&path, contents)?;
        })*
    }};
}

mod blob;

use std::path::Path;

use tempdir::TempDir;

use crate::{Config, Repo, Result};

/// "hello, world\n"
pub const HELLO_HASH: &str = "4b5fa63702dd96796042e92787f464e28f09f17d";
/// "hello, world 2\n"
pub const HELLO2_HASH: &str = "fc2d1d427dc36f7373f6cbececed645c32197831";
/// `hello.txt` and `hello2.txt`
pub const HELLO_TREE_HASH: &str = "03509ff704b6d479d1714cd192d777de0fd9f19b";
/// `b.txt`, `hello.txt`, `hello2.txt` and `sub/c.txt`
pub const NESTED_TREE_HASH: &str = "f7adb99ca5eca5c68b1f797e80c6495c3264ccb1";
/// `c.txt` ("nested\n")
pub const SUB_TREE_HASH: &str = "1fb43f1b1d0e9e6f60f6b41185b21cd30319d0db";

/// `.git/objects/4b/5fa63702dd96796042e92787f464e28f09f17d` as written by git.
pub const HELLO_OBJECT: [u8; 29] = [
    0x78, 0x01, 0x4b, 0xca, 0xc9, 0x4f, 0x52, 0x30, 0x34, 0x66, 0xc8, 0x48, 0xcd, 0xc9, 0xc9,
    0xd7, 0x51, 0x28, 0xcf, 0x2f, 0xca, 0x49, 0xe1, 0x02, 0x00, 0x49, 0xb7, 0x06, 0xb6,
];

/// A fresh repository in a temporary directory with the default configuration.
pub fn init_repo() -> Result<(TempDir, Repo)> {
    let dir = TempDir::new("odb")?;
    let repo = Repo::init(dir.path(), Config::default())?;
    Ok((dir, repo))
}

pub fn hello_files(root: &Path) -> Result<()> {
    testfiles!(root, ["hello.txt" => "hello, world\n", "hello2.txt" => "hello, world 2\n"]);
    Ok(())
}

pub fn nested_files(root: &Path) -> Result<()> {
    hello_files(root)?;
    testfiles!(root, ["b.txt" => "b\n", "sub/c.txt" => "nested\n"]);
    Ok(())
}
