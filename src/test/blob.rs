use std::fs;
use std::io::Read;
use std::str::FromStr;

use pretty_assertions::assert_eq;

use crate::storable::{encode, ObjectKind};
use crate::test::*;
use crate::*;

const CONTENT: &[u8] = b"hello, world\n";

#[test]
fn hash_blob_matches_git() -> Result<()> {
    let (_dir, repo) = init_repo()?;
    let oid = repo.database.hash_blob(CONTENT, CONTENT.len() as u64)?;
    assert_eq!(oid.to_hex(), HELLO_HASH);
    assert_eq!(oid, Digest::new(&encode(ObjectKind::Blob, CONTENT)));
    assert_eq!(encode(ObjectKind::Blob, CONTENT), b"blob 13\0hello, world\n");

    // Hashing alone stores nothing.
    assert!(!repo.database.exists(&oid));
    Ok(())
}

#[test]
fn hash_does_not_depend_on_store_state() -> Result<()> {
    let (_dir, repo) = init_repo()?;
    let before = repo.database.hash_blob(CONTENT, CONTENT.len() as u64)?;
    repo.database.write_blob(CONTENT, CONTENT.len() as u64)?;
    repo.database.write_blob(&b"other"[..], 5)?;
    let after = repo.database.hash_blob(CONTENT, CONTENT.len() as u64)?;
    assert_eq!(before, after);
    Ok(())
}

#[test]
fn write_then_read_round_trips() -> Result<()> {
    let (_dir, repo) = init_repo()?;
    let samples: [&[u8]; 4] = [b"", b"\0", CONTENT, &[0xff; 70_000]];
    for content in samples {
        let oid = repo.database.write_blob(content, content.len() as u64)?;
        assert_eq!(oid, repo.database.hash_blob(content, content.len() as u64)?);
        let mut read = Vec::new();
        repo.database.read_blob(&oid)?.read_to_end(&mut read)?;
        assert_eq!(read, content);
    }
    Ok(())
}

#[test]
fn reads_objects_written_by_git() -> Result<()> {
    let (_dir, repo) = init_repo()?;
    let oid = Digest::from_str(HELLO_HASH)?;
    let path = repo.database.object_path(&oid);
    fs::create_dir_all(path.parent().unwrap())?;
    fs::write(&path, HELLO_OBJECT)?;

    assert_eq!(repo.database.type_of(&oid)?, ObjectKind::Blob);
    assert_eq!(repo.database.read_blob(&oid)?.into_vec()?, CONTENT);
    Ok(())
}

#[test]
fn hash_file_writes_only_when_asked() -> Result<()> {
    let (dir, repo) = init_repo()?;
    let root = dir.path();
    testfiles!(root, ["hello.txt" => "hello, world\n"]);

    let oid = repo.hash_file(&root.join("hello.txt"), false)?;
    assert_eq!(oid.to_hex(), HELLO_HASH);
    assert!(!repo.database.exists(&oid));

    let written = repo.hash_file(&root.join("hello.txt"), true)?;
    assert_eq!(written, oid);
    assert!(repo.database.object_path(&oid).ends_with("4b/5fa63702dd96796042e92787f464e28f09f17d"));
    assert!(repo.database.exists(&oid));

    let err = repo.hash_file(&root.join("missing.txt"), true).unwrap_err();
    assert!(matches!(err, Error::PathNotFound(_)));
    Ok(())
}
