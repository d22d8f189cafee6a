use std::io::Write;
use std::process::exit;

use odb::storable::Storable;
use odb::{Digest, Error, ObjectKind, Repo};

use crate::interface::CatFile;
use crate::Result;

pub fn handle(repo: &Repo, args: &CatFile) -> Result<()> {
    match args {
        CatFile::Exists { object } => {
            if !repo.database.exists(object) {
                eprintln!("Object does not exist: {}", object.to_hex());
                exit(1);
            }
            if let Err(e) = repo.database.load(object) {
                eprintln!("Object is corrupt: {}: {e}", object.to_hex());
                exit(1);
            }
            Ok(())
        }
        CatFile::PrettyPrint { object } => {
            let mut stdout = std::io::stdout().lock();
            match repo.database.type_of(object)? {
                // Stream blobs straight through rather than loading them.
                ObjectKind::Blob => {
                    let mut reader = repo.database.read_blob(object)?;
                    std::io::copy(&mut reader, &mut stdout).map_err(Error::from)?;
                }
                ObjectKind::Tree => {
                    drop(stdout);
                    return ls_tree(repo, object, false);
                }
                ObjectKind::Commit => {
                    let commit = repo.database.read_commit(object)?;
                    stdout.write_all(&commit.format())?;
                }
            }
            stdout.flush()?;
            Ok(())
        }
        CatFile::Type { object } => {
            println!("{}", repo.database.type_of(object)?);
            Ok(())
        }
        CatFile::Size { object } => {
            println!("{}", repo.database.size_of(object)?);
            Ok(())
        }
    }
}

/// Print `<mode> <kind> <oid>\t<name>` per entry, as `git ls-tree` does.
pub fn ls_tree(repo: &Repo, tree: &Digest, name_only: bool) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    for typed in repo.database.list_tree(tree)? {
        let entry = &typed.entry;
        if name_only {
            writeln!(stdout, "{}", entry.name())?;
        } else {
            writeln!(
                stdout,
                "{:06o} {} {:x}\t{}",
                entry.mode(),
                typed.kind,
                entry.oid(),
                entry.name()
            )?;
        }
    }
    stdout.flush()?;
    Ok(())
}
