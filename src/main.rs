mod cat_file;
mod interface;

use color_eyre::eyre::Context;
pub use color_eyre::Result;

use odb::storable::commit::Signature;
use odb::timestamp::Timestamp;
use odb::{Config, Repo};

use crate::interface::*;

use clap::Parser;
use once_cell::sync::Lazy;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

static ARGS: Lazy<Opt> = Lazy::new(Opt::parse);

fn main() -> Result<()> {
    color_eyre::install()?;

    Lazy::force(&ARGS);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if ARGS.verbose { "debug" } else { "warn" }));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let path = match ARGS.path {
        Some(ref path) => path
            .canonicalize()
            .wrap_err(format!("Directory not found: '{path}'"))?,
        None => std::env::current_dir()?.canonicalize()?,
    };

    let config = config_from_args(&ARGS)?;

    if matches!(ARGS.command, Command::Init) {
        let repo = Repo::init(&path, config)?;
        println!(
            "Initialized empty repository in {}",
            repo.git_dir().display()
        );
        return Ok(());
    }

    let repo = Repo::open(&path, config)
        .wrap_err(format!("Not a repository: '{}'", path.display()))?;

    match &ARGS.command {
        Command::Init => unreachable!(),
        Command::CatFile(args) => cat_file::handle(&repo, args)?,
        Command::HashObject { write, path } => {
            let oid = repo.hash_file(path.as_std_path(), *write)?;
            println!("{oid:x}");
        }
        Command::LsTree { name_only, tree } => cat_file::ls_tree(&repo, tree, *name_only)?,
        Command::WriteTree => {
            let oid = repo.write_tree()?;
            println!("{oid:x}");
        }
        Command::CommitTree {
            tree,
            parents,
            message,
        } => {
            let commit_id = repo.database.write_commit(tree, parents, message)?;
            println!("{commit_id:x}");
        }
    }
    Ok(())
}

fn config_from_args(args: &Opt) -> Result<Config> {
    let mut config = Config::default();
    if let Some(level) = args.compression {
        config = config.with_compression(flate2::Compression::new(level));
    }

    let when = match args.author_date {
        Some(ref date) => {
            Timestamp::from_git(date).wrap_err(format!("Invalid author date: '{date}'"))?
        }
        None => config.identity.when.clone(),
    };
    let identity = Signature::new(args.author_name.clone(), args.author_email.clone(), when);
    Ok(config.with_identity(identity))
}
