use camino::Utf8PathBuf;
use clap::Parser;
use clap::Subcommand;

use odb::Digest;

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Create an empty repository, or do nothing if one exists
    Init,

    #[command(subcommand)]
    CatFile(CatFile),

    /// Compute the blob digest of a file
    HashObject {
        /// Also write the blob into the object database
        #[arg(short)]
        write: bool,

        path: Utf8PathBuf,
    },

    /// List the entries of a tree object
    LsTree {
        #[arg(long)]
        name_only: bool,

        #[arg(value_name = "tree")]
        tree: Digest,
    },

    /// Snapshot the working directory into tree objects
    WriteTree,

    /// Create a commit object from a tree
    CommitTree {
        #[arg(value_name = "tree")]
        tree: Digest,

        #[arg(short, value_name = "parent")]
        parents: Vec<Digest>,

        #[arg(short, long, env = "ODB_COMMIT_MESSAGE")]
        message: String,
    },
}

#[derive(Clone, Debug, Subcommand)]
pub enum CatFile {
    /// Exit with status `ExitCode::SUCCESS` if `object` exists and is a valid object. If
    /// `object` is of an invalid format, exit with status `ExitCode::FAILURE`, and print an
    /// error to stderr.
    #[command(short_flag = 'e')]
    Exists {
        #[arg(value_name = "object")]
        object: Digest,
    },

    /// Pretty-print the contents of `object` based on its type
    #[command(short_flag = 'p')]
    PrettyPrint {
        #[arg(value_name = "object")]
        object: Digest,
    },

    /// Print the type of `object` to stdout
    #[command(short_flag = 't')]
    Type {
        #[arg(value_name = "object")]
        object: Digest,
    },

    /// Print the size of `object` to stdout
    #[command(short_flag = 's')]
    Size {
        #[arg(value_name = "object")]
        object: Digest,
    },
}

#[derive(Debug, Parser)]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long)]
    pub verbose: bool,

    /// The path to be used.
    #[arg(short = 'C')]
    pub path: Option<Utf8PathBuf>,

    /// zlib level (0-9) for newly written objects
    #[arg(long, env = "ODB_COMPRESSION", value_parser = clap::value_parser!(u32).range(0..=9))]
    pub compression: Option<u32>,

    #[arg(long, env = "ODB_AUTHOR_NAME", default_value = odb::config::DEFAULT_AUTHOR_NAME)]
    pub author_name: String,

    #[arg(long, env = "ODB_AUTHOR_EMAIL", default_value = odb::config::DEFAULT_AUTHOR_EMAIL)]
    pub author_email: String,

    /// `<unix seconds> <+|-hhmm>`
    #[arg(long, env = "ODB_AUTHOR_DATE")]
    pub author_date: Option<String>,
}
