use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};
use grove_store::{ObjectKind, DEFAULT_STORE_DIR};

#[derive(Parser)]
#[command(
    name = "grove",
    about = "Grove: content-addressed object store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Object store root (the directory that holds `objects/`)
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_STORE_DIR)]
    pub store: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty object store
    Init(InitArgs),
    /// Compute an object id, optionally writing the object
    HashObject(HashObjectArgs),
    /// Show an object's content, type, or size
    CatFile(CatFileArgs),
    /// List the entries of a tree object
    LsTree(LsTreeArgs),
    /// Build a tree object from ls-tree formatted lines on stdin
    Mktree(MktreeArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Store root to create (defaults to --store)
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct HashObjectArgs {
    /// Write the object into the store
    #[arg(short = 'w')]
    pub write: bool,
    /// Object type
    #[arg(short = 't', long = "type", default_value = "blob")]
    pub kind: ObjectKind,
    /// Read the content from stdin instead of a file
    #[arg(long, conflicts_with = "file")]
    pub stdin: bool,
    #[arg(required_unless_present = "stdin")]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["pretty", "show_type", "size", "exists"])
))]
pub struct CatFileArgs {
    /// Pretty-print the object's content
    #[arg(short = 'p')]
    pub pretty: bool,
    /// Show the object's type
    #[arg(short = 't')]
    pub show_type: bool,
    /// Show the object's size
    #[arg(short = 's')]
    pub size: bool,
    /// Exit with zero status if the object exists
    #[arg(short = 'e')]
    pub exists: bool,
    pub object: String,
}

#[derive(Args)]
pub struct LsTreeArgs {
    /// List only entry names
    #[arg(long)]
    pub name_only: bool,
    pub tree: String,
}

#[derive(Args)]
pub struct MktreeArgs {
    /// Allow entries that reference objects missing from the store
    #[arg(long)]
    pub missing: bool,
}
