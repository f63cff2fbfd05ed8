mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty Git repository
    Init,

    /// Provide content or type and size information for repository objects
    CatFile {
        /// Show object type
        #[arg(short, conflicts_with = "size_only")]
        type_only: bool,

        /// Show object size
        #[arg(short, conflicts_with = "type_only")]
        size_only: bool,

        /// Pretty-print object's content
        #[arg(short, conflicts_with_all = ["size_only", "type_only"])]
        pretty_print: bool,

        /// Object hash
        #[arg(id = "object")]
        hash: String,
    },

    /// Compute object ID and optionally create an object from a file
    HashObject {
        /// Actually write the object into the object database
        #[arg(short)]
        write: bool,

        /// Object type
        #[arg(short, id = "type", default_value = "blob")]
        typ: String,

        #[arg(id = "file")]
        file: String,
    },

    /// List the contents of a tree object
    LsTree {
        /// List only filenames
        #[arg(long)]
        name_only: bool,

        #[arg(id = "tree-ish")]
        hash: String,
    },

    /// Create a tree object from the current directory
    WriteTree,

    /// Create a commit object
    CommitTree {
        #[arg(id = "tree")]
        tree_hash: String,

        /// Parent commit id
        #[arg(short)]
        parent: Option<String>,

        /// Commit message
        #[arg(short)]
        message: String,
    },

    /// Clone a repository into a new directory
    Clone { url: String, dir: String },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Cli::parse();
    match args.command {
        Commands::Init => commands::init::invoke(),
        Commands::CatFile {
            pretty_print: _,
            type_only,
            size_only,
            hash,
        } => commands::cat_file::invoke(&hash, type_only, size_only),
        Commands::HashObject { write, file, typ: _ } => {
            let id = commands::hash_object::invoke(&file, write)?;
            println!("{id}");
            Ok(())
        }
        Commands::LsTree { name_only, hash } => commands::ls_tree::invoke(&hash, name_only),
        Commands::WriteTree => commands::write_tree::invoke(),
        Commands::CommitTree {
            tree_hash,
            parent,
            message,
        } => {
            let id = commands::commit_tree::invoke(&tree_hash, &message, parent)?;
            println!("{id}");
            Ok(())
        }
        Commands::Clone { url, dir } => commands::clone::invoke(&url, &dir),
    }
}
