//! quire CLI - edit remote-backed site content.
//!
//! Provides commands for:
//! - `ls`, `cat`: browse the content tree
//! - `new`, `save`, `mkdir`, `upload`: write files
//! - `mv`, `cp`, `rm`: reorganize the tree
//! - `drafts`: manage and publish local drafts

mod commands;
mod error;
mod output;
mod session;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{
    CatArgs, CpArgs, DraftsCommand, LsArgs, MkdirArgs, MvArgs, NewArgs, RmArgs, SaveArgs,
    UploadArgs,
};
use error::CliError;
use output::Output;
use session::{GlobalArgs, Session};

/// quire - edit remote-backed site content.
#[derive(Parser)]
#[command(name = "quire", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a content directory or the assets.
    Ls(LsArgs),
    /// Print a text file.
    Cat(CatArgs),
    /// Create a file.
    New(NewArgs),
    /// Overwrite an existing file.
    Save(SaveArgs),
    /// Create a directory.
    Mkdir(MkdirArgs),
    /// Rename or move a file or directory.
    Mv(MvArgs),
    /// Copy a file or directory into another directory.
    Cp(CpArgs),
    /// Delete a file or directory.
    Rm(RmArgs),
    /// Upload an asset and print its link.
    Upload(UploadArgs),
    /// Local draft commands.
    #[command(subcommand)]
    Drafts(DraftsCommand),
}

impl Commands {
    fn execute(self, session: &Session, output: &Output) -> Result<(), CliError> {
        match self {
            Self::Ls(args) => args.execute(session, output),
            Self::Cat(args) => args.execute(session, output),
            Self::New(args) => args.execute(session, output),
            Self::Save(args) => args.execute(session, output),
            Self::Mkdir(args) => args.execute(session, output),
            Self::Mv(args) => args.execute(session, output),
            Self::Cp(args) => args.execute(session, output),
            Self::Rm(args) => args.execute(session, output),
            Self::Upload(args) => args.execute(session, output),
            Self::Drafts(cmd) => cmd.execute(session, output),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.global.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = Session::open(&cli.global).and_then(|session| {
        let result = cli.command.execute(&session, &output);
        session.close();
        result
    });

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        output.report_partial(&err);
        std::process::exit(1);
    }
}
