//! `quire new` command implementation.

use std::path::PathBuf;

use clap::Args;
use quire_remote::{file_name, parent_path};

use crate::error::CliError;
use crate::output::Output;
use crate::session::{Session, commit_message};

/// Arguments for the new command.
#[derive(Args)]
pub(crate) struct NewArgs {
    /// Path of the new file relative to the content root.
    path: String,

    /// Local file to take the content from (default: empty file).
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Commit message.
    #[arg(short, long)]
    message: Option<String>,
}

impl NewArgs {
    /// Execute the new command.
    pub(crate) fn execute(self, session: &Session, output: &Output) -> Result<(), CliError> {
        let content = match &self.file {
            Some(file) => std::fs::read(file)?,
            None => Vec::new(),
        };
        let relative = self.path.trim_matches('/');
        let message = commit_message(self.message, || format!("Create {relative}"));

        let entry = session.coordinator.create_file(
            parent_path(relative),
            file_name(relative),
            &content,
            &message,
        )?;
        output.success(&format!("Created {}", entry.path));
        Ok(())
    }
}
