//! `quire save` command implementation.

use std::path::PathBuf;

use clap::Args;

use crate::error::CliError;
use crate::output::Output;
use crate::session::{Session, commit_message};

/// Arguments for the save command.
#[derive(Args)]
pub(crate) struct SaveArgs {
    /// Existing file path relative to the content root.
    path: String,

    /// Local file holding the new content.
    #[arg(short, long)]
    file: PathBuf,

    /// Commit message.
    #[arg(short, long)]
    message: Option<String>,
}

impl SaveArgs {
    /// Execute the save command.
    pub(crate) fn execute(self, session: &Session, output: &Output) -> Result<(), CliError> {
        let path = session.content_path(&self.path)?;
        let content = std::fs::read(&self.file)?;
        let current = session.coordinator.read_file(&path)?;
        if current.content == content {
            output.note(&format!("{path} is unchanged"));
            return Ok(());
        }

        let message = commit_message(self.message, || format!("Update {}", self.path));
        session
            .coordinator
            .save_file(&path, &content, &current.version_token, &message)?;
        output.success(&format!("Saved {path}"));
        Ok(())
    }
}
