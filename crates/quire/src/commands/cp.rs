//! `quire cp` command implementation.

use clap::Args;

use crate::error::CliError;
use crate::output::Output;
use crate::session::{Session, commit_message};

/// Arguments for the cp command.
#[derive(Args)]
pub(crate) struct CpArgs {
    /// Source path relative to the content root.
    source: String,

    /// Directory to copy into, relative to the content root.
    target_dir: String,

    /// Commit message.
    #[arg(short, long)]
    message: Option<String>,
}

impl CpArgs {
    /// Execute the cp command.
    pub(crate) fn execute(self, session: &Session, output: &Output) -> Result<(), CliError> {
        let entry = session.entry(&self.source)?;
        let target_dir = session.content_path(&self.target_dir)?;
        let message = commit_message(self.message, || {
            format!("Copy {} to {}", self.source, self.target_dir)
        });

        let copy = session
            .coordinator
            .copy_into(&entry, &target_dir, &message)?;
        output.success(&format!("Copied {} to {}", entry.path, copy.path));
        Ok(())
    }
}
