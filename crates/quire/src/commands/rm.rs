//! `quire rm` command implementation.

use clap::Args;

use crate::error::CliError;
use crate::output::Output;
use crate::session::{Session, commit_message};

/// Arguments for the rm command.
#[derive(Args)]
pub(crate) struct RmArgs {
    /// Path relative to the content root.
    path: String,

    /// Delete a directory and everything below it.
    #[arg(short, long)]
    recursive: bool,

    /// Commit message.
    #[arg(short, long)]
    message: Option<String>,
}

impl RmArgs {
    /// Execute the rm command.
    pub(crate) fn execute(self, session: &Session, output: &Output) -> Result<(), CliError> {
        let entry = session.entry(&self.path)?;
        let message = commit_message(self.message, || format!("Delete {}", self.path));

        if !entry.is_dir() {
            session.coordinator.delete_file(&entry, &message)?;
            output.success(&format!("Deleted {}", entry.path));
            return Ok(());
        }
        if !self.recursive {
            return Err(CliError::Validation(format!(
                "'{}' is a directory (use --recursive)",
                entry.path
            )));
        }

        let deleted = session
            .coordinator
            .delete_directory(&entry.path, &message)?;
        for path in &deleted {
            output.note(&format!("  deleted {path}"));
        }
        output.success(&format!(
            "Deleted {}/ ({} file(s))",
            entry.path,
            deleted.len()
        ));
        Ok(())
    }
}
