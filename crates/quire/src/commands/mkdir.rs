//! `quire mkdir` command implementation.

use clap::Args;
use quire_remote::{file_name, parent_path};

use crate::error::CliError;
use crate::output::Output;
use crate::session::{Session, commit_message};

/// Arguments for the mkdir command.
#[derive(Args)]
pub(crate) struct MkdirArgs {
    /// Directory path relative to the content root.
    path: String,

    /// Commit message.
    #[arg(short, long)]
    message: Option<String>,
}

impl MkdirArgs {
    /// Execute the mkdir command.
    pub(crate) fn execute(self, session: &Session, output: &Output) -> Result<(), CliError> {
        let relative = self.path.trim_matches('/');
        let message = commit_message(self.message, || format!("Create {relative}/"));

        let dir = session.coordinator.create_directory(
            parent_path(relative),
            file_name(relative),
            &message,
        )?;
        output.success(&format!("Created {}/", dir.path));
        Ok(())
    }
}
