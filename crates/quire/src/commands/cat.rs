//! `quire cat` command implementation.

use clap::Args;

use crate::error::CliError;
use crate::output::Output;
use crate::session::Session;

/// Arguments for the cat command.
#[derive(Args)]
pub(crate) struct CatArgs {
    /// File path relative to the content root.
    path: String,
}

impl CatArgs {
    /// Execute the cat command.
    pub(crate) fn execute(self, session: &Session, output: &Output) -> Result<(), CliError> {
        let path = session.content_path(&self.path)?;
        let document = session.coordinator.open_document(&path)?;
        if document.restored {
            output.warning("Showing autosaved edits that were never saved to the remote.");
        }
        output.data(document.text.trim_end_matches('\n'));
        Ok(())
    }
}
