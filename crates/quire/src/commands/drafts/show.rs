//! `quire drafts show` command implementation.

use clap::Args;

use crate::error::CliError;
use crate::output::Output;
use crate::session::Session;

/// Arguments for the drafts show command.
#[derive(Args)]
pub(crate) struct ShowArgs {
    /// Draft id.
    id: String,
}

impl ShowArgs {
    /// Execute the drafts show command.
    pub(crate) fn execute(self, session: &Session, output: &Output) -> Result<(), CliError> {
        let content = session.drafts.open(&self.id)?;
        output.data(content.trim_end_matches('\n'));
        Ok(())
    }
}
