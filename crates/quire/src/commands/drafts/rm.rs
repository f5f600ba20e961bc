//! `quire drafts rm` command implementation.

use clap::Args;

use crate::error::CliError;
use crate::output::Output;
use crate::session::Session;

/// Arguments for the drafts rm command.
#[derive(Args)]
pub(crate) struct RmArgs {
    /// Draft id.
    id: String,
}

impl RmArgs {
    /// Execute the drafts rm command.
    pub(crate) fn execute(self, session: &Session, output: &Output) -> Result<(), CliError> {
        let draft = session.drafts.get(&self.id)?;
        session.drafts.delete(&draft.id)?;
        output.success(&format!("Deleted draft \"{}\"", draft.title));
        Ok(())
    }
}
