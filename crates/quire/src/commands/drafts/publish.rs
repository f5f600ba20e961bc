//! `quire drafts publish` command implementation.

use clap::Args;

use crate::error::CliError;
use crate::output::Output;
use crate::session::{Session, commit_message};

/// Arguments for the drafts publish command.
#[derive(Args)]
pub(crate) struct PublishArgs {
    /// Draft id.
    id: String,

    /// Commit message.
    #[arg(short, long)]
    message: Option<String>,
}

impl PublishArgs {
    /// Execute the drafts publish command.
    pub(crate) fn execute(self, session: &Session, output: &Output) -> Result<(), CliError> {
        let draft = session.drafts.get(&self.id)?;
        let message = commit_message(self.message, || format!("Publish {}", draft.title));

        let entry = session
            .drafts
            .publish(&draft.id, &message, &session.coordinator)?;
        output.success(&format!("Published \"{}\" to {}", draft.title, entry.path));
        Ok(())
    }
}
