//! `quire drafts` subcommand group.

mod list;
mod new;
mod publish;
mod rm;
mod save;
mod show;

use clap::Subcommand;

use new::NewArgs;
use publish::PublishArgs;
use rm::RmArgs;
use save::SaveArgs;
use show::ShowArgs;

use crate::error::CliError;
use crate::output::Output;
use crate::session::Session;

/// Draft commands.
#[derive(Subcommand)]
pub(crate) enum DraftsCommand {
    /// List drafts of the repository, newest first.
    List,
    /// Create a draft.
    New(NewArgs),
    /// Print a draft's content.
    Show(ShowArgs),
    /// Update a draft's title or content.
    Save(SaveArgs),
    /// Delete a draft.
    Rm(RmArgs),
    /// Publish a draft to the remote and delete it.
    Publish(PublishArgs),
}

impl DraftsCommand {
    /// Execute the drafts subcommand.
    pub(crate) fn execute(self, session: &Session, output: &Output) -> Result<(), CliError> {
        match self {
            Self::List => list::execute(session, output),
            Self::New(args) => args.execute(session, output),
            Self::Show(args) => args.execute(session, output),
            Self::Save(args) => args.execute(session, output),
            Self::Rm(args) => args.execute(session, output),
            Self::Publish(args) => args.execute(session, output),
        }
    }
}
