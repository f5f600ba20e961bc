//! `quire drafts new` command implementation.

use std::path::PathBuf;

use clap::Args;

use crate::error::CliError;
use crate::output::Output;
use crate::session::Session;

/// Arguments for the drafts new command.
#[derive(Args)]
pub(crate) struct NewArgs {
    /// Draft title; also determines the published file name.
    title: String,

    /// Directory to publish into, relative to the content root.
    #[arg(short, long)]
    dir: Option<String>,

    /// Local file to take the initial content from.
    #[arg(short, long)]
    file: Option<PathBuf>,
}

impl NewArgs {
    /// Execute the drafts new command.
    pub(crate) fn execute(self, session: &Session, output: &Output) -> Result<(), CliError> {
        let drafts = &session.drafts;
        let mut draft = drafts.create(&session.repository.id, &self.title, self.dir.as_deref())?;
        if let Some(file) = &self.file {
            draft.content = std::fs::read_to_string(file)?;
            draft = drafts.save(&draft)?;
        }
        output.success(&format!("Created draft \"{}\"", draft.title));
        output.data(&draft.id);
        Ok(())
    }
}
