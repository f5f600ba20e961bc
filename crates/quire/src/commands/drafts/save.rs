//! `quire drafts save` command implementation.

use std::path::PathBuf;

use clap::Args;

use crate::error::CliError;
use crate::output::Output;
use crate::session::Session;

/// Arguments for the drafts save command.
#[derive(Args)]
#[command(group = clap::ArgGroup::new("change").required(true).multiple(true))]
pub(crate) struct SaveArgs {
    /// Draft id.
    id: String,

    /// New title.
    #[arg(short, long, group = "change")]
    title: Option<String>,

    /// Local file holding the new content.
    #[arg(short, long, group = "change")]
    file: Option<PathBuf>,
}

impl SaveArgs {
    /// Execute the drafts save command.
    pub(crate) fn execute(self, session: &Session, output: &Output) -> Result<(), CliError> {
        let drafts = &session.drafts;
        let mut draft = match &self.title {
            Some(title) => drafts.rename(&self.id, title)?,
            None => drafts.get(&self.id)?,
        };
        if let Some(file) = &self.file {
            draft.content = std::fs::read_to_string(file)?;
            draft = drafts.save(&draft)?;
        }
        output.success(&format!("Saved draft \"{}\"", draft.title));
        Ok(())
    }
}
