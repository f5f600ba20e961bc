//! `quire ls` command implementation.

use clap::Args;
use quire_remote::Entry;

use crate::error::CliError;
use crate::output::Output;
use crate::session::Session;

/// Arguments for the ls command.
#[derive(Args)]
pub(crate) struct LsArgs {
    /// Directory relative to the content root (default: the root).
    #[arg(default_value = "")]
    dir: String,

    /// List the asset root instead of a content directory.
    #[arg(short, long, conflicts_with = "dir")]
    assets: bool,

    /// Show modification times (one extra request per file).
    #[arg(short, long)]
    long: bool,
}

impl LsArgs {
    /// Execute the ls command.
    pub(crate) fn execute(self, session: &Session, output: &Output) -> Result<(), CliError> {
        let entries = if self.assets {
            session.coordinator.list_assets()?
        } else {
            let dir = session.content_path(&self.dir)?;
            session.coordinator.list(&dir)?
        };

        if entries.is_empty() {
            output.note("(empty)");
        }
        for entry in &entries {
            if entry.is_dir() {
                output.data_dir(&entry.name);
            } else if self.long {
                output.data(&long_line(session, entry)?);
            } else {
                output.data(&entry.name);
            }
        }
        Ok(())
    }
}

fn long_line(session: &Session, entry: &Entry) -> Result<String, CliError> {
    let modified = session
        .coordinator
        .last_modified(entry)?
        .map_or_else(|| "-".repeat(16), |t| t.format("%Y-%m-%d %H:%M").to_string());
    Ok(format!("{modified}  {}", entry.name))
}
