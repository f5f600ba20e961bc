//! `quire upload` command implementation.

use std::path::PathBuf;

use clap::Args;

use crate::error::CliError;
use crate::output::Output;
use crate::session::{Session, commit_message};

/// Arguments for the upload command.
#[derive(Args)]
pub(crate) struct UploadArgs {
    /// Local file to upload.
    file: PathBuf,

    /// Name in the asset root (default: the local file name).
    #[arg(short, long)]
    name: Option<String>,

    /// Commit message.
    #[arg(short, long)]
    message: Option<String>,
}

impl UploadArgs {
    /// Execute the upload command.
    pub(crate) fn execute(self, session: &Session, output: &Output) -> Result<(), CliError> {
        let name = match self.name {
            Some(name) => name,
            None => self
                .file
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_owned)
                .ok_or_else(|| {
                    CliError::Validation(format!("no file name in {}", self.file.display()))
                })?,
        };
        let content = std::fs::read(&self.file)?;
        let message = commit_message(self.message, || format!("Upload {name}"));

        let link = session.coordinator.upload_asset(&name, &content, &message)?;
        output.success(&format!("Uploaded {name}"));
        output.data(&link);
        Ok(())
    }
}
