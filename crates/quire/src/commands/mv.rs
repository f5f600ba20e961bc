//! `quire mv` command implementation.

use clap::Args;
use quire_remote::{file_name, parent_path};
use quire_sync::ErrorKind;

use crate::error::CliError;
use crate::output::Output;
use crate::session::{Session, commit_message};

/// Arguments for the mv command.
#[derive(Args)]
pub(crate) struct MvArgs {
    /// Source path relative to the content root.
    source: String,

    /// Existing directory to move into, or a new name in the same directory.
    destination: String,

    /// Move directories file by file instead of in one commit.
    #[arg(long)]
    per_file: bool,

    /// Commit message.
    #[arg(short, long)]
    message: Option<String>,
}

/// What `mv` resolved its destination to.
#[derive(Debug, PartialEq, Eq)]
enum Target {
    Into(String),
    Rename(String),
}

impl MvArgs {
    /// Execute the mv command.
    pub(crate) fn execute(self, session: &Session, output: &Output) -> Result<(), CliError> {
        let entry = session.entry(&self.source)?;
        let destination = session.content_path(&self.destination)?;
        let destination_is_dir = match session.coordinator.stat(&destination) {
            Ok(found) => found.is_dir(),
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        let target = resolve_target(&entry.path, &destination, destination_is_dir)?;
        let message = commit_message(self.message, || {
            format!("Move {} to {}", self.source, self.destination)
        });

        let coordinator = &session.coordinator;
        let moved = match (&target, entry.is_dir()) {
            (Target::Rename(name), false) => coordinator.rename_file(&entry, name, &message)?,
            (Target::Rename(name), true) => coordinator.rename_directory(&entry, name, &message)?,
            (Target::Into(dir), false) => coordinator.move_file(&entry, dir, &message)?,
            (Target::Into(dir), true) if self.per_file => {
                coordinator.move_into(&entry, dir, &message)?
            }
            (Target::Into(dir), true) => coordinator.move_directory(&entry, dir, &message)?,
        };
        output.success(&format!("Moved {} to {}", entry.path, moved.path));
        Ok(())
    }
}

fn resolve_target(
    source: &str,
    destination: &str,
    destination_is_dir: bool,
) -> Result<Target, CliError> {
    if destination_is_dir {
        return Ok(Target::Into(destination.to_owned()));
    }
    if parent_path(destination) == parent_path(source) {
        return Ok(Target::Rename(file_name(destination).to_owned()));
    }
    Err(CliError::Validation(format!(
        "'{destination}' is not an existing directory; to move and rename, run mv twice"
    )))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_existing_directory_is_move_target() {
        assert_eq!(
            resolve_target("content/a.md", "content/posts", true).unwrap(),
            Target::Into("content/posts".to_owned())
        );
    }

    #[test]
    fn test_sibling_path_is_rename() {
        assert_eq!(
            resolve_target("content/posts/a.md", "content/posts/b.md", false).unwrap(),
            Target::Rename("b.md".to_owned())
        );
    }

    #[test]
    fn test_move_and_rename_rejected() {
        assert!(resolve_target("content/a.md", "content/posts/b.md", false).is_err());
    }
}
