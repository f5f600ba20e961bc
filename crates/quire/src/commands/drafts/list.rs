//! `quire drafts list` command implementation.

use crate::error::CliError;
use crate::output::Output;
use crate::session::Session;

/// Execute the drafts list command.
pub(crate) fn execute(session: &Session, output: &Output) -> Result<(), CliError> {
    let drafts = session.drafts.list(&session.repository.id)?;
    if drafts.is_empty() {
        output.note("No drafts.");
    }
    for draft in drafts {
        let target = draft.target_directory.as_deref().unwrap_or("/");
        output.data(&format!(
            "{}  {}  {}  ({target})",
            draft.id,
            draft.last_modified.format("%Y-%m-%d %H:%M"),
            draft.title
        ));
    }
    Ok(())
}
