//! Colored terminal output utilities.

use console::{Style, Term};
use quire_sync::PartialFailure;

use crate::error::CliError;

/// Terminal output formatter.
///
/// Command results go to stdout; progress and diagnostics go to stderr.
pub(crate) struct Output {
    out: Term,
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    cyan_bold: Style,
    dim: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            out: Term::stdout(),
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
            dim: Style::new().dim(),
        }
    }

    fn styled(&self, style: &Style, msg: &str) {
        let _ = self.term.write_line(&style.apply_to(msg).to_string());
    }

    /// Print a result line to stdout.
    pub(crate) fn data(&self, msg: &str) {
        let _ = self.out.write_line(msg);
    }

    /// Print a directory name to stdout (cyan bold, trailing slash).
    pub(crate) fn data_dir(&self, name: &str) {
        let line = self.cyan_bold.apply_to(format!("{name}/"));
        let _ = self.out.write_line(&line.to_string());
    }

    /// Print an info message.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Print a secondary message (dim).
    pub(crate) fn note(&self, msg: &str) {
        self.styled(&self.dim, msg);
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        self.styled(&self.green, msg);
    }

    /// Print a warning message (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        self.styled(&self.yellow, msg);
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        self.styled(&self.red, msg);
    }

    /// Explain which steps of a partially applied operation took effect.
    pub(crate) fn report_partial(&self, err: &CliError) {
        let CliError::Sync(err) = err else {
            return;
        };
        let Some(partial) = err.as_partial() else {
            return;
        };
        self.warning(&partial_summary(partial));
        for path in &partial.completed {
            self.info(&format!("  done: {path}"));
        }
        self.info(&format!("  failed: {} ({})", partial.failed, partial.source));
        self.note("Refresh the listing and retry the remaining steps.");
    }
}

fn partial_summary(partial: &PartialFailure) -> String {
    format!(
        "The {} was only partly applied ({} step(s) committed):",
        partial.operation,
        partial.completed.len()
    )
}
