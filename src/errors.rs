//! Errors the user can fix themselves, printed with a remediation hint.

use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{title}: {message}")]
pub struct UserError {
    pub title: String,
    pub message: String,
    pub remediation: String,
}

impl UserError {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            remediation: remediation.into(),
        }
    }

    pub fn not_configured(path: &Path) -> Self {
        Self::new(
            "Not configured",
            format!("No config file at {}", path.display()),
            "Run `branchboard init`, or set BRANCHBOARD_JIRA_URL and BRANCHBOARD_PROJECTS.",
        )
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(
            "Invalid configuration",
            message,
            "Fix the value in your config file or environment, or re-run `branchboard init`.",
        )
    }

    pub fn missing_token() -> Self {
        Self::new(
            "No Jira API token",
            "JIRA_API_TOKEN is not set and no 1Password reference produced a token",
            "Export JIRA_API_TOKEN, or set op_token_path in your config and sign in to `op`.",
        )
    }

    pub fn missing_git_email() -> Self {
        Self::new(
            "No git email",
            "`git config user.email` returned nothing",
            "Run `git config --global user.email you@example.com`.",
        )
    }

    pub fn not_a_terminal() -> Self {
        Self::new(
            "Interactive terminal required",
            "stdin is not a terminal, so there is nobody to answer prompts",
            "Run the command from an interactive shell.",
        )
    }

    pub fn not_a_repo(dir: &Path) -> Self {
        Self::new(
            "Not a git repository",
            format!("{} is not inside a git work tree", dir.display()),
            "Run branchboard from your project checkout.",
        )
    }

    pub fn nothing_to_describe() -> Self {
        Self::new(
            "No changes found",
            "There is no diff against HEAD or main and no untracked file",
            "Make your change first, then run `branchboard create`.",
        )
    }

    pub fn cancelled() -> Self {
        Self::new("Cancelled", "Stopped at your request", "Nothing was changed.")
    }

    /// Three-part diagnostic for stderr.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Error: {}", self.title);
        let _ = writeln!(out, "  {}", self.message);
        let _ = write!(out, "  Hint: {}", self.remediation);
        out
    }
}
