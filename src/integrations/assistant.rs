//! Coding-assistant subprocess: interactive sessions and ticket suggestions.

use crate::data::Ticket;
use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};

/// A title/description pair proposed for a new ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketSuggestion {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct Assistant {
    command: String,
    model: Option<String>,
}

impl Assistant {
    pub fn new(command: impl Into<String>, model: Option<String>) -> Self {
        Self {
            command: command.into(),
            model,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Run an interactive session in `dir` seeded with the ticket, inheriting stdio.
    pub fn start_session(&self, dir: &Path, ticket: &Ticket) -> Result<()> {
        let prompt = session_prompt(ticket);
        tracing::info!(key = %ticket.key, dir = %dir.display(), "starting assistant session");
        let status = Command::new(&self.command)
            .arg(prompt)
            .current_dir(dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("Failed to start `{}`", self.command))?;
        if !status.success() {
            bail!("`{}` exited with {}", self.command, status);
        }
        Ok(())
    }

    /// Ask the assistant to describe `diff` as a ticket.
    pub fn suggest_ticket(&self, diff: &str) -> Result<TicketSuggestion> {
        let mut cmd = Command::new(&self.command);
        if let Some(model) = &self.model {
            cmd.args(["--model", model]);
        }
        let output = cmd
            .args(["-p", &suggestion_prompt(diff)])
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run `{}`", self.command))?;
        if !output.status.success() {
            bail!(
                "`{}` failed: {}",
                self.command,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_suggestion(&stdout).with_context(|| {
            format!("Could not read a suggestion from the reply:\n{}", stdout.trim())
        })
    }
}

pub fn session_prompt(ticket: &Ticket) -> String {
    format!(
        "Working on {}: {}\n\n{}",
        ticket.key,
        ticket.summary,
        ticket.description.as_deref().unwrap_or_default()
    )
}

fn suggestion_prompt(diff: &str) -> String {
    format!(
        "Analyze this git diff and suggest a Jira ticket. Reply with exactly two lines:\n\
         TITLE: <a short imperative title, max 80 chars>\n\
         DESCRIPTION: <one sentence describing what the change does>\n\n\
         Do not include any other text or formatting.\n\n{}",
        diff
    )
}

/// Pull the `TITLE:` and `DESCRIPTION:` lines out of a reply. Both are required.
pub fn parse_suggestion(reply: &str) -> Result<TicketSuggestion> {
    if reply.trim().is_empty() {
        bail!("empty reply");
    }
    let mut title = None;
    let mut description = None;
    for line in reply.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("TITLE:") {
            title.get_or_insert_with(|| rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("DESCRIPTION:") {
            description.get_or_insert_with(|| rest.trim().to_string());
        }
    }
    match (title, description) {
        (Some(title), Some(description)) if !title.is_empty() && !description.is_empty() => {
            Ok(TicketSuggestion { title, description })
        }
        _ => bail!("reply is missing TITLE or DESCRIPTION"),
    }
}
