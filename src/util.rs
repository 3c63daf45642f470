//! Utility functions and helpers.

use crate::errors::UserError;
use anyhow::Result;
use std::io::{self, BufRead, Write};
use tokio::sync::mpsc;

/// Send a value through a channel, logging a warning if it fails.
///
/// This eliminates the repetitive pattern:
/// ```ignore
/// if let Err(e) = tx.send(value).await {
///     tracing::warn!("Failed to send: {}", e);
/// }
/// ```
pub async fn send_or_log<T>(tx: &mpsc::Sender<T>, value: T, context: &str) {
    if let Err(e) = tx.send(value).await {
        tracing::warn!("Failed to send {}: {}", context, e);
    }
}

/// Fail early when nobody can answer a prompt.
pub fn require_tty() -> Result<()> {
    require_tty_on(atty::Stream::Stdin)
}

pub fn require_tty_on(stream: atty::Stream) -> Result<()> {
    if !atty::is(stream) {
        return Err(UserError::not_a_terminal().into());
    }
    Ok(())
}

/// Prompt for a line of input. An empty answer yields `default`.
pub fn prompt(label: &str, default: Option<&str>) -> Result<String> {
    let stdin = io::stdin();
    prompt_from(&mut stdin.lock(), &mut io::stdout(), label, default)
}

/// Yes/no question. An empty answer yields `default`.
pub fn confirm(label: &str, default: bool) -> Result<bool> {
    let hint = if default { "Y/n" } else { "y/N" };
    let answer = prompt(&format!("{} [{}]", label, hint), None)?;
    Ok(parse_yes_no(&answer, default))
}

pub fn prompt_from(
    input: &mut impl BufRead,
    output: &mut impl Write,
    label: &str,
    default: Option<&str>,
) -> Result<String> {
    match default {
        Some(d) if !d.is_empty() => write!(output, "{} [{}]: ", label, d)?,
        _ => write!(output, "{}: ", label)?,
    }
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim();
    if answer.is_empty() {
        Ok(default.unwrap_or_default().to_string())
    } else {
        Ok(answer.to_string())
    }
}

pub fn parse_yes_no(answer: &str, default: bool) -> bool {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    }
}
