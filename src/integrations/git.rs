//! Git subprocess helpers for turning a ticket into a branch or worktree.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;

static NON_SLUG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-z0-9]+").expect("static regex is valid")
});

const MAX_SLUG_LEN: usize = 50;
pub const MAX_DIFF_CHARS: usize = 8000;

/// `{KEY}_{slug}`, or just the key when the summary has no usable characters.
pub fn branch_name(key: &str, summary: &str) -> String {
    let lower = summary.to_lowercase();
    let slug = NON_SLUG.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');
    // The slug is ASCII after replacement, so byte truncation is safe
    let slug = if slug.len() > MAX_SLUG_LEN {
        slug[..MAX_SLUG_LEN].trim_end_matches('-')
    } else {
        slug
    };
    if slug.is_empty() {
        key.to_string()
    } else {
        format!("{}_{}", key, slug)
    }
}

/// Branches that are never renamed in place.
pub fn is_protected_branch(branch: &str) -> bool {
    matches!(branch, "main" | "master" | "develop" | "HEAD")
}

/// Sibling directory `../{repo}-{branch}` for a worktree.
pub fn worktree_path(repo_root: &Path, branch: &str) -> PathBuf {
    let repo_name = repo_root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "repo".to_string());
    let parent = repo_root.parent().unwrap_or(repo_root);
    parent.join(format!("{}-{}", repo_name, branch))
}

/// Cut `text` to `max` characters, marking the cut.
pub fn truncate_diff(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => format!("{}\n... (truncated)", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Outcome of preparing a worktree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worktree {
    pub path: PathBuf,
    pub branch: String,
    pub created: bool,
}

/// A git repository rooted at (or containing) `dir`.
#[derive(Debug, Clone)]
pub struct Git {
    dir: PathBuf,
}

impl Git {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn current_dir() -> Result<Self> {
        Ok(Self::new(
            std::env::current_dir().context("Could not determine current directory")?,
        ))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(&self.dir);
        cmd
    }

    /// Run git and return trimmed stdout, failing with git's stderr.
    fn run(&self, args: &[&str]) -> Result<String> {
        let output = self
            .command(args)
            .output()
            .with_context(|| format!("Failed to run git {}", args.join(" ")))?;
        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Stdout of a command whose failure just means "nothing".
    fn run_quiet(&self, args: &[&str]) -> Option<String> {
        let output = self.command(args).output().ok()?;
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).to_string())
    }

    pub fn is_repo(&self) -> bool {
        self.run_quiet(&["rev-parse", "--is-inside-work-tree"])
            .is_some_and(|out| out.trim() == "true")
    }

    pub fn toplevel(&self) -> Result<PathBuf> {
        self.run(&["rev-parse", "--show-toplevel"])
            .map(PathBuf::from)
            .context("Not inside a git repository")
    }

    pub fn current_branch(&self) -> Option<String> {
        self.run_quiet(&["rev-parse", "--abbrev-ref", "HEAD"])
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
    }

    pub fn branch_exists(&self, branch: &str) -> bool {
        self.command(&["rev-parse", "--verify", "--quiet", branch])
            .output()
            .is_ok_and(|o| o.status.success())
    }

    pub fn is_dirty(&self) -> Result<bool> {
        Ok(!self.run(&["status", "--porcelain"])?.is_empty())
    }

    pub fn stash(&self, message: &str) -> Result<()> {
        self.run(&["stash", "push", "-m", message]).map(|_| ())
    }

    /// Check out `branch`, creating it from HEAD when missing.
    /// Returns `true` when the branch was created.
    pub fn checkout_or_create(&self, branch: &str) -> Result<bool> {
        if self.branch_exists(branch) {
            self.run(&["checkout", branch])?;
            Ok(false)
        } else {
            self.run(&["checkout", "-b", branch])?;
            Ok(true)
        }
    }

    pub fn rename_current_branch(&self, new_name: &str) -> Result<()> {
        self.run(&["branch", "-m", new_name]).map(|_| ())
    }

    /// Reuse or create the sibling worktree for `branch`.
    pub fn ensure_worktree(&self, branch: &str) -> Result<Worktree> {
        let root = self.toplevel()?;
        let path = worktree_path(&root, branch);
        if path.exists() {
            return Ok(Worktree {
                path,
                branch: branch.to_string(),
                created: false,
            });
        }

        let path_str = path.to_string_lossy().to_string();
        if self.branch_exists(branch) {
            self.run(&["worktree", "add", &path_str, branch])?;
        } else {
            self.run(&["worktree", "add", "-b", branch, &path_str])?;
        }
        tracing::info!(path = %path.display(), branch, "created worktree");
        Ok(Worktree {
            path,
            branch: branch.to_string(),
            created: true,
        })
    }

    /// Uncommitted diff, else commits since `main`, plus untracked file names.
    /// `None` when there is nothing to describe.
    pub fn capture_change(&self) -> Option<String> {
        let mut parts = Vec::new();

        let non_empty = |s: Option<String>| s.filter(|d| !d.trim().is_empty());
        if let Some(diff) = non_empty(self.run_quiet(&["diff", "HEAD"])) {
            parts.push(diff);
        } else if let Some(diff) = non_empty(self.run_quiet(&["diff", "main...HEAD"])) {
            parts.push(diff);
        }

        if let Some(untracked) =
            non_empty(self.run_quiet(&["ls-files", "--others", "--exclude-standard"]))
        {
            parts.push(format!("Untracked files:\n{}", untracked));
        }

        if parts.is_empty() {
            return None;
        }
        Some(truncate_diff(&parts.join("\n"), MAX_DIFF_CHARS))
    }
}
