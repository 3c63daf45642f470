//! Branch, worktree and assistant handling for a ticket picked on the board.
//! Runs after the terminal has been restored, so prompts use plain stdio.

use crate::config::Config;
use crate::errors::UserError;
use crate::integrations::assistant::Assistant;
use crate::integrations::git::{branch_name, Git};
use crate::tui::{LaunchMode, LaunchRequest};
use crate::util;
use anyhow::Result;
use std::path::PathBuf;

/// Where the work for a ticket ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub dir: PathBuf,
    pub branch: String,
    pub worktree: bool,
}

pub fn activate(config: &Config, request: &LaunchRequest) -> Result<Workspace> {
    let git = Git::current_dir()?;
    activate_in(&git, config, request, |question| util::confirm(question, true))
}

/// Same as [`activate`] against an explicit repository and answer source.
pub fn activate_in(
    git: &Git,
    config: &Config,
    request: &LaunchRequest,
    confirm: impl FnOnce(&str) -> Result<bool>,
) -> Result<Workspace> {
    if !git.is_repo() {
        return Err(UserError::not_a_repo(git.dir()).into());
    }

    let ticket = &request.ticket;
    let branch = branch_name(&ticket.key, &ticket.summary);

    let workspace = match request.mode {
        LaunchMode::Branch => checkout(git, &branch, confirm)?,
        LaunchMode::Interactive if config.enable_worktrees => match git.ensure_worktree(&branch) {
            Ok(wt) => {
                if wt.created {
                    println!("Created worktree {} on {}", wt.path.display(), wt.branch);
                } else {
                    println!("Using existing worktree {}", wt.path.display());
                }
                Workspace {
                    dir: wt.path,
                    branch: wt.branch,
                    worktree: true,
                }
            }
            Err(e) => {
                tracing::warn!("Worktree failed, falling back to a branch: {:#}", e);
                println!("Could not create a worktree ({:#}); using a branch instead.", e);
                checkout(git, &branch, confirm)?
            }
        },
        LaunchMode::Interactive => checkout(git, &branch, confirm)?,
    };

    if request.mode == LaunchMode::Interactive && config.enable_assistant {
        let assistant = Assistant::new(&config.assistant_command, config.assistant_model.clone());
        assistant.start_session(&workspace.dir, ticket)?;
    } else {
        println!("Ready: {} in {}", workspace.branch, workspace.dir.display());
    }

    Ok(workspace)
}

/// Check out `branch` in place, offering to stash a dirty tree first.
fn checkout(
    git: &Git,
    branch: &str,
    confirm: impl FnOnce(&str) -> Result<bool>,
) -> Result<Workspace> {
    if git.is_dirty()? {
        let question = format!("Working tree has uncommitted changes. Stash them and switch to {}?", branch);
        if !confirm(&question)? {
            return Err(UserError::cancelled().into());
        }
        git.stash(&format!("branchboard: switching to {}", branch))?;
    }

    if git.checkout_or_create(branch)? {
        println!("Created branch {}", branch);
    } else {
        println!("Switched to {}", branch);
    }
    Ok(Workspace {
        dir: git.dir().to_path_buf(),
        branch: branch.to_string(),
        worktree: false,
    })
}
