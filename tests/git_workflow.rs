//! Branch and worktree activation against throwaway repositories.
//!
//! Tests skip themselves when `git` is not installed.

use branchboard::config::Config;
use branchboard::data::Ticket;
use branchboard::errors::UserError;
use branchboard::integrations::git::Git;
use branchboard::tui::{LaunchMode, LaunchRequest};
use branchboard::workflow::activate::activate_in;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn git_available() -> bool {
    Command::new("git").arg("--version").output().is_ok_and(|o| o.status.success())
}

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git").args(args).current_dir(dir).output().unwrap();
    assert!(status.status.success(), "git {:?}: {}", args, String::from_utf8_lossy(&status.stderr));
}

/// Repo with one commit at `<tmp>/repo`, so worktrees land inside the tempdir.
fn repo() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("repo");
    std::fs::create_dir(&dir).unwrap();
    git(&dir, &["init", "-q", "-b", "main"]);
    git(&dir, &["config", "user.email", "test@example.com"]);
    git(&dir, &["config", "user.name", "Test"]);
    std::fs::write(dir.join("README.md"), "hello\n").unwrap();
    git(&dir, &["add", "."]);
    git(&dir, &["commit", "-q", "-m", "init"]);
    (tmp, dir)
}

fn request(mode: LaunchMode) -> LaunchRequest {
    LaunchRequest {
        ticket: Ticket {
            key: "WEB-7".into(),
            summary: "Fix login bug".into(),
            status: "To Do".into(),
            ..Default::default()
        },
        mode,
    }
}

fn config(worktrees: bool) -> Config {
    Config {
        projects: vec!["WEB".into()],
        jira_url: "https://acme.atlassian.net".into(),
        enable_worktrees: worktrees,
        enable_assistant: false,
        ..Default::default()
    }
}

fn never_asked(_: &str) -> anyhow::Result<bool> {
    panic!("clean tree should not prompt")
}

mod branch_mode {
    use super::*;

    #[test]
    fn creates_then_reuses_branch() {
        if !git_available() {
            return;
        }
        let (_tmp, dir) = repo();
        let g = Git::new(&dir);

        let ws = activate_in(&g, &config(true), &request(LaunchMode::Branch), never_asked).unwrap();
        assert_eq!(ws.branch, "WEB-7_fix-login-bug");
        assert!(!ws.worktree);
        assert_eq!(g.current_branch().as_deref(), Some("WEB-7_fix-login-bug"));

        git(&dir, &["checkout", "-q", "main"]);
        activate_in(&g, &config(true), &request(LaunchMode::Branch), never_asked).unwrap();
        assert_eq!(g.current_branch().as_deref(), Some("WEB-7_fix-login-bug"));
    }

    #[test]
    fn dirty_tree_declined_is_cancelled() {
        if !git_available() {
            return;
        }
        let (_tmp, dir) = repo();
        std::fs::write(dir.join("README.md"), "changed\n").unwrap();
        let g = Git::new(&dir);

        let err = activate_in(&g, &config(false), &request(LaunchMode::Branch), |q| {
            assert!(q.contains("WEB-7_fix-login-bug"));
            Ok(false)
        })
        .unwrap_err();
        let user = err.downcast_ref::<UserError>().expect("user error");
        assert_eq!(*user, UserError::cancelled());
        assert_eq!(g.current_branch().as_deref(), Some("main"));
    }

    #[test]
    fn dirty_tree_accepted_is_stashed() {
        if !git_available() {
            return;
        }
        let (_tmp, dir) = repo();
        std::fs::write(dir.join("README.md"), "changed\n").unwrap();
        let g = Git::new(&dir);

        activate_in(&g, &config(false), &request(LaunchMode::Branch), |_| Ok(true)).unwrap();
        assert!(!g.is_dirty().unwrap());
        let stashes = Command::new("git")
            .args(["stash", "list"])
            .current_dir(&dir)
            .output()
            .unwrap();
        assert!(String::from_utf8_lossy(&stashes.stdout).contains("branchboard: switching to WEB-7"));
    }

    #[test]
    fn outside_a_repo_is_a_user_error() {
        if !git_available() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let err = activate_in(&Git::new(tmp.path()), &config(false), &request(LaunchMode::Branch), never_asked)
            .unwrap_err();
        let user = err.downcast_ref::<UserError>().expect("user error");
        assert_eq!(user.title, "Not a git repository");
    }
}

mod interactive_mode {
    use super::*;

    #[test]
    fn uses_sibling_worktree_when_enabled() {
        if !git_available() {
            return;
        }
        let (tmp, dir) = repo();
        let g = Git::new(&dir);

        let ws = activate_in(&g, &config(true), &request(LaunchMode::Interactive), never_asked).unwrap();
        assert!(ws.worktree);
        let root = tmp.path().canonicalize().unwrap();
        assert_eq!(ws.dir, root.join("repo-WEB-7_fix-login-bug"));
        assert!(ws.dir.join("README.md").exists());
        // Main checkout is untouched
        assert_eq!(g.current_branch().as_deref(), Some("main"));

        let again = activate_in(&g, &config(true), &request(LaunchMode::Interactive), never_asked).unwrap();
        assert_eq!(again.dir, ws.dir);
    }

    #[test]
    fn checks_out_in_place_when_worktrees_disabled() {
        if !git_available() {
            return;
        }
        let (_tmp, dir) = repo();
        let g = Git::new(&dir);

        let ws = activate_in(&g, &config(false), &request(LaunchMode::Interactive), never_asked).unwrap();
        assert!(!ws.worktree);
        assert_eq!(ws.dir, dir);
        assert_eq!(g.current_branch().as_deref(), Some("WEB-7_fix-login-bug"));
    }
}
