//! `branchboard create`: describe the current change as a new ticket, then
//! rename the branch after it.

use crate::config::{self, Config};
use crate::errors::UserError;
use crate::integrations::assistant::{Assistant, TicketSuggestion};
use crate::integrations::git::{branch_name, is_protected_branch, Git};
use crate::integrations::jira::{JiraClient, NewIssue};
use crate::util;
use anyhow::{Context, Result};

pub const DEFAULT_ISSUE_TYPE: &str = "Task";

#[derive(Debug, Clone)]
pub struct CreateOptions {
    pub project: Option<String>,
    pub issue_type: String,
    pub dry_run: bool,
    pub no_assistant: bool,
    /// Create the ticket but leave the branch alone
    pub no_rename: bool,
    /// Overrides `assistant_model` for this run
    pub model: Option<String>,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            project: None,
            issue_type: DEFAULT_ISSUE_TYPE.to_string(),
            dry_run: false,
            no_assistant: false,
            no_rename: false,
            model: None,
        }
    }
}

impl CreateOptions {
    pub fn issue_type(&self) -> &str {
        match self.issue_type.trim() {
            "" => DEFAULT_ISSUE_TYPE,
            t => t,
        }
    }

    pub fn assistant_model(&self, config: &Config) -> Option<String> {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .or_else(|| config.assistant_model.clone())
    }
}

/// What happens to the current branch once the ticket exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchPlan {
    Keep,
    Rename(String),
    /// Protected branches are left as they are; work moves to a new branch
    Create(String),
}

impl BranchPlan {
    pub fn decide(current: &str, target: String, no_rename: bool) -> Self {
        if no_rename {
            Self::Keep
        } else if is_protected_branch(current) {
            Self::Create(target)
        } else {
            Self::Rename(target)
        }
    }
}

/// Answer to the review prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Review {
    Use,
    EditTitle,
    EditBoth,
    Cancel,
}

impl Review {
    pub fn parse(answer: &str) -> Option<Self> {
        match answer.trim().to_lowercase().as_str() {
            "" | "u" | "use" => Some(Self::Use),
            "t" | "title" => Some(Self::EditTitle),
            "b" | "both" => Some(Self::EditBoth),
            "c" | "cancel" | "q" => Some(Self::Cancel),
            _ => None,
        }
    }
}

pub async fn run(config: &Config, opts: &CreateOptions) -> Result<()> {
    util::require_tty()?;

    let git = Git::current_dir()?;
    if !git.is_repo() {
        return Err(UserError::not_a_repo(git.dir()).into());
    }
    let current = git
        .current_branch()
        .context("Could not determine the current branch")?;

    let change = git.capture_change().ok_or_else(UserError::nothing_to_describe)?;
    tracing::debug!(chars = change.len(), branch = %current, "captured change");

    let suggestion = if config.enable_assistant && !opts.no_assistant {
        println!("Asking {} to describe the change...", config.assistant_command);
        let assistant = Assistant::new(&config.assistant_command, opts.assistant_model(config));
        match assistant.suggest_ticket(&change) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Assistant suggestion failed: {:#}", e);
                println!("No suggestion ({:#}). Describe the ticket yourself.", e);
                ask_suggestion(None)?
            }
        }
    } else {
        ask_suggestion(None)?
    };

    let suggestion = review(suggestion)?;
    let project = resolve_project(opts.project.as_deref(), &config.projects, |choices| {
        util::prompt(&format!("Project ({})", choices.join(", ")), choices.first().map(String::as_str))
    })?;

    if opts.dry_run {
        println!("\nDry run, nothing created.");
        println!("  Project:     {}", project);
        println!("  Type:        {}", opts.issue_type());
        println!("  Title:       {}", suggestion.title);
        println!("  Description: {}", suggestion.description);
        match BranchPlan::decide(&current, branch_name("<KEY>", &suggestion.title), opts.no_rename) {
            BranchPlan::Keep => println!("  Branch:      {} (unchanged)", current),
            BranchPlan::Rename(b) => println!("  Branch:      {} -> {}", current, b),
            BranchPlan::Create(b) => println!("  Branch:      new {} from {}", b, current),
        }
        return Ok(());
    }

    let creds = config::resolve_credentials(config)?;
    let client = JiraClient::new(&config.jira_url, creds.email, creds.token, config.projects.clone());
    let account_id = client.myself().await.context("Failed to look up your Jira account")?;
    let key = client
        .create_issue(&NewIssue {
            project,
            summary: suggestion.title.clone(),
            description: suggestion.description.clone(),
            issue_type: opts.issue_type().to_string(),
            assignee_account_id: Some(account_id),
        })
        .await
        .context("Failed to create the ticket")?;
    println!("Created {} ({})", key, client.browse_url(&key));

    match BranchPlan::decide(&current, branch_name(&key, &suggestion.title), opts.no_rename) {
        BranchPlan::Keep => println!("Branch {} left as is", current),
        BranchPlan::Create(branch) => {
            git.checkout_or_create(&branch)?;
            println!("Created branch {} (left {} untouched)", branch, current);
        }
        BranchPlan::Rename(branch) => {
            git.rename_current_branch(&branch)?;
            println!("Renamed {} to {}", current, branch);
        }
    }
    Ok(())
}

fn ask_suggestion(base: Option<&TicketSuggestion>) -> Result<TicketSuggestion> {
    let title = util::prompt("Title", base.map(|s| s.title.as_str()))?;
    let description = util::prompt("Description", base.map(|s| s.description.as_str()))?;
    if title.trim().is_empty() {
        return Err(UserError::cancelled().into());
    }
    Ok(TicketSuggestion { title, description })
}

/// Show the suggestion until the user accepts or cancels it.
fn review(mut suggestion: TicketSuggestion) -> Result<TicketSuggestion> {
    loop {
        println!("\nTitle:       {}", suggestion.title);
        println!("Description: {}\n", suggestion.description);
        let answer = util::prompt("[u]se / edit [t]itle / edit [b]oth / [c]ancel", Some("u"))?;
        match Review::parse(&answer) {
            Some(Review::Use) => return Ok(suggestion),
            Some(Review::EditTitle) => {
                suggestion.title = util::prompt("Title", Some(suggestion.title.as_str()))?;
            }
            Some(Review::EditBoth) => suggestion = ask_suggestion(Some(&suggestion))?,
            Some(Review::Cancel) => return Err(UserError::cancelled().into()),
            None => println!("Please answer u, t, b or c."),
        }
    }
}

/// `--project` wins, then a single configured project, then a prompt.
pub fn resolve_project(
    flag: Option<&str>,
    configured: &[String],
    ask: impl FnOnce(&[String]) -> Result<String>,
) -> Result<String> {
    if let Some(project) = flag.map(str::trim).filter(|p| !p.is_empty()) {
        return Ok(project.to_uppercase());
    }
    match configured {
        [] => Err(UserError::invalid_config("no projects configured").into()),
        [only] => Ok(only.clone()),
        many => {
            let answer = ask(many)?;
            let answer = answer.trim().to_uppercase();
            if answer.is_empty() {
                Err(UserError::cancelled().into())
            } else {
                Ok(answer)
            }
        }
    }
}
