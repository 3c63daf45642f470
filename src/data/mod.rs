pub mod grouping;

use serde::{Deserialize, Serialize};

/// The three fixed board columns, keyed by Jira status category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatusCategory {
    ToDo,
    InProgress,
    Done,
}

impl StatusCategory {
    /// Column order on the board.
    pub const ALL: [StatusCategory; 3] = [Self::ToDo, Self::InProgress, Self::Done];

    /// Display title, also the `statusCategory` value used in JQL.
    pub fn title(&self) -> &'static str {
        match self {
            Self::ToDo => "To Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.title().eq_ignore_ascii_case(name.trim()))
    }
}

/// Which tickets a board session shows, relative to the current user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    #[default]
    AssignedOrReported,
    Assigned,
    Reported,
    Unassigned,
}

impl Scope {
    pub const ALL: [Scope; 4] = [
        Self::AssignedOrReported,
        Self::Assigned,
        Self::Reported,
        Self::Unassigned,
    ];

    /// Next scope in the fixed cycling order (wraps).
    pub fn next(&self) -> Self {
        match self {
            Self::AssignedOrReported => Self::Assigned,
            Self::Assigned => Self::Reported,
            Self::Reported => Self::Unassigned,
            Self::Unassigned => Self::AssignedOrReported,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::AssignedOrReported => "Assigned or Reported",
            Self::Assigned => "Assigned to me",
            Self::Reported => "Reported by me",
            Self::Unassigned => "Unassigned",
        }
    }

    /// Key used in config files and environment variables.
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::AssignedOrReported => "assigned_or_reported",
            Self::Assigned => "assigned",
            Self::Reported => "reported",
            Self::Unassigned => "unassigned",
        }
    }

    /// Parse a config key, tolerating case, dashes and spaces.
    pub fn from_config_key(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|s| s.config_key() == normalized)
    }

    /// JQL predicate selecting this scope's tickets.
    pub fn jql_predicate(&self) -> &'static str {
        match self {
            Self::AssignedOrReported => "(assignee = currentUser() OR reporter = currentUser())",
            Self::Assigned => "assignee = currentUser()",
            Self::Reported => "reporter = currentUser()",
            Self::Unassigned => "assignee is EMPTY",
        }
    }
}

/// A ticket as fetched from the tracker. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ticket {
    pub key: String,
    pub summary: String,
    /// Workflow status name, e.g. "Backlog" or "Selected for Development"
    pub status: String,
    pub category: Option<StatusCategory>,
    pub parent: Option<String>,
    pub is_subtask: bool,
    pub assignee: Option<String>,
    pub priority: Option<String>,
    pub issue_type: String,
    pub project: String,
    pub description: Option<String>,
}

impl Ticket {
    pub fn is_backlog(&self) -> bool {
        self.status.to_lowercase().contains("backlog")
    }

    /// Parent key, only for subtasks that actually name one.
    pub fn parent_key(&self) -> Option<&str> {
        if !self.is_subtask {
            return None;
        }
        self.parent.as_deref().filter(|p| !p.is_empty())
    }

    /// First word of the assignee's display name, at most 8 characters.
    pub fn assignee_short(&self) -> Option<String> {
        let name = self.assignee.as_deref()?.split_whitespace().next()?;
        Some(name.chars().take(8).collect())
    }

    /// Short priority tag such as `HIGH` or `MIN`.
    pub fn priority_short(&self) -> Option<String> {
        let name = self.priority.as_deref().filter(|p| !p.trim().is_empty())?;
        let short = match name.to_lowercase().as_str() {
            "critical" | "highest" | "blocker" => "CRIT".to_string(),
            "high" => "HIGH".to_string(),
            "medium" => "MED".to_string(),
            "low" => "LOW".to_string(),
            "lowest" | "trivial" => "MIN".to_string(),
            _ => name.chars().take(4).collect::<String>().to_uppercase(),
        };
        Some(short)
    }
}
