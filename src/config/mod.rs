pub mod prefs;

use crate::data::Scope;
use crate::errors::UserError;
use crate::util;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const ENV_PROJECTS: &str = "BRANCHBOARD_PROJECTS";
pub const ENV_DEFAULT_SCOPE: &str = "BRANCHBOARD_DEFAULT_SCOPE";
pub const ENV_JIRA_URL: &str = "BRANCHBOARD_JIRA_URL";
pub const ENV_OP_TOKEN_PATH: &str = "BRANCHBOARD_OP_TOKEN_PATH";
pub const ENV_API_TOKEN: &str = "JIRA_API_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub default_scope: Scope,
    #[serde(default)]
    pub jira_url: String,
    #[serde(default)]
    pub enable_assistant: bool,
    #[serde(default = "default_true")]
    pub enable_worktrees: bool,
    /// 1Password secret reference for the API token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op_token_path: Option<String>,
    /// Rewrites of the git email's domain, e.g. `personal.dev` -> `corp.com`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub email_domain_map: BTreeMap<String, String>,
    #[serde(default = "default_assistant_command")]
    pub assistant_command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_model: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_assistant_command() -> String {
    "claude".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            default_scope: Scope::default(),
            jira_url: String::new(),
            enable_assistant: false,
            enable_worktrees: true,
            op_token_path: None,
            email_domain_map: BTreeMap::new(),
            assistant_command: default_assistant_command(),
            assistant_model: None,
        }
    }
}

impl Config {
    /// Apply `BRANCHBOARD_*` overrides. `env` looks up a variable by name.
    pub fn apply_env_overlay(&mut self, env: &impl Fn(&str) -> Option<String>) {
        if let Some(raw) = env(ENV_PROJECTS) {
            let projects: Vec<String> = raw
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
            if !projects.is_empty() {
                self.projects = projects;
            }
        }

        if let Some(raw) = env(ENV_DEFAULT_SCOPE).filter(|s| !s.trim().is_empty()) {
            match Scope::from_config_key(&raw) {
                Some(scope) => self.default_scope = scope,
                None => tracing::warn!("Ignoring unknown {}={}", ENV_DEFAULT_SCOPE, raw),
            }
        }

        if let Some(url) = env(ENV_JIRA_URL).filter(|s| !s.trim().is_empty()) {
            self.jira_url = url.trim().to_string();
        }

        if let Some(path) = env(ENV_OP_TOKEN_PATH).filter(|s| !s.trim().is_empty()) {
            self.op_token_path = Some(path.trim().to_string());
        }
    }

    /// Everything wrong with the required fields, in display order.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let url = self.jira_url.trim().trim_end_matches('/');
        if url.is_empty() {
            problems.push("jira_url is empty".to_string());
        } else if !(url.starts_with("https://") || url.starts_with("http://")) {
            problems.push(format!("jira_url must start with http:// or https:// (got {})", url));
        }
        if self.projects.iter().all(|p| p.trim().is_empty()) {
            problems.push("no projects configured".to_string());
        }
        problems
    }

    /// Check required fields and normalize the Jira URL.
    pub fn validate(&mut self) -> Result<()> {
        if let Some(problem) = self.problems().into_iter().next() {
            return Err(UserError::invalid_config(problem).into());
        }
        self.jira_url = self.jira_url.trim().trim_end_matches('/').to_string();
        self.projects.retain(|p| !p.trim().is_empty());
        Ok(())
    }
}

pub fn config_dir() -> Result<PathBuf> {
    let dir = directories::ProjectDirs::from("", "", "branchboard")
        .context("Could not determine config directory")?
        .config_dir()
        .to_path_buf();
    Ok(dir)
}

/// Directory for UI state and the board log file.
pub fn state_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "branchboard")
        .context("Could not determine state directory")?;
    Ok(dirs
        .state_dir()
        .unwrap_or_else(|| dirs.data_local_dir())
        .to_path_buf())
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn load(path: Option<&Path>) -> Result<Config> {
    load_with_env(path, &|key| std::env::var(key).ok())
}

/// Load the config file (if any), overlay the environment, and validate.
pub fn load_with_env(path: Option<&Path>, env: &impl Fn(&str) -> Option<String>) -> Result<Config> {
    let path = resolve_path(path)?;
    let mut config = read_with_env(&path, env)?;
    config.validate()?;
    Ok(config)
}

fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p.to_path_buf()),
        None => default_config_path(),
    }
}

fn env_only(env: &impl Fn(&str) -> Option<String>) -> bool {
    env(ENV_JIRA_URL).is_some() && env(ENV_PROJECTS).is_some()
}

/// File (or env-only defaults) with the overlay applied, not yet validated.
fn read_with_env(path: &Path, env: &impl Fn(&str) -> Option<String>) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?
    } else if env_only(env) {
        tracing::debug!("No config file, using environment only");
        Config::default()
    } else {
        return Err(UserError::not_configured(path).into());
    };

    config.apply_env_overlay(env);
    Ok(config)
}

/// One line of `config doctor` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    pub ok: bool,
    pub message: String,
}

impl Diagnosis {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn problem(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

pub fn doctor(path: Option<&Path>) -> Result<Vec<Diagnosis>> {
    Ok(doctor_with_env(&resolve_path(path)?, &|key| std::env::var(key).ok()))
}

/// Check the config file and effective settings without stopping at the first problem.
pub fn doctor_with_env(path: &Path, env: &impl Fn(&str) -> Option<String>) -> Vec<Diagnosis> {
    let mut report = Vec::new();
    if path.exists() {
        report.push(Diagnosis::ok(format!("Config file found at {}", path.display())));
    } else if env_only(env) {
        report.push(Diagnosis::ok(format!(
            "No config file, using {} and {}",
            ENV_JIRA_URL, ENV_PROJECTS
        )));
    } else {
        report.push(Diagnosis::problem(format!(
            "No config file at {} (run `branchboard init`)",
            path.display()
        )));
        return report;
    }

    let config = match read_with_env(path, env) {
        Ok(config) => config,
        Err(e) => {
            report.push(Diagnosis::problem(format!("{:#}", e)));
            return report;
        }
    };

    let problems = config.problems();
    if problems.is_empty() {
        report.push(Diagnosis::ok(format!("Jira URL: {}", config.jira_url.trim())));
        report.push(Diagnosis::ok(format!("Projects: {}", config.projects.join(", "))));
    }
    report.extend(problems.into_iter().map(Diagnosis::problem));
    report.push(Diagnosis::ok(format!(
        "Default scope: {}",
        config.default_scope.config_key()
    )));
    report
}

/// Email and API token for basic auth.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Git email (domain-mapped) plus token from the environment or 1Password.
pub fn resolve_credentials(config: &Config) -> Result<Credentials> {
    let email = git_email().ok_or_else(UserError::missing_git_email)?;
    let email = apply_email_domain_map(&email, &config.email_domain_map);

    let token = resolve_token(
        std::env::var(ENV_API_TOKEN).ok(),
        config.op_token_path.as_deref(),
        read_op_secret,
    )
    .ok_or_else(UserError::missing_token)?;

    Ok(Credentials { email, token })
}

fn git_email() -> Option<String> {
    let output = Command::new("git")
        .args(["config", "user.email"])
        .output()
        .ok()?;
    let email = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (output.status.success() && !email.is_empty()).then_some(email)
}

fn read_op_secret(reference: &str) -> Option<String> {
    match Command::new("op").args(["read", reference]).output() {
        Ok(out) if out.status.success() => {
            let secret = String::from_utf8_lossy(&out.stdout).trim().to_string();
            (!secret.is_empty()).then_some(secret)
        }
        Ok(out) => {
            tracing::warn!(
                "op read failed for {}: {}",
                reference,
                String::from_utf8_lossy(&out.stderr).trim()
            );
            None
        }
        Err(e) => {
            tracing::warn!("Could not run op: {}", e);
            None
        }
    }
}

/// Env token first, then the 1Password reference.
pub fn resolve_token(
    env_token: Option<String>,
    op_path: Option<&str>,
    read_secret: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| op_path.filter(|p| !p.trim().is_empty()).and_then(read_secret))
}

/// Replace the first occurrence of each mapped domain, in key order.
pub fn apply_email_domain_map(email: &str, map: &BTreeMap<String, String>) -> String {
    map.iter()
        .fold(email.to_string(), |acc, (from, to)| acc.replacen(from.as_str(), to, 1))
}

pub fn init_wizard(path: Option<&Path>) -> Result<()> {
    util::require_tty()?;

    println!("branchboard setup");
    println!("=================\n");

    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    let existing = if config_path.exists() {
        if !util::confirm(
            &format!("Config already exists at {}. Overwrite?", config_path.display()),
            false,
        )? {
            println!("Aborted.");
            return Ok(());
        }
        std::fs::read_to_string(&config_path)
            .ok()
            .and_then(|c| toml::from_str::<Config>(&c).ok())
    } else {
        None
    };
    let base = existing.unwrap_or_default();

    let jira_url = util::prompt(
        "Jira URL (e.g. https://acme.atlassian.net)",
        Some(base.jira_url.as_str()),
    )?;
    let projects = util::prompt(
        "Project keys, comma-separated",
        Some(base.projects.join(",").as_str()),
    )?;
    let scope = util::prompt(
        "Default scope (assigned_or_reported, assigned, reported, unassigned)",
        Some(base.default_scope.config_key()),
    )?;
    let op_token_path = util::prompt(
        "1Password reference for the API token (optional)",
        base.op_token_path.as_deref(),
    )?;
    let enable_worktrees = util::confirm("Use git worktrees for interactive mode?", base.enable_worktrees)?;
    let enable_assistant = util::confirm("Start a coding assistant session after branching?", base.enable_assistant)?;

    let mut config = Config {
        projects: projects
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect(),
        default_scope: Scope::from_config_key(&scope).unwrap_or_default(),
        jira_url,
        enable_assistant,
        enable_worktrees,
        op_token_path: Some(op_token_path).filter(|p| !p.is_empty()),
        ..base
    };
    config.validate()?;

    save(&config, &config_path)?;

    println!("\nConfig saved to {}", config_path.display());
    println!("Run `branchboard` to open the board.");

    Ok(())
}

/// Write the config with owner-only permissions.
pub fn save(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    // Set file permissions to 0600 (Unix only)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}
