use anyhow::{Context, Result};
use branchboard::config::{self, prefs::PrefsStore};
use branchboard::errors::UserError;
use branchboard::integrations::jira::JiraClient;
use branchboard::tui::{self, App, Board};
use branchboard::workflow::{self, CreateOptions};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "branchboard")]
#[command(about = "Personal Jira Kanban board that turns tickets into branches")]
#[command(version)]
struct Args {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Open the board (default)
    Board,
    /// Interactive setup
    Init,
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Create a ticket from the current change and rename the branch after it
    Create {
        /// Project key, when several are configured
        #[arg(long, short = 'P')]
        project: Option<String>,
        /// Jira issue type
        #[arg(long = "type", short = 't', default_value = workflow::create::DEFAULT_ISSUE_TYPE)]
        issue_type: String,
        /// Show what would be created without calling Jira
        #[arg(long)]
        dry_run: bool,
        /// Type the title and description yourself
        #[arg(long)]
        no_assistant: bool,
        /// Create the ticket without renaming the current branch
        #[arg(long)]
        no_rename: bool,
        /// Assistant model for this run
        #[arg(long, short)]
        model: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the config file location
    Path,
    /// Print the effective config
    Show,
    /// Check the config for problems
    Doctor,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(err) = run(args).await {
        match err.downcast_ref::<UserError>() {
            Some(user) => eprintln!("{}", user.render()),
            None => eprintln!("Error: {:#}", err),
        }
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let command = args.command.unwrap_or(Cmd::Board);
    let on_board = matches!(command, Cmd::Board);
    init_logging(args.verbose, on_board)?;

    match command {
        Cmd::Init => config::init_wizard(args.config.as_deref()),
        Cmd::Config { action } => show_config(action, args.config.as_deref()),
        Cmd::Create {
            project,
            issue_type,
            dry_run,
            no_assistant,
            no_rename,
            model,
        } => {
            let config = config::load(args.config.as_deref())?;
            let opts = CreateOptions {
                project,
                issue_type,
                dry_run,
                no_assistant,
                no_rename,
                model,
            };
            workflow::create::run(&config, &opts).await
        }
        Cmd::Board => run_board(args.config.as_deref()).await,
    }
}

async fn run_board(config_path: Option<&std::path::Path>) -> Result<()> {
    let config = config::load(config_path)?;
    let creds = config::resolve_credentials(&config)?;

    let client = JiraClient::new(&config.jira_url, creds.email, creds.token, config.projects.clone());
    let browse_base = client.base_url().to_string();

    let prefs_store = PrefsStore::from_env();
    let prefs = prefs_store.load();
    let board = Board::new(config.projects.clone(), config.default_scope, &prefs);
    let app = App::new(board, Arc::new(client), browse_base);

    let launch = tui::run(app, &prefs_store).await?;

    match launch {
        Some(request) => workflow::activate(&config, &request).map(|_| ()),
        None => Ok(()),
    }
}

fn show_config(action: ConfigAction, path: Option<&std::path::Path>) -> Result<()> {
    match action {
        ConfigAction::Path => {
            let path = match path {
                Some(p) => p.to_path_buf(),
                None => config::default_config_path()?,
            };
            println!("{}", path.display());
        }
        ConfigAction::Show => {
            // The token lives outside the config struct and is never printed
            let config = config::load(path)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Doctor => {
            let report = config::doctor(path)?;
            for line in &report {
                println!("{} {}", if line.ok { "ok" } else { "!!" }, line.message);
            }
            let problems = report.iter().filter(|d| !d.ok).count();
            if problems > 0 {
                return Err(UserError::invalid_config(format!("{} problem(s) found", problems)).into());
            }
            println!("No problems found.");
        }
    }
    Ok(())
}

/// Board sessions log to a file; the terminal belongs to the TUI.
fn init_logging(verbose: bool, to_file: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("branchboard={}", level)))?;

    if to_file {
        let dir = config::state_dir()?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join("branchboard.log");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}
