//! Sprintboard CLI
//!
//! Loads a project's planning board from the REST backend and runs single
//! planning operations against it.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use sprintboard_client::{ApiAuth, ApiClient, PlanningApi};
use sprintboard_core::models::{
    BacklogFilter, Config, Issue, IssueDraft, IssueType, Priority, SprintDraft,
};
use sprintboard_core::storage::{init_config_dir, init_data_dir, ConfigStorage};
use sprintboard_planner::{BoardEventType, NoticeLevel, Planner};
use std::fs;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "sprintboard")]
#[command(about = "Sprint and backlog planning board", long_about = None)]
struct Args {
    /// Project to operate on (defaults to the configured project)
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// Override the API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// API token
    #[arg(long, env = "SPRINTBOARD_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Log level (defaults to the configured level)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show sprints and backlog
    Board,
    /// Show the backlog, optionally filtered
    Backlog {
        #[arg(long)]
        search: Option<String>,
        #[arg(long = "type")]
        issue_type: Option<IssueType>,
        #[arg(long)]
        priority: Option<Priority>,
    },
    /// Move an issue to a sprint or to the backlog
    Move {
        issue: String,
        /// Sprint id, or "backlog"
        #[arg(long)]
        to: String,
    },
    #[command(subcommand)]
    Sprint(SprintCommand),
    #[command(subcommand)]
    Issue(IssueCommand),
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum SprintCommand {
    Start { id: String },
    Complete { id: String },
    /// Delete a sprint; its issues return to the backlog
    Delete { id: String },
    Create(SprintFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: SprintFields,
    },
}

#[derive(ClapArgs, Debug)]
struct SprintFields {
    #[arg(long)]
    name: String,
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,
    /// End date (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,
    /// Story point capacity
    #[arg(long)]
    capacity: Option<u32>,
    #[arg(long)]
    goal: Option<String>,
}

impl From<SprintFields> for SprintDraft {
    fn from(fields: SprintFields) -> Self {
        SprintDraft {
            name: fields.name,
            start_date: fields.start,
            end_date: fields.end,
            capacity: fields.capacity,
            goal: fields.goal,
        }
    }
}

#[derive(Subcommand, Debug)]
enum IssueCommand {
    Create {
        #[arg(long)]
        title: String,
        #[arg(long = "type", default_value = "TASK")]
        issue_type: IssueType,
        #[arg(long, default_value = "MEDIUM")]
        priority: Priority,
        #[arg(long)]
        points: Option<u32>,
        /// Sprint to create the issue in (backlog when omitted)
        #[arg(long)]
        sprint: Option<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the current configuration
    Show,
    /// Write a default configuration file
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Store the API token (from --token or SPRINTBOARD_TOKEN) in the OS keyring
    Login { username: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let storage = ConfigStorage::new(init_config_dir()?);
    let mut config = storage.load().context("Failed to load configuration")?;

    init_logging(args.log_level.as_deref().unwrap_or(&config.log_level))?;

    if let Command::Config(command) = args.command {
        return run_config(command, &storage, config, args.token);
    }

    if let Some(api_url) = args.api_url {
        config.api.base_url = api_url;
    }
    if args.token.is_some() {
        config.api.token = args.token;
    }

    let project_id = args
        .project
        .or_else(|| config.default_project.clone())
        .context("No project given; pass --project or set default_project in the config")?;

    let client = ApiClient::from_config(&config.api)?;
    tracing::info!("Using API at {}", client.base_url());

    let mut planner = Planner::new(Arc::new(client), config.planner.clone());

    // Notices are printed as they arrive; the printer ends when the planner is dropped
    let printer = {
        let mut rx = planner.events().subscribe();
        tokio::spawn(async move {
            while let Ok(event) = rx.recv().await {
                match event.event_type {
                    BoardEventType::Notice(notice) => match notice.level {
                        NoticeLevel::Success => println!("✓ {}", notice.message),
                        NoticeLevel::Error => eprintln!("✗ {}", notice.message),
                    },
                    other => tracing::debug!("Board event: {:?}", other),
                }
            }
        })
    };

    let result = run_command(&mut planner, &project_id, args.command).await;

    drop(planner);
    printer.await?;
    result
}

fn init_logging(log_level: &str) -> Result<()> {
    let data_dir = init_data_dir()?;
    let log_file_path = data_dir.join("sprintboard.log");

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    // Console gets warnings only, the file gets everything the filter allows
    use tracing_subscriber::fmt::writer::MakeWriterExt;
    let stderr_writer = std::io::stderr.with_max_level(tracing::Level::WARN);
    let file_writer = log_file.with_max_level(tracing::Level::DEBUG);

    tracing_subscriber::fmt()
        .with_writer(stderr_writer.and(file_writer))
        .with_env_filter(log_level)
        .with_ansi(false)
        .init();

    tracing::debug!("Log file: {}", log_file_path.display());
    Ok(())
}

fn run_config(
    command: ConfigCommand,
    storage: &ConfigStorage,
    mut config: Config,
    token: Option<String>,
) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            if config.api.token.is_some() {
                config.api.token = Some("***".to_string());
            }
            println!("# {}", storage.path().display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::Init { force } => {
            let path = storage.path();
            if !force && config != Config::default() {
                bail!(
                    "{} holds a customised config; use --force to overwrite",
                    path.display()
                );
            }
            storage.save(&Config::default())?;
            println!("Wrote default config to {}", path.display());
        }
        ConfigCommand::Login { username } => {
            let token = token.context("Pass --token or set SPRINTBOARD_TOKEN")?;
            ApiAuth::new(token).store_in_keyring(&username)?;
            config.api.username = Some(username.clone());
            storage.save(&config)?;
            println!("Stored token for {} in the keyring", username);
        }
    }
    Ok(())
}

async fn run_command<A: PlanningApi>(
    planner: &mut Planner<A>,
    project_id: &str,
    command: Command,
) -> Result<()> {
    if let Command::Backlog {
        search,
        issue_type,
        priority,
    } = &command
    {
        planner.set_filter(BacklogFilter {
            search: search.clone(),
            issue_type: *issue_type,
            priority: *priority,
        });
    }

    planner.load(project_id).await?;

    match command {
        Command::Board => print_board(planner),
        Command::Backlog { .. } => print_backlog(planner),
        Command::Move { issue, to } => {
            let target = planner
                .store()
                .resolve_droppable(&to)
                .with_context(|| format!("Unknown target '{}'", to))?;
            if planner.move_issue(&issue, &target).await?.is_none() {
                println!(
                    "{} is already in {}",
                    issue,
                    planner.store().container_label(&target)
                );
            }
        }
        Command::Sprint(SprintCommand::Start { id }) => planner.start_sprint(&id).await?,
        Command::Sprint(SprintCommand::Complete { id }) => planner.complete_sprint(&id).await?,
        Command::Sprint(SprintCommand::Delete { id }) => planner.delete_sprint(&id).await?,
        Command::Sprint(SprintCommand::Create(fields)) => {
            let sprint = planner.create_sprint(fields.into()).await?;
            println!("{}", sprint.id);
        }
        Command::Sprint(SprintCommand::Update { id, fields }) => {
            planner.update_sprint(&id, fields.into()).await?;
        }
        Command::Issue(IssueCommand::Create {
            title,
            issue_type,
            priority,
            points,
            sprint,
        }) => {
            let mut draft = IssueDraft::new(title, issue_type, priority);
            draft.story_points = points;
            draft.sprint_id = sprint;
            let issue = planner.create_issue(draft).await?;
            println!("{}", issue.key);
        }
        Command::Issue(IssueCommand::Delete { id }) => planner.delete_issue(&id).await?,
        Command::Config(_) => bail!("config commands do not need a board"),
    }
    Ok(())
}

fn print_issue(issue: &Issue) {
    let points = issue
        .story_points
        .map(|p| format!(" ({} pts)", p))
        .unwrap_or_default();
    println!(
        "  {:<10} {:<8} {:<8} {}{}",
        issue.key,
        issue.issue_type.as_str(),
        issue.priority.as_str(),
        issue.title,
        points
    );
}

fn print_board<A: PlanningApi>(planner: &Planner<A>) {
    let store = planner.store();
    for sprint in store.sprints() {
        let capacity = store
            .sprint_summary(&sprint.id)
            .map(|s| match s.capacity {
                Some(c) if s.over_capacity => format!("{}/{} pts, over capacity", s.story_points, c),
                Some(c) => format!("{}/{} pts", s.story_points, c),
                None => format!("{} pts", s.story_points),
            })
            .unwrap_or_default();
        println!(
            "{} [{}] {} to {}, {} days ({}) id={}",
            sprint.name,
            sprint.status.as_str(),
            sprint.start_date,
            sprint.end_date,
            sprint.duration_days(),
            capacity,
            sprint.id
        );
        if let Some(goal) = &sprint.goal {
            println!("  Goal: {}", goal);
        }
        for issue in store.sprint_issues(&sprint.id) {
            print_issue(issue);
        }
        println!();
    }
    print_backlog(planner);
}

fn print_backlog<A: PlanningApi>(planner: &Planner<A>) {
    let backlog = planner.visible_backlog();
    println!("Backlog ({} issues)", backlog.len());
    for issue in backlog {
        print_issue(issue);
    }
}
