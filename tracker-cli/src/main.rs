//! tracker: command-line client for the project tracking service.
//!
//! # Usage
//!
//! ```bash
//! # Exchange a login for an API token
//! tracker token --login ada@example.com --password secret
//!
//! # List projects visible to the token
//! TRACKER_TOKEN=abc123 tracker projects
//!
//! # Bugs labelled "ui" in project 7, as JSON
//! tracker --json stories 7 --type bug --label ui
//!
//! # Create a story
//! tracker add-story 7 "Crash on save" --type bug --description "Null deref"
//!
//! # Comment on a story
//! tracker note 7 101 "Fixed in 1.2" --author Ada
//! ```

use anyhow::{Context, Result, bail};
use bytes::Bytes;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracker_core::{
    ClientConfig, HttpTransport, IterationGroup, Labels, Story, StoryFilter, StoryState, StoryType,
    TrackerClient,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "tracker")]
#[command(author = "Tracker Client Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Project tracker command-line client")]
struct Cli {
    /// Config file (default: ~/.config/tracker/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Exchange a login and password for the account's API token
    Token {
        #[arg(short, long)]
        login: String,
        #[arg(short, long)]
        password: String,
    },

    /// List projects
    Projects,

    /// List stories of a project
    Stories {
        /// Project id
        project: i64,
        /// Only stories of this type
        #[arg(short = 't', long = "type")]
        story_type: Option<StoryType>,
        /// Only stories carrying one of these labels
        #[arg(short, long)]
        label: Vec<String>,
        /// Only stories in one of these states
        #[arg(short, long)]
        state: Vec<StoryState>,
        /// Only stories created since this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
        /// Also load each story's tasks
        #[arg(long)]
        tasks: bool,
    },

    /// Create a story
    #[command(name = "add-story")]
    AddStory {
        /// Project id
        project: i64,
        /// Story title
        name: String,
        #[arg(short = 't', long = "type", default_value = "feature")]
        story_type: StoryType,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Comma-separated labels
        #[arg(short, long)]
        labels: Option<String>,
        #[arg(short, long)]
        estimate: Option<i64>,
    },

    /// List iterations of a project
    Iterations {
        /// Project id
        project: i64,
        /// all, done, current or backlog
        #[arg(short, long, default_value = "all")]
        group: IterationGroup,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },

    /// List project members
    Memberships {
        /// Project id
        project: i64,
    },

    /// Add a note to a story
    Note {
        project: i64,
        story: i64,
        text: String,
        #[arg(short, long)]
        author: Option<String>,
    },

    /// Attach a file to a story
    Attach {
        project: i64,
        story: i64,
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = if cli.debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::WARN.into())
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();

    let config = load_config(cli.config.as_deref())?;
    let json = cli.json;

    match cli.command {
        Commands::Token { login, password } => cmd_token(config, &login, &password, json).await,
        Commands::Projects => cmd_projects(&connect(config)?, json).await,
        Commands::Stories {
            project,
            story_type,
            label,
            state,
            since,
            tasks,
        } => {
            let filter = story_filter(story_type, &label, &state, since.as_deref())?;
            cmd_stories(&connect(config)?, project, &filter, tasks, json).await
        }
        Commands::AddStory {
            project,
            name,
            story_type,
            description,
            labels,
            estimate,
        } => {
            let mut story = Story::new(story_type, name, description);
            if let Some(labels) = labels {
                story.labels = Labels::from_list(labels.split(',').map(str::trim));
            }
            story.estimate = estimate;
            cmd_add_story(&connect(config)?, project, &story, json).await
        }
        Commands::Iterations {
            project,
            group,
            limit,
            offset,
        } => cmd_iterations(&connect(config)?, project, group, limit, offset, json).await,
        Commands::Memberships { project } => cmd_memberships(&connect(config)?, project, json).await,
        Commands::Note {
            project,
            story,
            text,
            author,
        } => cmd_note(&connect(config)?, project, story, &text, author.as_deref(), json).await,
        Commands::Attach {
            project,
            story,
            file,
        } => cmd_attach(&connect(config)?, project, story, &file, json).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
    ClientConfig::load(path).context("Failed to load configuration")
}

fn connect(config: ClientConfig) -> Result<TrackerClient<HttpTransport>> {
    TrackerClient::<HttpTransport>::from_config(config)
        .context("No API token; run `tracker token` and set TRACKER_TOKEN or `token` in the config file")
}

fn story_filter(
    story_type: Option<StoryType>,
    labels: &[String],
    states: &[StoryState],
    since: Option<&str>,
) -> Result<StoryFilter> {
    let mut filter = StoryFilter::new();
    if let Some(story_type) = story_type {
        filter = filter.story_type(story_type);
    }
    if !labels.is_empty() {
        filter = filter.labels(labels);
    }
    if !states.is_empty() {
        filter = filter.states(states);
    }
    if let Some(since) = since {
        let date = NaiveDate::parse_from_str(since, "%Y-%m-%d")
            .with_context(|| format!("Invalid date {:?}, expected YYYY-MM-DD", since))?;
        filter = filter.created_since(date);
    }
    Ok(filter)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

async fn cmd_token(config: ClientConfig, login: &str, password: &str, json: bool) -> Result<()> {
    let client = TrackerClient::<HttpTransport>::authenticate(config, login, password)
        .await
        .with_context(|| format!("Failed to authenticate {}", login))?;
    if json {
        print_json(&serde_json::json!({ "token": client.token() }))
    } else {
        println!("{}", client.token());
        Ok(())
    }
}

async fn cmd_projects(client: &TrackerClient<HttpTransport>, json: bool) -> Result<()> {
    let projects = client.fetch_projects().await?;
    if json {
        return print_json(&projects);
    }

    for project in &projects {
        println!(
            "{:>8}  {}  (iterations of {} weeks, velocity {})",
            project.id.unwrap_or_default(),
            or_dash(project.name.as_deref()),
            project.iteration_length.unwrap_or_default(),
            project.current_velocity.unwrap_or_default(),
        );
    }
    Ok(())
}

async fn cmd_stories(
    client: &TrackerClient<HttpTransport>,
    project: i64,
    filter: &StoryFilter,
    tasks: bool,
    json: bool,
) -> Result<()> {
    let filter = (!filter.is_empty()).then_some(filter);
    let mut stories = client.fetch_stories(project, filter).await?;
    if tasks {
        for story in stories.iter_mut() {
            client.load_tasks(story).await?;
        }
    }
    if json {
        return print_json(&stories);
    }

    for story in &stories {
        println!(
            "{:>10}  {:<8} {:<12} {}",
            story.id.unwrap_or_default(),
            story.kind(),
            story.state(),
            or_dash(story.name.as_deref()),
        );
        for task in story.tasks.iter().flatten() {
            let mark = if task.complete == Some(true) { "x" } else { " " };
            println!("            [{}] {}", mark, or_dash(task.description.as_deref()));
        }
    }
    println!("\n{} stories", stories.len());
    Ok(())
}

async fn cmd_add_story(
    client: &TrackerClient<HttpTransport>,
    project: i64,
    story: &Story,
    json: bool,
) -> Result<()> {
    let created = client.add_story(project, story).await?;
    if json {
        return print_json(&created);
    }
    println!("Created story {}", created.id.unwrap_or_default());
    if let Some(url) = &created.url {
        println!("  {}", url);
    }
    Ok(())
}

async fn cmd_iterations(
    client: &TrackerClient<HttpTransport>,
    project: i64,
    group: IterationGroup,
    limit: Option<u32>,
    offset: Option<u32>,
    json: bool,
) -> Result<()> {
    let iterations = client.fetch_iterations(project, group, limit, offset).await?;
    if json {
        return print_json(&iterations);
    }

    for iteration in &iterations {
        println!(
            "#{:<4} {} .. {}  {} stories, {} points",
            iteration.number.unwrap_or_default(),
            iteration.start.value().date(),
            iteration.finish.value().date(),
            iteration.stories.len(),
            iteration.velocity(),
        );
    }
    Ok(())
}

async fn cmd_memberships(
    client: &TrackerClient<HttpTransport>,
    project: i64,
    json: bool,
) -> Result<()> {
    let memberships = client.fetch_memberships(project).await?;
    if json {
        return print_json(&memberships);
    }

    for membership in &memberships {
        let person = membership.person.as_ref();
        println!(
            "{:<24} {:<32} {}",
            or_dash(person.and_then(|p| p.name.as_deref())),
            or_dash(person.and_then(|p| p.email.as_deref())),
            or_dash(membership.role.as_deref()),
        );
    }
    Ok(())
}

async fn cmd_note(
    client: &TrackerClient<HttpTransport>,
    project: i64,
    story: i64,
    text: &str,
    author: Option<&str>,
    json: bool,
) -> Result<()> {
    if text.trim().is_empty() {
        bail!("Note text is empty");
    }
    let note = client.add_note(project, story, text, author).await?;
    if json {
        return print_json(&note);
    }
    println!("Added note {} to story {}", note.id.unwrap_or_default(), story);
    Ok(())
}

async fn cmd_attach(
    client: &TrackerClient<HttpTransport>,
    project: i64,
    story: i64,
    file: &Path,
    json: bool,
) -> Result<()> {
    let data = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let attachment = client.add_attachment(project, story, Bytes::from(data)).await?;
    if json {
        return print_json(&attachment);
    }
    println!(
        "Attachment {}: {}",
        attachment.id.unwrap_or_default(),
        or_dash(attachment.status.as_deref())
    );
    Ok(())
}
