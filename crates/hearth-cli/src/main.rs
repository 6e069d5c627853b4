//! Hearth CLI - run the household task board server and work with it from a terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use hearth_client::{
    AuthorFilter, DragController, DragLocation, DropOutcome, EventBridge, FilterSet,
    HttpTaskRemote, LocalListState, Session, SseBridge, TaskRemote,
};
use hearth_core::config::CONFIG_FILE;
use hearth_core::{
    HearthConfig, NewTask, RealtimeEvent, ShoppingItem, Task, TaskCursor, TaskId, TaskPage, TaskType,
};
use hearth_storage::Database;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "hearth")]
#[command(about = "Hearth - Shared household task board", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Server URL (defaults to the configured bind address)
    #[arg(long, global = true)]
    server: Option<String>,

    /// User name sent with every request
    #[arg(short, long, global = true)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and create the database
    Init {
        /// Directory to initialize (defaults to current directory)
        path: Option<PathBuf>,
    },

    /// Run the HTTP API
    Serve,

    /// Work with tasks on the board
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Show the shopping list
    Shopping {
        /// Order by how often each item is bought
        #[arg(short, long)]
        by_weight: bool,
    },

    /// Print realtime events as they arrive
    Watch,
}

#[derive(Subcommand)]
enum TaskCommands {
    /// List tasks, highest position first
    List {
        /// Only tasks you authored
        #[arg(short, long)]
        mine: bool,

        /// Only tasks whose title carries this hashtag
        #[arg(short, long)]
        tag: Option<String>,

        /// Only tasks of this type (task, note, idea, shopping)
        #[arg(short = 'T', long = "type")]
        task_type: Option<TaskType>,
    },

    /// Add a task at the top of the board
    Add {
        /// Task title
        title: String,

        /// Task description
        #[arg(short, long)]
        description: Option<String>,

        /// Task type (task, note, idea, shopping)
        #[arg(short = 'T', long = "type", default_value = "task")]
        task_type: TaskType,
    },

    /// Move a task to another index of the board, as a drag would
    Move {
        /// Task ID
        id: String,

        /// Destination index (0 is the top)
        to: usize,
    },

    /// Mark a task as done
    Done {
        /// Task ID
        id: String,

        /// Mark as not done instead
        #[arg(long)]
        undo: bool,
    },

    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Init { path } => {
            let root = path.unwrap_or_else(|| PathBuf::from("."));
            let config_path = root.join(CONFIG_FILE);
            if config_path.exists() {
                println!(
                    "{}",
                    format!("Configuration already exists at {}", config_path.display()).yellow()
                );
            } else {
                HearthConfig::write_default(&config_path)?;
            }

            let config = HearthConfig::load_or_default(&config_path)?;
            let db_path = root.join(&config.server.database_path);
            if let Some(parent) = db_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let db = Database::open(&db_path).await?;
            db.init_schema().await?;

            println!("{}", "✓ Initialized hearth".green().bold());
            println!("  Config:   {}", config_path.display());
            println!("  Database: {}", db_path.display());
            println!(
                "  Secret:   set {} before running 'hearth serve'",
                config.auth.secret_env.bright_cyan()
            );
            Ok(())
        }

        Commands::Serve => {
            let config = load_config(&cli.config)?;
            info!("Starting hearth server");
            hearth_server::serve(&config).await
        }

        Commands::Tasks { command } => {
            let config = load_config(&cli.config)?;
            let remote = connect(&config, cli.server, cli.user)?;
            run_task_command(&config, &remote, command).await
        }

        Commands::Shopping { by_weight } => {
            let config = load_config(&cli.config)?;
            let remote = connect(&config, cli.server, cli.user)?;
            let path = if by_weight {
                "/api/shopping?order=weight"
            } else {
                "/api/shopping"
            };
            let response = remote.get(path).send().await?.error_for_status()?;
            let items: Vec<ShoppingItem> = response.json().await?;
            print_shopping(&items);
            Ok(())
        }

        Commands::Watch => {
            let config = load_config(&cli.config)?;
            let remote = connect(&config, cli.server, cli.user)?;
            let mut bridge = SseBridge::connect(&remote, &config.realtime.channel)
                .await
                .with_context(|| format!("Failed to subscribe to {}", config.realtime.channel))?;

            println!(
                "{} {}",
                "Watching".green().bold(),
                config.realtime.channel.bright_cyan()
            );
            while let Some(event) = bridge.next_event().await {
                print_event(&event);
            }
            println!("{}", "Stream closed".yellow());
            Ok(())
        }
    }
}

async fn run_task_command(
    config: &HearthConfig,
    remote: &HttpTaskRemote,
    command: TaskCommands,
) -> Result<()> {
    match command {
        TaskCommands::List {
            mine,
            tag,
            task_type,
        } => {
            let mut filters = FilterSet {
                author: if mine { AuthorFilter::Mine } else { AuthorFilter::All },
                task_type,
                ..FilterSet::default()
            };
            if let Some(tag) = tag {
                filters.toggle_hashtag(&tag);
            }

            let mut state = load_board(config, remote).await?;
            state.apply_filter(&filters, &session(remote));
            print_tasks(state.visible());
            Ok(())
        }

        TaskCommands::Add {
            title,
            description,
            task_type,
        } => {
            let task = remote
                .create_task(&NewTask {
                    title,
                    description,
                    task_type,
                })
                .await?;

            println!("{}", "✓ Created task".green().bold());
            println!("  ID:       {}", task.id.as_str().bright_cyan());
            println!("  Title:    {}", task.title);
            println!("  Position: {}", task.position);
            Ok(())
        }

        TaskCommands::Move { id, to } => {
            let id = TaskId::parse(&id)?;
            let mut state = load_board(config, remote).await?;
            state.apply_filter(&FilterSet::default(), &session(remote));

            let from = state
                .index_of(&id)
                .ok_or_else(|| anyhow::anyhow!("Task not found: {}", id))?;

            let mut drag = DragController::new();
            drag.begin(id.clone(), DragLocation::at(from));
            match drag.drop(&mut state, Some(DragLocation::at(to))) {
                DropOutcome::Moved {
                    index,
                    reposition: Some(reposition),
                } => {
                    let task = remote
                        .update_task_position(&reposition.id, reposition.position)
                        .await?;
                    println!(
                        "{} {} to index {} (position {})",
                        "✓ Moved".green().bold(),
                        task.id.as_str().bright_cyan(),
                        index,
                        task.position
                    );
                }
                DropOutcome::Moved { index, reposition: None } => {
                    println!("Task already sits at index {}", index);
                }
                DropOutcome::NoOp => {
                    println!("{}", "Nothing to move".yellow());
                }
            }
            Ok(())
        }

        TaskCommands::Done { id, undo } => {
            let id = TaskId::parse(&id)?;
            let task = remote.update_task_status(&id, !undo).await?;
            let label = if task.completed { "done" } else { "open" };
            println!(
                "{} {} is {}",
                "✓".green().bold(),
                task.id.as_str().bright_cyan(),
                label
            );
            Ok(())
        }

        TaskCommands::Delete { id } => {
            let id = TaskId::parse(&id)?;
            remote.delete_task(&id).await?;
            println!("{} {}", "✓ Deleted".green().bold(), id.as_str().bright_cyan());
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<HearthConfig> {
    HearthConfig::load_or_default(path)
        .with_context(|| format!("Failed to load {}", path.display()))
}

fn connect(
    config: &HearthConfig,
    server: Option<String>,
    user: Option<String>,
) -> Result<HttpTaskRemote> {
    let secret = config.api_secret()?;
    let base_url = server.unwrap_or_else(|| format!("http://{}", config.server.bind));
    let user = user
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| hearth_server::ANONYMOUS.to_string());
    Ok(HttpTaskRemote::new(base_url, secret, user))
}

fn session(remote: &HttpTaskRemote) -> Session {
    Session::signed_in(remote.user())
}

/// Fetch every page of the board into a fresh list state.
async fn load_board(config: &HearthConfig, remote: &HttpTaskRemote) -> Result<LocalListState> {
    let mut pages: Vec<TaskPage> = Vec::new();
    let mut cursor: Option<TaskCursor> = None;
    loop {
        let page = remote.fetch_page(config.list.page_size, cursor.as_ref()).await?;
        cursor = page.next_cursor.clone();
        pages.push(page);
        if cursor.is_none() {
            break;
        }
    }

    let mut state = LocalListState::new(config.list.low_water_mark);
    state.apply_fetched_pages(pages);
    Ok(state)
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("{}", "No tasks found".yellow());
        return;
    }

    println!(
        "{:<38} {:<6} {:<9} {:<12} {}",
        "ID".bold(),
        "DONE".bold(),
        "TYPE".bold(),
        "AUTHOR".bold(),
        "TITLE".bold()
    );
    println!("{}", "─".repeat(80));

    for task in tasks {
        let done = if task.completed {
            "✓".green()
        } else {
            "·".bright_black()
        };
        let title = if task.completed {
            task.title.bright_black()
        } else {
            task.title.normal()
        };
        println!(
            "{:<38} {:<6} {:<9} {:<12} {}",
            task.id.as_str().bright_cyan(),
            done,
            task.task_type.as_str(),
            task.author_id,
            title
        );
    }
}

fn print_shopping(items: &[ShoppingItem]) {
    if items.is_empty() {
        println!("{}", "Shopping list is empty".yellow());
        return;
    }

    for item in items {
        let mark = if item.checked {
            "[x]".green()
        } else {
            "[ ]".normal()
        };
        println!("{} {:>3} × {}", mark, item.quantity, item.name);
    }
}

fn print_event(event: &RealtimeEvent) {
    let name = event.name().bright_cyan();
    match event {
        RealtimeEvent::ShoppingItemAdded(p)
        | RealtimeEvent::ShoppingItemChecked(p)
        | RealtimeEvent::ShoppingItemDeleted(p)
        | RealtimeEvent::ShoppingItemQuantityUpdated(p)
        | RealtimeEvent::ShoppingItemsCleared(p) => match &p.shopping_item {
            Some(item) => println!("{} {} ({})", name, item.name, item.quantity),
            None => println!("{}", name),
        },
        _ => {
            if let Some(task) = event.task() {
                println!("{} {} {}", name, task.id.as_str().bright_black(), task.title);
            }
        }
    }
}
