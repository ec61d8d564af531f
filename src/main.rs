use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use eyre::Result;
use std::path::{Path, PathBuf};
use tasktracker::theme::is_known_theme;
use tracing_subscriber::fmt::MakeWriter;
use tasktracker::{
    Config, NewTask, Priority, StatusFilter, StorageBackend, THEMES, Task, TaskQuery, TaskTracker, TaskUpdate,
};

#[derive(Parser)]
#[command(name = "tasktracker")]
#[command(about = "Track short-lived tasks with locally persisted state")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the `.tasktracker` store (overrides config)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// Storage backend (overrides config)
    #[arg(short, long, value_enum)]
    backend: Option<BackendArg>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    File,
    Sqlite,
    Memory,
}

impl From<BackendArg> for StorageBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::File => StorageBackend::File,
            BackendArg::Sqlite => StorageBackend::Sqlite,
            BackendArg::Memory => StorageBackend::Memory,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        name: String,

        #[arg(short, long, default_value = "")]
        desc: String,

        /// low, medium or high (default medium)
        #[arg(short, long)]
        priority: Option<Priority>,
    },

    /// List tasks, newest first
    List {
        /// all, completed or pending
        #[arg(short, long, default_value = "all")]
        filter: StatusFilter,

        /// Case-insensitive text to look for in name or description
        #[arg(short = 'q', long, default_value = "")]
        search: String,
    },

    /// Show one task
    Show { id: i64 },

    /// Flip a task between completed and pending
    Toggle { id: i64 },

    /// Edit a task; omitted fields are left unchanged
    Edit {
        id: i64,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        desc: Option<String>,

        #[arg(short, long)]
        priority: Option<Priority>,
    },

    /// Delete a task
    Delete { id: i64 },

    /// Delete every task
    Clear,

    /// Show or change the colour theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
}

#[derive(Subcommand)]
enum ThemeAction {
    /// Print the current theme
    Show,

    /// Select a theme
    Set { name: String },

    /// List available themes
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let flag_level = match cli.verbose {
        0 => None,
        1 => Some(tracing::Level::INFO),
        2 => Some(tracing::Level::DEBUG),
        _ => Some(tracing::Level::TRACE),
    };

    // The config picks the log level, so its own loading logs at the flag
    // level (warn when no flag is given)
    let mut config = load_config(
        cli.config.as_deref(),
        flag_level.unwrap_or(tracing::Level::WARN),
        std::io::stderr,
    )?;
    if let Some(path) = cli.store_path {
        config.storage.path = path;
    }
    if let Some(backend) = cli.backend {
        config.storage.backend = backend.into();
    }

    // Setup tracing
    tracing_subscriber::fmt()
        .with_max_level(flag_level.unwrap_or_else(|| config.log_level()))
        .with_writer(std::io::stderr)
        .init();

    let mut tracker = TaskTracker::open(&config.storage);

    match cli.command {
        Commands::Add { name, desc, priority } => {
            let task = tracker.tasks.add_task(NewTask { name, desc, priority })?;
            println!("{} {}", "Task added successfully!".green(), format!("(id {})", task.id).dimmed());
        }
        Commands::List { filter, search } => {
            let query = TaskQuery::new(filter, search);
            let visible = tracker.tasks.visible_tasks(&query);

            println!("{} {}", "Your Tasks".bold(), format!("[{}]", filter).dimmed());
            if visible.is_empty() {
                println!("No tasks found.");
            }
            for task in visible {
                print_task(task);
            }
        }
        Commands::Show { id } => match tracker.tasks.get_task_by_id(id) {
            Some(task) => {
                print_task(task);
                println!("    created {}", task.created_at);
            }
            None => not_found(id),
        },
        Commands::Toggle { id } => match tracker.tasks.toggle_task_completion(id) {
            Some(task) if task.completed => println!("{} {}", "Completed".green(), task.name),
            Some(task) => println!("{} {}", "Reopened".yellow(), task.name),
            None => not_found(id),
        },
        Commands::Edit {
            id,
            name,
            desc,
            priority,
        } => {
            let update = TaskUpdate { name, desc, priority };
            match tracker.tasks.update_task(id, update)? {
                Some(task) => {
                    println!("{}", "Task updated".green());
                    print_task(task);
                }
                None => not_found(id),
            }
        }
        Commands::Delete { id } => match tracker.tasks.delete_task(id) {
            Some(task) => println!("{} {}", "Deleted".red(), task.name),
            None => not_found(id),
        },
        Commands::Clear => {
            let count = tracker.tasks.clear_tasks();
            println!("Cleared {} task(s)", count);
        }
        Commands::Theme { action } => match action.unwrap_or(ThemeAction::Show) {
            ThemeAction::Show => println!("{}", tracker.theme.theme()),
            ThemeAction::Set { name } => {
                if !is_known_theme(&name) {
                    eprintln!("{} '{}' is not a known theme", "warning:".yellow(), name);
                }
                tracker.theme.set_theme(name);
                println!("Theme set to {}", tracker.theme.theme().bold());
            }
            ThemeAction::List => {
                for theme in THEMES {
                    if *theme == tracker.theme.theme() {
                        println!("* {}", theme.bold());
                    } else {
                        println!("  {}", theme);
                    }
                }
            }
        },
    }

    Ok(())
}

/// Load the config with its log lines sent to `writer` at `level`
fn load_config<W>(path: Option<&Path>, level: tracing::Level, writer: W) -> Result<Config>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let bootstrap = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(writer)
        .finish();
    tracing::subscriber::with_default(bootstrap, || Config::load(path))
}

fn print_task(task: &Task) {
    let mark = if task.completed { "[x]".green() } else { "[ ]".normal() };
    let name = if task.completed {
        task.name.strikethrough().dimmed()
    } else {
        task.name.bold()
    };
    let priority = match task.priority {
        Priority::High => task.priority.as_str().red(),
        Priority::Medium => task.priority.as_str().yellow(),
        Priority::Low => task.priority.as_str().green(),
    };

    println!("{} {} {} {}", mark, task.id.to_string().dimmed(), name, priority);
    if !task.desc.is_empty() {
        println!("    {}", task.desc);
    }
    println!("    {}", format!("updated {}", task.updated_at).dimmed());
}

fn not_found(id: i64) {
    println!("{} no task with id {}", "note:".yellow(), id);
}
