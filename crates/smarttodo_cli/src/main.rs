//! `smarttodo` command line front end.
//!
//! # Responsibility
//! - Compose the core at process start: configuration, logging, capability
//!   selection, database.
//! - Expose task, note, suggestion, category and stats operations as
//!   subcommands printing JSON to stdout.

use clap::{Args, Parser, Subcommand};
use serde_json::json;
use smarttodo_core::capability::select_capability;
use smarttodo_core::db::Connection;
use smarttodo_core::time::{format_epoch_ms, now_epoch_ms, parse_rfc3339_ms};
use smarttodo_core::{
    init_logging, open_db, CategorySelector, CategoryService, ContextNoteId, ContextService,
    CoreConfig, NewTask, NoteListQuery, SourceKind, SqliteCategoryRepository,
    SqliteContextNoteRepository, SqliteTaskRepository, SuggestionRequest, SuggestionService,
    SuggestionType, Task, TaskId, TaskListQuery, TaskService, TaskStatus, TextAnalysisCapability,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(
    name = "smarttodo",
    version,
    about = "Context-aware personal task manager"
)]
struct Cli {
    /// Path to the SQLite database (overrides SMARTTODO_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage tasks
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Manage context notes
    Note {
        #[command(subcommand)]
        action: NoteAction,
    },
    /// Ask for enrichment suggestions without changing anything
    Suggest {
        /// prioritization | categorization | deadline | enhancement
        #[arg(long = "type", default_value = "prioritization")]
        suggestion_type: String,
        /// Task ids to analyze (default: all open tasks)
        #[arg(long = "task")]
        tasks: Vec<TaskId>,
        /// Context note ids to analyze (default: 10 most recent)
        #[arg(long = "note")]
        notes: Vec<ContextNoteId>,
    },
    /// Show or manage categories (default: most used)
    Categories {
        #[command(subcommand)]
        action: Option<CategoryAction>,
    },
    /// Dashboard counters
    Stats,
}

#[derive(Subcommand)]
enum TaskAction {
    /// Create a task
    Add(AddTaskArgs),
    /// List tasks by priority
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Change a task's status
    Status { id: TaskId, status: String },
    /// Delete a task
    Delete { id: TaskId },
}

#[derive(Args)]
struct AddTaskArgs {
    title: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    priority: i64,
    /// RFC 3339 timestamp
    #[arg(long)]
    deadline: Option<String>,
    #[arg(long, default_value = "pending")]
    status: String,
    /// Existing category id
    #[arg(long, conflicts_with = "category")]
    category_id: Option<i64>,
    /// Category name (created when missing)
    #[arg(long)]
    category: Option<String>,
    /// Enrich with context-derived priority, description, category and deadline
    #[arg(long)]
    ai: bool,
}

#[derive(Subcommand)]
enum NoteAction {
    /// Store a context note
    Add {
        content: String,
        /// messaging | whatsapp | email | notes
        #[arg(long, default_value = "notes")]
        source: String,
    },
    /// List recent notes
    List {
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
}

#[derive(Subcommand)]
enum CategoryAction {
    /// Most used categories
    Popular {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// All categories
    List,
    /// Rename a category
    Rename { id: i64, name: String },
    /// Delete a category; its tasks become uncategorized
    Delete { id: i64 },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("event=cli_command module=cli status=error error={}", err);
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<String> {
    let mut config = CoreConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(log_dir) = config.log_dir.as_deref() {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("warning: file logging disabled: {err}");
        }
    }

    let capability = select_capability(&config.capability);
    let conn = open_db(&config.db_path)?;
    let output = dispatch(cli.command, &conn, capability.as_ref())?;
    Ok(serde_json::to_string_pretty(&output)?)
}

fn dispatch(
    command: Commands,
    conn: &Connection,
    capability: &dyn TextAnalysisCapability,
) -> CliResult<serde_json::Value> {
    let tasks = || -> CliResult<_> {
        Ok(TaskService::new(
            SqliteTaskRepository::try_new(conn)?,
            SqliteCategoryRepository::try_new(conn)?,
            SqliteContextNoteRepository::try_new(conn)?,
            capability,
        ))
    };

    let value = match command {
        Commands::Task { action } => match action {
            TaskAction::Add(args) => {
                let enhance = args.ai;
                task_json(&tasks()?.create_task(new_task(args)?, enhance)?)?
            }
            TaskAction::List {
                status,
                category,
                search,
                limit,
            } => {
                let query = TaskListQuery {
                    status: status.as_deref().map(parse_status).transpose()?,
                    category_id: category,
                    search,
                    limit,
                    offset: 0,
                };
                let listed = tasks()?.list_tasks(&query)?;
                let items = listed.iter().map(task_json).collect::<CliResult<Vec<_>>>()?;
                serde_json::Value::Array(items)
            }
            TaskAction::Status { id, status } => {
                let status = parse_status(&status)?;
                task_json(&tasks()?.update_task_status(id, status)?)?
            }
            TaskAction::Delete { id } => {
                tasks()?.delete_task(id)?;
                json!({ "deleted": id })
            }
        },
        Commands::Note { action } => {
            let notes =
                ContextService::new(SqliteContextNoteRepository::try_new(conn)?, capability);
            match action {
                NoteAction::Add { content, source } => {
                    let source_kind = source.parse::<SourceKind>()?;
                    serde_json::to_value(notes.create_context_note(content, source_kind)?)?
                }
                NoteAction::List { source, limit } => {
                    let query = NoteListQuery {
                        source_kind: source
                            .as_deref()
                            .map(str::parse::<SourceKind>)
                            .transpose()?,
                        limit,
                        offset: 0,
                    };
                    serde_json::to_value(notes.list_context_notes(&query)?)?
                }
            }
        }
        Commands::Suggest {
            suggestion_type,
            tasks: task_ids,
            notes: note_ids,
        } => {
            let service = SuggestionService::new(
                SqliteTaskRepository::try_new(conn)?,
                SqliteContextNoteRepository::try_new(conn)?,
                capability,
            );
            let request = SuggestionRequest {
                task_ids,
                context_note_ids: note_ids,
                suggestion_type: suggestion_type.parse::<SuggestionType>()?,
            };
            serde_json::to_value(service.get_suggestions(&request)?)?
        }
        Commands::Categories { action } => {
            let categories = CategoryService::new(SqliteCategoryRepository::try_new(conn)?);
            match action.unwrap_or(CategoryAction::Popular { limit: None }) {
                CategoryAction::Popular { limit } => {
                    serde_json::to_value(categories.popular_categories(limit)?)?
                }
                CategoryAction::List => serde_json::to_value(categories.list_categories()?)?,
                CategoryAction::Rename { id, name } => {
                    serde_json::to_value(categories.rename_category(id, &name)?)?
                }
                CategoryAction::Delete { id } => {
                    categories.delete_category(id)?;
                    json!({ "deleted": id })
                }
            }
        }
        Commands::Stats => serde_json::to_value(tasks()?.task_stats(now_epoch_ms())?)?,
    };
    Ok(value)
}

fn new_task(args: AddTaskArgs) -> CliResult<NewTask> {
    let mut input = NewTask::new(args.title)
        .with_description(args.description)
        .with_priority(args.priority)
        .with_status(parse_status(&args.status)?);
    if let Some(deadline) = args.deadline.as_deref() {
        let deadline = parse_rfc3339_ms(deadline)
            .ok_or_else(|| format!("invalid deadline `{deadline}`; expected RFC 3339"))?;
        input = input.with_deadline(deadline);
    }
    if let Some(id) = args.category_id {
        input = input.with_category(CategorySelector::Id(id));
    } else if let Some(name) = args.category {
        input = input.with_category(CategorySelector::Name(name));
    }
    Ok(input)
}

fn parse_status(value: &str) -> CliResult<TaskStatus> {
    Ok(value.parse::<TaskStatus>()?)
}

/// Task JSON with the deadline also rendered as RFC 3339 under `deadline_at`.
fn task_json(task: &Task) -> CliResult<serde_json::Value> {
    let mut value = serde_json::to_value(task)?;
    let deadline_at = task.deadline.and_then(format_epoch_ms);
    if let (Some(object), Some(deadline_at)) = (value.as_object_mut(), deadline_at) {
        object.insert("deadline_at".to_string(), json!(deadline_at));
    }
    Ok(value)
}
