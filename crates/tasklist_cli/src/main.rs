//! Command-line host for the task list.
//!
//! # Responsibility
//! - Resolve configuration (database path, logging) from flags and env.
//! - Drive `TaskListViewModel` and render `visible()` after each change.
//! - Own host policy such as confirming destructive bulk actions.

use clap::{Parser, Subcommand};
use log::error;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tasklist_core::{
    default_log_level, init_logging, Record, RecordFilter, RecordId, SqliteRecordStore,
    TaskListViewModel,
};

#[derive(Parser)]
#[command(name = "tasklist", version, about = "Local task list backed by SQLite")]
struct Cli {
    /// Database file
    #[arg(long, env = "TASKLIST_DB", default_value = "tasklist.sqlite3")]
    db: PathBuf,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "TASKLIST_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, env = "TASKLIST_LOG_LEVEL")]
    log_level: Option<String>,

    /// Print records as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List tasks
    List {
        #[arg(short, long, default_value_t = RecordFilter::All)]
        filter: RecordFilter,
    },
    /// Add a task
    Add { text: String },
    /// Replace the text of a task
    Edit { id: RecordId, text: String },
    /// Flip a task between active and completed
    Toggle { id: RecordId },
    /// Delete a task
    Rm { id: RecordId },
    /// Delete every completed task
    ClearCompleted {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Show active/completed totals
    Stats,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_ref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("warning: {err}");
        }
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let store = SqliteRecordStore::open(&cli.db)?;
    let mut view_model = TaskListViewModel::load(store)?;

    // On error the view model (and its connection) is dropped, which
    // releases the database just like `close`.
    execute(&mut view_model, cli.command, cli.json)?;

    view_model.into_store().close()?;
    Ok(())
}

fn execute(
    view_model: &mut TaskListViewModel<SqliteRecordStore>,
    command: Command,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    match command {
        Command::List { filter } => {
            view_model.set_filter(filter);
        }
        Command::Add { text } => {
            let record = view_model.add(&text)?;
            println!("added #{}", record.id);
        }
        Command::Edit { id, text } => {
            view_model.edit(id, &text)?;
            println!("updated #{id}");
        }
        Command::Toggle { id } => {
            view_model.toggle(id)?;
            println!("toggled #{id}");
        }
        Command::Rm { id } => {
            view_model.remove(id)?;
            println!("removed #{id}");
        }
        Command::ClearCompleted { yes } => {
            if !view_model.has_completed() {
                println!("nothing to clear");
                return Ok(());
            }
            if !yes {
                return Err("clear-completed removes all completed tasks; rerun with --yes".into());
            }
            let removed = view_model.clear_completed()?;
            println!("removed {removed} completed");
        }
        Command::Stats => {
            let counts = view_model.counts();
            if json {
                println!("{}", serde_json::to_string_pretty(&counts)?);
            } else {
                println!(
                    "{} total, {} active, {} completed",
                    counts.total, counts.active, counts.completed
                );
            }
            return Ok(());
        }
    }

    render(&view_model.visible(), json)
}

fn render(records: &[Record], json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No tasks yet.");
        return Ok(());
    }

    for record in records {
        let mark = if record.done { 'x' } else { ' ' };
        println!("[{mark}] {:>4}  {}", record.id, record.text);
    }
    Ok(())
}
