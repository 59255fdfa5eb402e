//! iNotes CLI - Command-line front end for the sticky-notes store

use anyhow::Context;
use clap::{Parser, Subcommand};
use inotes::config::{self, AppConfig, AppPaths};
use inotes::output::{OutputMode, emit_error, emit_success};
use inotes::ui::{self, Icons};
use inotes::{Database, NewNote, NoteKey, NotePatch, NoteRepository, WindowConfigRepository};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "inotes")]
#[command(version)]
#[command(about = "Sticky notes from the command line")]
#[command(long_about = r#"
iNotes keeps sticky notes and window layouts in a local SQLite file.

Example usage:
  inotes add --title "Groceries" --content "milk, eggs" --pin
  inotes list
  inotes search milk
  inotes edit 3 --unpin
  inotes window set main 400 600 --x 20 --y 40
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Create or upgrade the database schema
    Migrate,

    /// Show resolved data, database, image and log paths
    Paths,

    /// Create a note
    Add {
        #[arg(short, long)]
        title: String,

        #[arg(long, default_value = "")]
        content: String,

        #[arg(long)]
        markdown: Option<String>,

        /// Hex color, e.g. #ffd54f
        #[arg(long)]
        color: Option<String>,

        /// Pin the note to the top of the list
        #[arg(long)]
        pin: bool,

        /// Use this uid instead of generating one
        #[arg(long)]
        uid: Option<String>,
    },

    /// List notes, pinned first
    List,

    /// Find notes whose title or content contains a keyword
    Search {
        keyword: String,
    },

    /// Show one note by id or uid
    Show {
        note: NoteKey,
    },

    /// Change fields of a note; omitted fields are left as they are
    Edit {
        note: NoteKey,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,

        #[arg(long)]
        markdown: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long, conflicts_with = "unpin")]
        pin: bool,

        #[arg(long)]
        unpin: bool,
    },

    /// Delete a note and its editor window layout
    Rm {
        note: NoteKey,
    },

    /// Saved window layouts
    Window {
        #[command(subcommand)]
        command: WindowCommands,
    },
}

#[derive(Subcommand)]
enum WindowCommands {
    /// Show the saved layout of a window
    Get { window_id: String },

    /// List all saved layouts
    List,

    /// Save a window layout
    Set {
        window_id: String,
        width: u32,
        height: u32,

        #[arg(long, allow_negative_numbers = true, requires = "y")]
        x: Option<i32>,

        #[arg(long, allow_negative_numbers = true, requires = "x")]
        y: Option<i32>,
    },

    /// Forget a window layout
    Rm { window_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mode = if cli.json { OutputMode::Json } else { OutputMode::Human };
    let command_name = command_name(&cli.command);

    if let Err(e) = run(cli, mode).await {
        if mode.is_human() {
            ui::error(&format!("{:#}", e));
        } else {
            emit_error(mode, command_name, &format!("{:#}", e));
        }
        std::process::exit(1);
    }
    Ok(())
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init { .. } => "init",
        Commands::Migrate => "migrate",
        Commands::Paths => "paths",
        Commands::Add { .. } => "add",
        Commands::List => "list",
        Commands::Search { .. } => "search",
        Commands::Show { .. } => "show",
        Commands::Edit { .. } => "edit",
        Commands::Rm { .. } => "rm",
        Commands::Window { .. } => "window",
    }
}

async fn run(cli: Cli, mode: OutputMode) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);

    if let Commands::Init { force } = cli.command {
        config::write_config(&config_path, &AppConfig::default(), force)?;
        if mode.is_human() {
            ui::success(&format!("Wrote {}", config_path.display()));
        }
        return emit_success(mode, "init", serde_json::json!({ "path": config_path }));
    }

    let app_config = config::load_config(Some(&config_path))?.unwrap_or_default();
    let mut paths = AppPaths::resolve(&app_config);
    if let Some(database) = cli.database {
        paths.database = database;
    }

    if let Commands::Paths = cli.command {
        if mode.is_human() {
            ui::status(Icons::FOLDER, "Data", &paths.data_dir.display().to_string());
            ui::status(Icons::DATABASE, "Database", &paths.database.display().to_string());
            ui::status(Icons::FOLDER, "Images", &paths.images.display().to_string());
            ui::status(Icons::NOTE, "Error log", &paths.error_log.display().to_string());
        }
        return emit_success(mode, "paths", &paths);
    }

    // Startup halts here if the store cannot be made ready
    let db = Database::new(&paths.database);
    let report = db
        .initialize()
        .await
        .with_context(|| format!("failed to open note store at {}", paths.database.display()))?;

    let notes = NoteRepository::new(db.clone());
    let windows = WindowConfigRepository::new(db);

    match cli.command {
        Commands::Init { .. } | Commands::Paths => unreachable!("handled above"),

        Commands::Migrate => {
            if mode.is_human() {
                ui::header("Database migration");
                ui::summary_row("Database:", &paths.database.display().to_string());
                ui::summary_row("Result:", &report.to_string());
                ui::summary_row("Notes:", &notes.count().await?.to_string());
            }
            emit_success(mode, "migrate", &report)?;
        }

        Commands::Add { title, content, markdown, color, pin, uid } => {
            let note = NewNote {
                uid,
                title,
                content,
                markdown,
                color,
                is_pinned: Some(pin),
            };
            let id = notes.create(note).await?;
            let created = notes
                .get_by_id(id)
                .await?
                .context("note vanished right after creation")?;
            if mode.is_human() {
                ui::success(&format!("Created note #{} ({})", created.id, created.uid));
            }
            emit_success(mode, "add", &created)?;
        }

        Commands::List => {
            let all = notes.list().await?;
            if mode.is_human() {
                print_notes(&all, "No notes yet.");
            }
            emit_success(mode, "list", &all)?;
        }

        Commands::Search { keyword } => {
            let found = notes.search(&keyword).await?;
            if mode.is_human() {
                ui::status(Icons::SEARCH, "Search", &keyword);
                print_notes(&found, "No matching notes.");
            }
            emit_success(mode, "search", &found)?;
        }

        Commands::Show { note } => {
            let found = notes
                .get(note.clone())
                .await?
                .with_context(|| format!("note {} not found", note))?;
            if mode.is_human() {
                ui::note_heading(&found);
                println!("{}", ui::note_detail_table(&found));
                if !found.content.is_empty() {
                    ui::section("Content");
                    println!("{}", found.content);
                }
            }
            emit_success(mode, "show", &found)?;
        }

        Commands::Edit { note, title, content, markdown, color, pin, unpin } => {
            let patch = NotePatch {
                title,
                content,
                markdown,
                color,
                is_pinned: if pin {
                    Some(true)
                } else if unpin {
                    Some(false)
                } else {
                    None
                },
            };
            if !notes.update(note.clone(), patch).await? {
                anyhow::bail!("note {} not found", note);
            }
            let updated = notes.get(note.clone()).await?;
            if mode.is_human() {
                ui::success(&format!("Updated note {}", note));
            }
            emit_success(mode, "edit", &updated)?;
        }

        Commands::Rm { note } => {
            let removed = notes.delete(note.clone()).await?;
            if mode.is_human() {
                if removed {
                    ui::note_deleted(&format!("Deleted note {}", note));
                } else {
                    ui::warn(&format!("Note {} not found", note));
                }
            }
            emit_success(mode, "rm", serde_json::json!({ "removed": removed }))?;
        }

        Commands::Window { command } => run_window(command, &windows, &app_config, mode).await?,
    }

    Ok(())
}

async fn run_window(
    command: WindowCommands,
    windows: &WindowConfigRepository,
    app_config: &AppConfig,
    mode: OutputMode,
) -> anyhow::Result<()> {
    match command {
        WindowCommands::Get { window_id } => {
            let config = windows.get(&window_id).await?;
            let default_size = app_config.default_size_for(&window_id);
            if mode.is_human() {
                match (&config, default_size) {
                    (Some(config), _) => println!("{}", ui::window_config_table(config)),
                    (None, Some(size)) => ui::info(&format!("No saved layout for {}, opens at", window_id), &size.to_string()),
                    (None, None) => ui::info("No saved layout for", &window_id),
                }
            }
            emit_success(
                mode,
                "window.get",
                serde_json::json!({ "saved": config, "default_size": default_size }),
            )?;
        }

        WindowCommands::List => {
            let configs = windows.list().await?;
            if mode.is_human() {
                if configs.is_empty() {
                    println!("{}", ui::muted("No saved layouts."));
                }
                for config in &configs {
                    let position = config
                        .position()
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    ui::status(Icons::WINDOW, &config.window_id, &format!("{} at {}", config.size(), position));
                }
            }
            emit_success(mode, "window.list", &configs)?;
        }

        WindowCommands::Set { window_id, width, height, x, y } => {
            windows.save(&window_id, width, height, x, y).await?;
            if mode.is_human() {
                ui::success(&format!("Saved layout for {}", window_id));
            }
            emit_success(mode, "window.set", windows.get(&window_id).await?)?;
        }

        WindowCommands::Rm { window_id } => {
            let removed = windows.delete(&window_id).await?;
            if mode.is_human() {
                if removed {
                    ui::success(&format!("Forgot layout for {}", window_id));
                } else {
                    ui::info("No saved layout for", &window_id);
                }
            }
            emit_success(mode, "window.rm", serde_json::json!({ "removed": removed }))?;
        }
    }
    Ok(())
}

fn print_notes(notes: &[inotes::Note], empty: &str) {
    if notes.is_empty() {
        println!("{}", ui::muted(empty));
        return;
    }
    println!("{}", ui::notes_table(notes));
    let pinned = notes.iter().filter(|n| n.is_pinned).count();
    ui::summary_row("Total:", &format!("{} ({} pinned)", notes.len(), pinned));
}
