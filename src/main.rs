//! Maintenance CLI for the exercise store. The only place in the crate
//! that prints, prompts, or exits.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;

use exstore::api::{ExerciseStore, RestoreOutcome, SaveOutcome};
use exstore::config;
use exstore::error::Result;
use exstore::model::{ExerciseType, ListFilter, Status};

#[derive(Parser)]
#[command(name = "exstore", version, about = "Versioned file-backed store for exercise documents")]
struct Cli {
    /// Store base directory (defaults to $EXERCISES_DIR or the platform data dir)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List indexed exercises, optionally filtered
    List {
        #[arg(long = "type")]
        kind: Option<ExerciseType>,
        #[arg(long)]
        status: Option<Status>,
        #[arg(long)]
        level: Option<String>,
    },
    /// Print one exercise version as JSON
    Get {
        kind: ExerciseType,
        slug: String,
        #[arg(long, default_value = "current")]
        version: String,
    },
    /// Validate and save a payload file as the next version
    Save {
        file: PathBuf,
        #[arg(long, default_value = "admin")]
        actor: String,
    },
    /// List version numbers for an exercise
    Versions { kind: ExerciseType, slug: String },
    /// Archive an exercise, or remove it entirely with --hard
    Delete {
        kind: ExerciseType,
        slug: String,
        #[arg(long)]
        hard: bool,
        /// Skip the confirmation prompt for --hard
        #[arg(long)]
        yes: bool,
    },
    /// Clone an old version as the new current version
    Restore {
        kind: ExerciseType,
        slug: String,
        version: String,
    },
    /// Repair current pointers and rebuild the index
    Doctor,
    /// Print the media directory for an exercise, creating it if needed
    MediaDir { kind: ExerciseType, slug: String },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let store = ExerciseStore::open(config::resolve_base_dir(cli.dir.clone()));

    match run(&cli.command, &store) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: &Command, store: &ExerciseStore) -> Result<ExitCode> {
    match command {
        Command::List { kind, status, level } => {
            let filter = ListFilter {
                kind: *kind,
                status: *status,
                level: level.clone(),
            };
            let filter = if filter.is_empty() { None } else { Some(filter) };
            let entries = store.list(filter.as_ref())?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }

        Command::Get { kind, slug, version } => match store.load(*kind, slug, version)? {
            Some(doc) => println!("{}", serde_json::to_string_pretty(&doc)?),
            None => return fail(format!("{}/{} version {} not found", kind, slug, version)),
        },

        Command::Save { file, actor } => {
            let raw = fs::read_to_string(file)?;
            let payload: Value = serde_json::from_str(&raw)?;
            let Some(doc) = payload.as_object().cloned() else {
                return fail("payload must be a JSON object".to_string());
            };
            match store.save(doc, actor)? {
                SaveOutcome::Saved(saved) => println!("{} {}", "Saved".green().bold(), describe(&saved)),
                SaveOutcome::Rejected(errors) => {
                    eprintln!("{}", "Validation failed:".red().bold());
                    for error in errors {
                        eprintln!("  - {}", error);
                    }
                    return Ok(ExitCode::FAILURE);
                }
            }
        }

        Command::Versions { kind, slug } => {
            for version in store.versions(*kind, slug)? {
                println!("{}", version);
            }
        }

        Command::Delete { kind, slug, hard, yes } => {
            if *hard && !*yes && !confirm_hard_delete(*kind, slug)? {
                println!("Operation cancelled.");
                return Ok(ExitCode::SUCCESS);
            }
            if store.delete(*kind, slug, *hard)? {
                let verb = if *hard { "Removed" } else { "Archived" };
                println!("{} {}/{}", verb.green().bold(), kind, slug);
            } else {
                return fail(format!("{}/{} is not in the index", kind, slug));
            }
        }

        Command::Restore { kind, slug, version } => match store.restore(*kind, slug, version)? {
            RestoreOutcome::Restored(doc) => {
                println!("{} {}", "Restored".green().bold(), describe(&doc));
            }
            RestoreOutcome::TargetMissing => {
                return fail(format!("{}/{} version {} not found", kind, slug, version));
            }
            RestoreOutcome::Rejected(errors) => {
                eprintln!("{}", "Restore failed validation:".red().bold());
                for error in errors {
                    eprintln!("  - {}", error);
                }
                return Ok(ExitCode::FAILURE);
            }
        },

        Command::Doctor => {
            let report = store.doctor()?;
            println!(
                "{} checked {}",
                "Doctor".green().bold(),
                store.base_dir().display()
            );
            println!(
                "pointers repaired: {}, documents indexed: {}, stale entries dropped: {}",
                report.repaired_pointers,
                report.indexed_documents,
                report.dropped_entries
            );
        }

        Command::MediaDir { kind, slug } => {
            println!("{}", store.media_dir(*kind, slug)?.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn describe(doc: &exstore::Document) -> String {
    let kind = doc.get("type").and_then(Value::as_str).unwrap_or("?");
    let slug = doc.get("slug").and_then(Value::as_str).unwrap_or("?");
    let version = doc.get("version").and_then(Value::as_u64).unwrap_or(0);
    format!("{}/{} version {:03}", kind, slug, version)
}

fn confirm_hard_delete(kind: ExerciseType, slug: &str) -> Result<bool> {
    println!("This will permanently remove {}/{} and all its versions.", kind, slug);
    print!("[Y] To delete: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim() == "Y")
}

fn fail(message: String) -> Result<ExitCode> {
    eprintln!("{} {}", "error:".red().bold(), message);
    Ok(ExitCode::FAILURE)
}
