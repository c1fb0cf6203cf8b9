//! Scripted command surface over the student register.
//!
//! `rollcall student ...` and `rollcall db ...` map one subcommand onto one
//! store operation. Output is either plain text or a JSON envelope.

use crate::core::config::Config;
use crate::core::error::RollcallError;
use crate::core::output;
use crate::core::store::{NewStudent, Student, StudentStore};
use crate::core::time;
use crate::plugins::loader;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value as JsonValue;
use std::io::Write;
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[clap(name = "student", about = "Register, look up, change and remove students.")]
pub struct StudentCli {
    /// Output format for this command group.
    #[clap(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,
    #[clap(subcommand)]
    pub command: StudentCommand,
}

#[derive(Subcommand, Debug)]
pub enum StudentCommand {
    /// Register a new student.
    Add {
        #[clap(long)]
        first: String,
        #[clap(long)]
        last: String,
        /// Class name (leave out for none).
        #[clap(long, default_value = "")]
        class: String,
        /// Generate the school e-mail right after registering.
        #[clap(long)]
        email: bool,
    },
    /// Find students whose first name OR last name matches.
    Find {
        #[clap(long, default_value = "")]
        first: String,
        #[clap(long, default_value = "")]
        last: String,
    },
    /// Show one student by id.
    Get {
        #[clap(long)]
        id: i64,
    },
    /// List every student.
    List,
    /// Remove a student. Unknown ids are ignored.
    Delete {
        #[clap(long)]
        id: i64,
    },
    /// Move a student to another class.
    SetClass {
        #[clap(long)]
        id: i64,
        #[clap(long)]
        class: String,
    },
    /// Generate and store `first.last@school.edu`.
    GenEmail {
        #[clap(long)]
        id: i64,
    },
}

#[derive(Parser, Debug)]
#[clap(name = "db", about = "Manage the student database itself.")]
pub struct DbCli {
    #[clap(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,
    #[clap(subcommand)]
    pub command: DbCommand,
}

#[derive(Subcommand, Debug)]
pub enum DbCommand {
    /// Drop and recreate the student table. Irreversible.
    Init {
        /// Confirm the wipe.
        #[clap(long)]
        yes: bool,
    },
    /// Bulk-load students from a delimited file (first,last,class,email).
    Load {
        /// File to load (defaults to `mock_data` from config).
        #[clap(value_name = "FILE")]
        file: Option<PathBuf>,
        #[clap(long)]
        delimiter: Option<char>,
    },
    /// Count stored students.
    Count,
}

pub fn schema() -> JsonValue {
    serde_json::json!({
        "name": "student",
        "version": "0.1.0",
        "description": "Student register",
        "commands": [
            { "name": "add", "parameters": ["first", "last", "class", "email"] },
            { "name": "find", "parameters": ["first", "last"] },
            { "name": "get", "parameters": ["id"] },
            { "name": "list", "parameters": [] },
            { "name": "delete", "parameters": ["id"] },
            { "name": "set-class", "parameters": ["id", "class"] },
            { "name": "gen-email", "parameters": ["id"] },
            { "name": "db init", "parameters": ["yes"] },
            { "name": "db load", "parameters": ["file", "delimiter"] },
            { "name": "db count", "parameters": [] }
        ],
        "storage": ["students.db", "broker.events.jsonl"]
    })
}

fn item_envelope(cmd: &str, item: Option<Student>) -> JsonValue {
    let status = if item.is_some() { "ok" } else { "not_found" };
    time::command_envelope(cmd, status, serde_json::json!({ "item": item }))
}

/// Run one student subcommand and return its JSON envelope.
pub fn execute_student_command(
    store: &mut StudentStore,
    command: &StudentCommand,
) -> Result<JsonValue, RollcallError> {
    let out = match command {
        StudentCommand::Add {
            first,
            last,
            class,
            email,
        } => {
            let id = store.insert_one(&NewStudent::new(first, last, class))?;
            if *email {
                store.generate_email(id)?;
            }
            item_envelope("student.add", store.find_by_id(id)?)
        }
        StudentCommand::Find { first, last } => {
            let items = store.find_by_name(first, last)?;
            time::command_envelope(
                "student.find",
                "ok",
                serde_json::json!({ "count": items.len(), "items": items }),
            )
        }
        StudentCommand::Get { id } => item_envelope("student.get", store.find_by_id(*id)?),
        StudentCommand::List => {
            let items = store.list_all()?;
            time::command_envelope(
                "student.list",
                "ok",
                serde_json::json!({ "count": items.len(), "items": items }),
            )
        }
        StudentCommand::Delete { id } => {
            let existed = store.find_by_id(*id)?.is_some();
            store.delete_by_id(*id)?;
            time::command_envelope(
                "student.delete",
                "ok",
                serde_json::json!({ "id": id, "removed": existed }),
            )
        }
        StudentCommand::SetClass { id, class } => {
            store.update_class(*id, class)?;
            item_envelope("student.set_class", store.find_by_id(*id)?)
        }
        StudentCommand::GenEmail { id } => {
            let email = store.generate_email(*id)?;
            time::command_envelope(
                "student.gen_email",
                "ok",
                serde_json::json!({ "id": id, "email": email }),
            )
        }
    };
    Ok(out)
}

pub fn execute_db_command(
    store: &mut StudentStore,
    config: &Config,
    command: &DbCommand,
) -> Result<JsonValue, RollcallError> {
    let out = match command {
        DbCommand::Init { yes } => {
            if !*yes {
                return Err(RollcallError::ValidationError(
                    "refusing to wipe the student table without --yes".to_string(),
                ));
            }
            store.initialize_schema()?;
            time::command_envelope("db.init", "ok", JsonValue::Null)
        }
        DbCommand::Load { file, delimiter } => {
            let path = file.clone().unwrap_or_else(|| config.mock_data.clone());
            let inserted =
                loader::load_file(store, &path, delimiter.unwrap_or(config.delimiter))?;
            time::command_envelope(
                "db.load",
                "ok",
                serde_json::json!({ "file": path.to_string_lossy(), "inserted": inserted }),
            )
        }
        DbCommand::Count => {
            let count = store.count()?;
            time::command_envelope("db.count", "ok", serde_json::json!({ "count": count }))
        }
    };
    Ok(out)
}

fn write_json(out: &mut dyn Write, value: &JsonValue) -> Result<(), RollcallError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| RollcallError::IoError(std::io::Error::other(e)))?;
    writeln!(out, "{}", text)?;
    Ok(())
}

fn items_of(value: &JsonValue) -> Vec<Student> {
    value
        .get("items")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

fn item_of(value: &JsonValue) -> Option<Student> {
    value
        .get("item")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
}

fn render_student_text(
    out: &mut dyn Write,
    command: &StudentCommand,
    value: &JsonValue,
) -> Result<(), RollcallError> {
    match command {
        StudentCommand::Find { .. } | StudentCommand::List => {
            let items = items_of(value);
            if items.is_empty() {
                writeln!(out, "No students found.")?;
            } else {
                for s in &items {
                    writeln!(out, "{}", output::student_line(s))?;
                }
            }
        }
        StudentCommand::Add { .. } | StudentCommand::Get { .. } | StudentCommand::SetClass { .. } => {
            match item_of(value) {
                Some(s) => write!(out, "{}", output::student_card(&s))?,
                None => writeln!(out, "Student not found.")?,
            }
        }
        StudentCommand::Delete { id } => {
            if value["removed"].as_bool() == Some(true) {
                writeln!(out, "Removed student {}.", id)?;
            } else {
                writeln!(out, "No student with id {}; nothing removed.", id)?;
            }
        }
        StudentCommand::GenEmail { id } => {
            let email = value["email"].as_str().unwrap_or_default();
            writeln!(out, "Student {} e-mail set to {}.", id, email)?;
        }
    }
    Ok(())
}

pub fn run_student_cli(
    store: &mut StudentStore,
    cli: &StudentCli,
    out: &mut dyn Write,
) -> Result<(), RollcallError> {
    match execute_student_command(store, &cli.command) {
        Ok(value) => match cli.format {
            OutputFormat::Json => write_json(out, &value),
            OutputFormat::Text => render_student_text(out, &cli.command, &value),
        },
        Err(e) => {
            if cli.format == OutputFormat::Json {
                write_json(out, &time::error_envelope(&student_cmd_name(&cli.command), &e))?;
            }
            Err(e)
        }
    }
}

pub fn run_db_cli(
    store: &mut StudentStore,
    config: &Config,
    cli: &DbCli,
    out: &mut dyn Write,
) -> Result<(), RollcallError> {
    match execute_db_command(store, config, &cli.command) {
        Ok(value) => match cli.format {
            OutputFormat::Json => write_json(out, &value),
            OutputFormat::Text => {
                match &cli.command {
                    DbCommand::Init { .. } => writeln!(out, "Student table emptied.")?,
                    DbCommand::Load { .. } => writeln!(
                        out,
                        "Loaded {} students from {}.",
                        value["inserted"],
                        value["file"].as_str().unwrap_or_default()
                    )?,
                    DbCommand::Count => writeln!(out, "{} students.", value["count"])?,
                }
                Ok(())
            }
        },
        Err(e) => {
            if cli.format == OutputFormat::Json {
                let cmd = match cli.command {
                    DbCommand::Init { .. } => "db.init",
                    DbCommand::Load { .. } => "db.load",
                    DbCommand::Count => "db.count",
                };
                write_json(out, &time::error_envelope(cmd, &e))?;
            }
            Err(e)
        }
    }
}

fn student_cmd_name(command: &StudentCommand) -> String {
    let name = match command {
        StudentCommand::Add { .. } => "add",
        StudentCommand::Find { .. } => "find",
        StudentCommand::Get { .. } => "get",
        StudentCommand::List => "list",
        StudentCommand::Delete { .. } => "delete",
        StudentCommand::SetClass { .. } => "set_class",
        StudentCommand::GenEmail { .. } => "gen_email",
    };
    format!("student.{}", name)
}
