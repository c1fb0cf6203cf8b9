//! Rollcall: a small student register on SQLite.
//!
//! One table of students, one process, one connection. Students can be
//! registered singly or bulk-loaded from a delimited file, found by name or
//! id, moved between classes, given a generated school e-mail, and removed.
//!
//! # Architecture
//!
//! - [`core::store::StudentStore`] is the only thing that talks to the
//!   database. It is opened once and handed to whoever needs it.
//! - [`core::broker::DbBroker`] wraps every store call: writes run in a
//!   transaction and each call leaves a line in `broker.events.jsonl`.
//! - [`plugins::shell`] is the interactive menu and
//!   [`plugins::students`] the scripted subcommands. Neither holds any
//!   business rules.
//!
//! # Examples
//!
//! ```bash
//! # Interactive menu
//! rollcall
//!
//! # Scripted use
//! rollcall student add --first Ada --last Lovelace --class 7B --email
//! rollcall student find --first Ada
//! rollcall db load mockdata.csv
//! ```

mod cli;
pub mod core;
pub mod plugins;

use crate::cli::{AuditCli, Cli, Command};
use crate::core::{
    broker, config,
    config::Config,
    db,
    error::RollcallError,
    store::StudentStore,
    time,
};
use crate::plugins::{shell::Shell, students};

use clap::Parser;
use std::io::{self, Write};

/// Open the store, run `f`, and close the store on every exit path.
pub fn with_store<F, R>(config: &Config, f: F) -> Result<R, RollcallError>
where
    F: FnOnce(&mut StudentStore) -> Result<R, RollcallError>,
{
    let mut store = StudentStore::open(&config.database, config)?;
    let result = f(&mut store);
    let closed = store.close();
    let value = result?;
    closed?;
    Ok(value)
}

fn run_audit(config: &Config, cli: &AuditCli, out: &mut dyn Write) -> Result<(), RollcallError> {
    let path = db::broker_events_path(&config.database);
    let mut events = broker::read_events(&path)?;
    if let Some(n) = cli.tail {
        let skip = events.len().saturating_sub(n);
        events.drain(..skip);
    }
    match cli.format {
        students::OutputFormat::Json => {
            let env = time::command_envelope(
                "audit",
                "ok",
                serde_json::json!({ "log": path.to_string_lossy(), "events": events }),
            );
            let text = serde_json::to_string_pretty(&env)
                .map_err(|e| RollcallError::IoError(io::Error::other(e)))?;
            writeln!(out, "{}", text)?;
        }
        students::OutputFormat::Text => {
            if events.is_empty() {
                writeln!(out, "No audit events in {}.", path.display())?;
            }
            for ev in &events {
                writeln!(
                    out,
                    "- {} {} [{}] actor={} db={}",
                    ev.ts, ev.op, ev.status, ev.actor, ev.db_id
                )?;
            }
        }
    }
    Ok(())
}

pub fn run() -> Result<(), RollcallError> {
    let cli = Cli::parse();
    let current_dir = std::env::current_dir()?;
    let mut config = config::load_config(&current_dir)?.apply_env();
    if let Some(db) = cli.db {
        config.database = db;
    }
    if cli.no_audit {
        config.audit = false;
    }

    match cli.command {
        None | Some(Command::Shell) => with_store(&config, |store| {
            let stdin = io::stdin();
            let mut shell = Shell::new(store, &config, stdin.lock(), io::stdout());
            shell.run()
        }),
        Some(Command::Student(student_cli)) => with_store(&config, |store| {
            students::run_student_cli(store, &student_cli, &mut io::stdout().lock())
        }),
        Some(Command::Db(db_cli)) => with_store(&config, |store| {
            students::run_db_cli(store, &config, &db_cli, &mut io::stdout().lock())
        }),
        Some(Command::Audit(audit_cli)) => {
            run_audit(&config, &audit_cli, &mut io::stdout().lock())
        }
        Some(Command::Version) => {
            println!("v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
