//! CLI struct definitions for the Rollcall command-line interface.
//!
//! All clap-derived top-level types live here. Subsystem command groups are
//! defined next to the code they drive.

use crate::plugins::students::{DbCli, OutputFormat, StudentCli};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "rollcall",
    version = env!("CARGO_PKG_VERSION"),
    about = "Keep a small register of students: search, register, move, e-mail and remove them."
)]
pub(crate) struct Cli {
    /// Database file (overrides `rollcall.toml` and ROLLCALL_DB).
    #[clap(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,
    /// Do not append to the audit log for this invocation.
    #[clap(long, global = true)]
    pub no_audit: bool,
    /// Without a subcommand the interactive menu starts.
    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Interactive text menu (the default).
    Shell,

    /// Register, look up, change and remove students.
    Student(StudentCli),

    /// Wipe or bulk-load the database.
    Db(DbCli),

    /// Show the operation audit log.
    Audit(AuditCli),

    /// Print the version.
    Version,
}

#[derive(clap::Args, Debug)]
pub(crate) struct AuditCli {
    /// Only show the last N events.
    #[clap(long)]
    pub tail: Option<usize>,
    #[clap(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}
