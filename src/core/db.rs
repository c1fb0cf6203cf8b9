use crate::core::error;
use crate::core::schemas;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

const BUSY_TIMEOUT_SECS: u64 = 5;

pub fn db_connect(db_path: &str) -> Result<Connection, error::RollcallError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(BUSY_TIMEOUT_SECS))
        .map_err(error::RollcallError::RusqliteError)?;
    // Rollback journal: the register stays one file between transactions.
    conn.query_row("PRAGMA journal_mode=DELETE;", [], |_| Ok(()))
        .map_err(error::RollcallError::RusqliteError)?;
    Ok(conn)
}

/// Private scratch database; nothing touches disk.
pub fn db_connect_in_memory() -> Result<Connection, error::RollcallError> {
    Connection::open_in_memory().map_err(error::RollcallError::RusqliteError)
}

pub fn student_db_path(root: &Path) -> PathBuf {
    root.join(schemas::STUDENT_DB_NAME)
}

/// The audit log lives next to the database file it describes.
pub fn broker_events_path(db_path: &Path) -> PathBuf {
    db_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.join(schemas::BROKER_EVENTS_NAME))
        .unwrap_or_else(|| PathBuf::from(schemas::BROKER_EVENTS_NAME))
}
