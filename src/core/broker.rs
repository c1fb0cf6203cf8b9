use crate::core::config;
use crate::core::error::RollcallError;
use crate::core::time;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Every store operation passes through the broker.
///
/// Writes get a transaction that commits when the body returns `Ok` and rolls
/// back otherwise. Reads and writes alike leave one line in the audit log.
///
/// A successful write is logged before its commit, so a write that reports
/// `Err` never leaves rows behind. Failed operations and reads are logged on
/// a best-effort basis: an unwritable log is reported on stderr and does not
/// change the result.
pub struct DbBroker {
    audit_log_path: Option<PathBuf>,
    actor: String,
    db_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BrokerEvent {
    pub ts: String,
    pub event_id: String,
    pub actor: String,
    pub op: String,
    pub db_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl DbBroker {
    pub fn new(db_path: &Path, actor: &str, audit: bool) -> Self {
        let db_id = db_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Self {
            audit_log_path: audit.then(|| crate::core::db::broker_events_path(db_path)),
            actor: actor.to_string(),
            db_id,
        }
    }

    /// Broker for a database with no file behind it; nothing is audited.
    pub fn detached(actor: &str) -> Self {
        Self {
            audit_log_path: None,
            actor: actor.to_string(),
            db_id: ":memory:".to_string(),
        }
    }

    pub fn audit_log_path(&self) -> Option<&Path> {
        self.audit_log_path.as_deref()
    }

    pub fn with_read<F, R>(&self, conn: &Connection, op_name: &str, f: F) -> Result<R, RollcallError>
    where
        F: FnOnce(&Connection) -> Result<R, RollcallError>,
    {
        let result = f(conn);
        self.record_or_warn(op_name, result.as_ref().err());
        result
    }

    /// Run `f` inside one transaction: all of its statements land, or none do.
    pub fn with_write<F, R>(
        &self,
        conn: &mut Connection,
        op_name: &str,
        f: F,
    ) -> Result<R, RollcallError>
    where
        F: FnOnce(&Connection) -> Result<R, RollcallError>,
    {
        let tx = match conn.transaction() {
            Ok(tx) => tx,
            Err(e) => {
                let err = RollcallError::RusqliteError(e);
                self.record_or_warn(op_name, Some(&err));
                return Err(err);
            }
        };
        let value = match f(&*tx) {
            Ok(value) => value,
            Err(e) => {
                // A failed rollback still leaves the transaction unapplied.
                let _ = tx.rollback();
                self.record_or_warn(op_name, Some(&e));
                return Err(e);
            }
        };
        if let Err(e) = self.record(op_name, None) {
            let _ = tx.rollback();
            return Err(e);
        }
        match tx.commit() {
            Ok(()) => Ok(value),
            Err(e) => {
                let err = RollcallError::RusqliteError(e);
                self.record_or_warn(op_name, Some(&err));
                Err(err)
            }
        }
    }

    fn record(&self, op: &str, err: Option<&RollcallError>) -> Result<(), RollcallError> {
        let status = if err.is_none() { "success" } else { "error" };
        if config::trace_enabled() {
            eprintln!("rollcall: trace {} {} {}", op, self.db_id, status);
        }
        match &self.audit_log_path {
            Some(path) => self.log_event(path, op, status, err.map(|e| e.kind())),
            None => Ok(()),
        }
    }

    fn record_or_warn(&self, op: &str, err: Option<&RollcallError>) {
        if let Err(e) = self.record(op, err) {
            eprintln!("rollcall: audit log unavailable for {}: {}", op, e);
        }
    }

    fn log_event(
        &self,
        path: &Path,
        op: &str,
        status: &str,
        error_kind: Option<&str>,
    ) -> Result<(), RollcallError> {
        use std::fs::OpenOptions;
        use std::io::Write;

        let ev = BrokerEvent {
            ts: time::now_epoch_z(),
            event_id: time::new_event_id(),
            actor: self.actor.clone(),
            op: op.to_string(),
            db_id: self.db_id.clone(),
            status: status.to_string(),
            error_kind: error_kind.map(|s| s.to_string()),
        };
        let line = serde_json::to_string(&ev)
            .map_err(|e| RollcallError::IoError(std::io::Error::other(e)))?;

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(RollcallError::IoError)?;
        writeln!(f, "{}", line).map_err(RollcallError::IoError)?;
        Ok(())
    }
}

/// Read every event from an audit log; a missing log reads as empty.
pub fn read_events(path: &Path) -> Result<Vec<BrokerEvent>, RollcallError> {
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            serde_json::from_str(l).map_err(|e| {
                RollcallError::ValidationError(format!("bad audit line in {}: {}", path.display(), e))
            })
        })
        .collect()
}
