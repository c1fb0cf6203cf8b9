//! The student register.
//!
//! `StudentStore` is the one handle onto the database. It is opened once,
//! passed to whoever needs it, and closed on shutdown. Every operation is a
//! single call through the [`DbBroker`], so each mutation commits or rolls
//! back as a unit.

use crate::core::broker::DbBroker;
use crate::core::config::Config;
use crate::core::db;
use crate::core::error::RollcallError;
use crate::core::schemas;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const EMAIL_DOMAIN: &str = "school.edu";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub class_name: Option<String>,
    pub email: Option<String>,
}

/// Input to [`StudentStore::insert_one`]. The email is never set here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewStudent {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub class_name: Option<String>,
}

impl NewStudent {
    pub fn new(first_name: &str, last_name: &str, class_name: &str) -> Self {
        Self {
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            class_name: Some(class_name.to_string()),
        }
    }
}

/// One row of a batch insert: `(first_name, last_name, class_name, email)`.
pub type StudentRow = (String, String, String, String);

/// `first.last@school.edu`, case kept as given.
pub fn derive_email(first_name: &str, last_name: &str) -> String {
    format!("{}.{}@{}", first_name, last_name, EMAIL_DOMAIN)
}

/// Blank optional text is stored as NULL.
fn nullable(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, RollcallError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(RollcallError::ValidationError(format!(
            "{} is required",
            field
        ))),
    }
}

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        class_name: row.get(3)?,
        email: row.get(4)?,
    })
}

pub struct StudentStore {
    conn: Connection,
    broker: DbBroker,
}

impl StudentStore {
    /// Open (or create) the register at `db_path`. An existing table is left
    /// untouched; a fresh file gets an empty one.
    pub fn open(db_path: &Path, config: &Config) -> Result<Self, RollcallError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(RollcallError::IoError)?;
        }
        let conn = db::db_connect(&db_path.to_string_lossy())?;
        let broker = DbBroker::new(db_path, &config.actor, config.audit);
        let mut store = Self { conn, broker };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, RollcallError> {
        let mut store = Self {
            conn: db::db_connect_in_memory()?,
            broker: DbBroker::detached("rollcall"),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Release the connection, reporting any error from the engine.
    pub fn close(self) -> Result<(), RollcallError> {
        self.conn
            .close()
            .map_err(|(_, e)| RollcallError::RusqliteError(e))
    }

    fn ensure_schema(&mut self) -> Result<(), RollcallError> {
        self.broker
            .with_write(&mut self.conn, "student.ensure_schema", |conn| {
                conn.execute(schemas::STUDENT_DB_SCHEMA, [])?;
                Ok(())
            })
    }

    /// Drop the table and recreate it empty. Every record is lost.
    pub fn initialize_schema(&mut self) -> Result<(), RollcallError> {
        self.broker.with_write(&mut self.conn, "student.wipe", |conn| {
            conn.execute(schemas::STUDENT_DB_DROP, [])?;
            conn.execute(schemas::STUDENT_DB_SCHEMA, [])?;
            Ok(())
        })
    }

    /// Insert one student and return the id it was given.
    pub fn insert_one(&mut self, student: &NewStudent) -> Result<i64, RollcallError> {
        let first = required(student.first_name.as_deref(), "first_name")?;
        let last = required(student.last_name.as_deref(), "last_name")?;
        let class = nullable(student.class_name.as_deref());

        self.broker.with_write(&mut self.conn, "student.insert", |conn| {
            conn.execute(
                "INSERT INTO STUDENT (FIRST_NAME, LAST_NAME, CLASS) VALUES (?1, ?2, ?3)",
                params![first, last, class],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Insert a batch atomically. Returns the number of rows written.
    pub fn insert_many(&mut self, rows: &[StudentRow]) -> Result<usize, RollcallError> {
        self.broker
            .with_write(&mut self.conn, "student.insert_many", |conn| {
                let mut stmt = conn.prepare(
                    "INSERT INTO STUDENT (FIRST_NAME, LAST_NAME, CLASS, EMAIL) VALUES (?1, ?2, ?3, ?4)",
                )?;
                for (n, (first, last, class, email)) in rows.iter().enumerate() {
                    if first.trim().is_empty() || last.trim().is_empty() {
                        return Err(RollcallError::ValidationError(format!(
                            "row {}: first_name and last_name are required",
                            n + 1
                        )));
                    }
                    stmt.execute(params![
                        first,
                        last,
                        nullable(Some(class.as_str())),
                        nullable(Some(email.as_str()))
                    ])?;
                }
                Ok(rows.len())
            })
    }

    /// Absent ids are a no-op.
    pub fn delete_by_id(&mut self, id: i64) -> Result<(), RollcallError> {
        self.broker.with_write(&mut self.conn, "student.delete", |conn| {
            conn.execute("DELETE FROM STUDENT WHERE ID = ?1", params![id])?;
            Ok(())
        })
    }

    /// Students whose first name OR last name matches.
    ///
    /// This is an inclusive OR, not AND: `("Ada", "Byron")` also returns every
    /// other Ada and every other Byron. An empty argument matches nothing on
    /// its own; both empty lists the whole register.
    pub fn find_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Vec<Student>, RollcallError> {
        if first_name.is_empty() && last_name.is_empty() {
            return self.list_all();
        }
        self.broker.with_read(&self.conn, "student.find_by_name", |conn| {
            let sql = format!(
                "SELECT {} FROM STUDENT
                 WHERE (?1 <> '' AND FIRST_NAME = ?1) OR (?2 <> '' AND LAST_NAME = ?2)
                 ORDER BY ID",
                schemas::STUDENT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![first_name, last_name], student_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Student>, RollcallError> {
        self.broker.with_read(&self.conn, "student.find_by_id", |conn| {
            let sql = format!(
                "SELECT {} FROM STUDENT WHERE ID = ?1",
                schemas::STUDENT_COLUMNS
            );
            let found = conn
                .query_row(&sql, params![id], student_from_row)
                .optional()?;
            Ok(found)
        })
    }

    /// Absent ids are a no-op.
    pub fn update_class(&mut self, id: i64, class_name: &str) -> Result<(), RollcallError> {
        let class = nullable(Some(class_name));
        self.broker
            .with_write(&mut self.conn, "student.update_class", |conn| {
                conn.execute(
                    "UPDATE STUDENT SET CLASS = ?1 WHERE ID = ?2",
                    params![class, id],
                )?;
                Ok(())
            })
    }

    /// Compute `first.last@school.edu` for the student and store it.
    pub fn generate_email(&mut self, id: i64) -> Result<String, RollcallError> {
        self.broker
            .with_write(&mut self.conn, "student.generate_email", |conn| {
                let names: Option<(String, String)> = conn
                    .query_row(
                        "SELECT FIRST_NAME, LAST_NAME FROM STUDENT WHERE ID = ?1",
                        params![id],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?;
                let (first, last) =
                    names.ok_or_else(|| RollcallError::NotFound(format!("student {}", id)))?;
                let email = derive_email(&first, &last);
                conn.execute(
                    "UPDATE STUDENT SET EMAIL = ?1 WHERE ID = ?2",
                    params![email, id],
                )?;
                Ok(email)
            })
    }

    /// Every student in insertion order.
    pub fn list_all(&self) -> Result<Vec<Student>, RollcallError> {
        self.broker.with_read(&self.conn, "student.list", |conn| {
            let sql = format!(
                "SELECT {} FROM STUDENT ORDER BY ID",
                schemas::STUDENT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], student_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    pub fn count(&self) -> Result<i64, RollcallError> {
        self.broker.with_read(&self.conn, "student.count", |conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM STUDENT", [], |row| row.get(0))?;
            Ok(n)
        })
    }
}
