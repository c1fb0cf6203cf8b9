//! Schema definitions for the student register.
//!
//! The on-disk layout is one table, `STUDENT`, with upper-case column names.
//! Files written by earlier tools with the same layout open unchanged.

pub const STUDENT_DB_NAME: &str = "students.db";
pub const BROKER_EVENTS_NAME: &str = "broker.events.jsonl";

pub const STUDENT_DB_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS STUDENT (
        ID          INTEGER     PRIMARY KEY     NOT NULL,
        FIRST_NAME  TEXT                        NOT NULL,
        LAST_NAME   TEXT                        NOT NULL,
        CLASS       TEXT,
        EMAIL       TEXT
    )
";

pub const STUDENT_DB_DROP: &str = "DROP TABLE IF EXISTS STUDENT";

/// Column list shared by every SELECT so row decoding stays positional.
pub const STUDENT_COLUMNS: &str = "ID, FIRST_NAME, LAST_NAME, CLASS, EMAIL";
