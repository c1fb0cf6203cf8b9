//! Bulk loading of students from a delimited text file.
//!
//! One student per line, four fields: `first,last,class,email`. No header.
//! Fields may be wrapped in double quotes, inside which the delimiter is
//! literal and `""` is one quote. The whole file is parsed before anything is
//! written, and the rows go to the store as one atomic batch.

use crate::core::error::RollcallError;
use crate::core::store::{StudentRow, StudentStore};
use std::fs;
use std::path::Path;

pub const FIELDS_PER_LINE: usize = 4;

/// Split one line into fields.
pub fn split_fields(line: &str, delimiter: char) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else if ch == '"' && current.is_empty() {
            in_quotes = true;
        } else if ch == delimiter {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(current);
    Ok(fields)
}

/// Parse file contents into batch rows. Blank lines are skipped; any other
/// line must have exactly four fields.
pub fn parse_rows(content: &str, delimiter: char) -> Result<Vec<StudentRow>, RollcallError> {
    let mut rows = Vec::new();
    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_fields(line, delimiter)
            .map_err(|e| RollcallError::ValidationError(format!("line {}: {}", idx + 1, e)))?;
        let [first, last, class, email]: [String; FIELDS_PER_LINE] =
            fields.try_into().map_err(|f: Vec<String>| {
                RollcallError::ValidationError(format!(
                    "line {}: expected {} fields, got {}",
                    idx + 1,
                    FIELDS_PER_LINE,
                    f.len()
                ))
            })?;
        rows.push((first, last, class, email));
    }
    Ok(rows)
}

pub fn read_rows(path: &Path, delimiter: char) -> Result<Vec<StudentRow>, RollcallError> {
    let content = fs::read_to_string(path).map_err(|e| {
        RollcallError::IoError(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    parse_rows(&content, delimiter)
}

/// Read `path` and insert every row in one batch. Returns rows inserted.
pub fn load_file(
    store: &mut StudentStore,
    path: &Path,
    delimiter: char,
) -> Result<usize, RollcallError> {
    let rows = read_rows(path, delimiter)?;
    store.insert_many(&rows)
}
