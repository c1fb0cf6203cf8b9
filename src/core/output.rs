//! Text rendering for student records.

use crate::core::store::Student;

const NONE: &str = "-";

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// The multi-line card shown by the menu.
pub fn student_card(s: &Student) -> String {
    format!(
        "    student id: {}\n    full name: {} {}\n    registered class: {}\n    student e-mail: {}\n",
        s.id,
        s.first_name,
        s.last_name,
        s.class_name.as_deref().unwrap_or(NONE),
        s.email.as_deref().unwrap_or(NONE),
    )
}

/// One line per student for listings.
pub fn student_line(s: &Student) -> String {
    format!(
        "- {} {} [{}] <{}>",
        s.id,
        compact_line(&format!("{} {}", s.first_name, s.last_name), 40),
        s.class_name.as_deref().unwrap_or(NONE),
        s.email.as_deref().unwrap_or(NONE),
    )
}
