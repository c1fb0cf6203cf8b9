//! Subsystems built on the student register.

pub mod loader;
pub mod shell;
pub mod students;
