//! Core modules for Rollcall.
//!
//! Storage, configuration and the shared primitives the subsystems build on.

pub mod broker;
pub mod config;
pub mod db;
pub mod error;
pub mod output;
pub mod schemas;
pub mod store;
pub mod time;
pub mod tui;
