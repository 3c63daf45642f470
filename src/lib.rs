//! branchboard - personal Jira Kanban board for the terminal
//!
//! This library crate exposes internal modules for integration testing.

pub mod config;
pub mod data;
pub mod errors;
pub mod integrations;
pub mod tui;
pub mod util;
pub mod workflow;
