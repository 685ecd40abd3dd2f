//! CLI command handlers. Each one calls a single API wrapper and prints a
//! human-readable result.

pub mod auth;
pub mod feedback;
pub mod gallery;
pub mod generate;
pub mod prompt;
pub mod stats;
pub mod system;
