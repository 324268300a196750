//! Operator tool for node joins.
//!
//! Provides commands for:
//! - Picking the tokens a joining node would own
//! - Previewing which ranges it would stream, and from where

pub mod commands;
pub mod config;

pub use commands::{Command, CommandResult};
pub use config::CliConfig;
