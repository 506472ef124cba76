//! denysync CLI - Command-line interface for denylist reconciliation
//!
//! This crate provides the CLI application that ties together all denysync components.

pub mod config;

pub use config::{Command, Config};
