//! CLI module for promptstudio - command-line interface and subcommands.
//!
//! Stands in for a request-handling surface: list and inspect prompts,
//! preview compiled text, and run a prompt against a provider.

pub mod commands;

pub use commands::Cli;
