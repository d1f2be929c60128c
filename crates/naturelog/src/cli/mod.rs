//! Command-line interface for naturelog.
//!
//! This module provides the CLI structure and command handlers for the
//! `natlog` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AcquireFrom, CalendarCommand, ConfigCommand, DayCommand, DeleteCommand, SaveCommand,
    StatusCommand,
};

/// natlog - A photo journal in your terminal
///
/// A headless client for a hosted photo journal: stage a photo with a
/// caption, upload it, and browse your saved entries by calendar day.
#[derive(Debug, Parser)]
#[command(name = "natlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Save a photo entry to the journal
    Save(SaveCommand),

    /// Show the days that carry entries
    Calendar(CalendarCommand),

    /// Show the entries for one day
    Day(DayCommand),

    /// Delete an entry
    Delete(DeleteCommand),

    /// Show session and configuration status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
