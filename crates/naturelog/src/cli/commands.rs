//! Command definitions for the `natlog` binary.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::acquire::AcquisitionMode;

/// Which device source a photo comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AcquireFrom {
    /// Live capture with the camera.
    Camera,
    /// Selection from the gallery.
    Gallery,
}

impl From<AcquireFrom> for AcquisitionMode {
    fn from(from: AcquireFrom) -> Self {
        match from {
            AcquireFrom::Camera => Self::Camera,
            AcquireFrom::Gallery => Self::Gallery,
        }
    }
}

/// Stage a photo with a caption and save it as a journal entry.
#[derive(Debug, Args)]
pub struct SaveCommand {
    /// Path to the image to stage (omit to simulate a cancelled pick)
    #[arg(short, long, value_name = "FILE")]
    pub photo: Option<PathBuf>,

    /// Caption to attach (may be empty)
    ///
    /// No short flag: `-c` belongs to the global `--config` option.
    #[arg(long, default_value = "")]
    pub caption: String,

    /// Acquisition mode the photo comes from
    #[arg(long, value_enum, default_value_t = AcquireFrom::Gallery)]
    pub from: AcquireFrom,
}

/// Show the days that carry journal entries.
#[derive(Debug, Args)]
pub struct CalendarCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Show the entries for one calendar day.
#[derive(Debug, Args)]
pub struct DayCommand {
    /// Day to show (YYYY-MM-DD)
    pub date: NaiveDate,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Delete one journal entry after confirmation.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Id of the entry to delete
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Show session and configuration status.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Configuration management commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the current configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the configuration file path
    Path,

    /// Validate a configuration file
    Validate {
        /// Path to the config file to validate (defaults to the standard path)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}
