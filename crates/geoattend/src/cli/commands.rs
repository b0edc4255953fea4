//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands, plus the small
//! line-oriented command set understood by the interactive `run` loop.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Subcommand};

use crate::config::Config;

/// Identity and position overrides shared by `run` and `locate`.
#[derive(Debug, Clone, Default, PartialEq, Args)]
pub struct SessionArgs {
    /// Employee id (overrides `attendance.employee_id`)
    #[arg(short, long, value_name = "ID")]
    pub employee: Option<u64>,

    /// Project id (overrides `attendance.project_id`)
    #[arg(short, long, value_name = "ID")]
    pub project: Option<u64>,

    /// Latitude to report (overrides `location.latitude`)
    #[arg(long, allow_negative_numbers = true, requires = "longitude")]
    pub latitude: Option<f64>,

    /// Longitude to report (overrides `location.longitude`)
    #[arg(long, allow_negative_numbers = true, requires = "latitude")]
    pub longitude: Option<f64>,
}

impl SessionArgs {
    /// Apply the overrides on top of loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(employee) = self.employee {
            config.attendance.employee_id = Some(employee);
        }
        if let Some(project) = self.project {
            config.attendance.project_id = Some(project);
        }
        if let (Some(lat), Some(lon)) = (self.latitude, self.longitude) {
            config.location.latitude = Some(lat);
            config.location.longitude = Some(lon);
        }
    }
}

/// Run command arguments.
#[derive(Debug, Args)]
pub struct RunCommand {
    /// Identity and position overrides.
    #[command(flatten)]
    pub session: SessionArgs,

    /// Do not start the background location logger
    #[arg(long)]
    pub no_logger: bool,
}

/// Locate command arguments.
#[derive(Debug, Args)]
pub struct LocateCommand {
    /// Identity and position overrides.
    #[command(flatten)]
    pub session: SessionArgs,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// A command typed at the interactive prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptCommand {
    /// Acquire and validate a new position.
    Locate,
    /// Submit the pending checkpoint.
    Submit,
    /// Print the session state.
    Status,
    /// Print the command list.
    Help,
    /// Leave the loop.
    Quit,
}

impl PromptCommand {
    /// One-line usage for each prompt command.
    pub const USAGE: [(&'static str, &'static str); 5] = [
        ("locate", "Get my location and check the project geofence"),
        ("submit", "Submit attendance for the pending checkpoint"),
        ("status", "Show checkpoint, position and geofence state"),
        ("help", "Show this list"),
        ("quit", "End the session"),
    ];
}

impl FromStr for PromptCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "locate" | "l" => Ok(Self::Locate),
            "submit" | "s" => Ok(Self::Submit),
            "status" | "st" => Ok(Self::Status),
            "help" | "h" | "?" => Ok(Self::Help),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command: {other} (type `help`)")),
        }
    }
}
