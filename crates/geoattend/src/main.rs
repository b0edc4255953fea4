//! `geoattend` - CLI for geofenced attendance tracking
//!
//! This binary opens interactive tracking sessions against the attendance
//! service and provides one-shot location checks and configuration commands.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use geoattend::cli::{Cli, Command, ConfigCommand, LocateCommand, PromptCommand, RunCommand};
use geoattend::{
    init_logging, Config, HttpBackend, SessionSettings, StaticLocationProvider, TrackingSession,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    // Execute the command
    match cli.command {
        Command::Run(run_cmd) => handle_run(config, &run_cmd).await,
        Command::Locate(locate_cmd) => handle_locate(config, &locate_cmd).await,
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn open_session(config: &Config, with_logger: bool) -> anyhow::Result<TrackingSession> {
    config.validate()?;
    let employee_id = config.employee_id()?;
    let project_id = config.project_id()?;

    let backend = HttpBackend::from_config(config)?;
    let provider = StaticLocationProvider::from_config(&config.location);

    let mut settings = SessionSettings::from_config(config);
    if !with_logger {
        settings.log_interval = None;
    }

    Ok(TrackingSession::start(
        employee_id,
        project_id,
        Arc::new(provider),
        Arc::new(backend),
        &settings,
    ))
}

async fn handle_run(mut config: Config, cmd: &RunCommand) -> anyhow::Result<()> {
    cmd.session.apply(&mut config);
    let mut session = open_session(&config, !cmd.no_logger)?;

    println!("Geo-Fenced Attendance");
    println!("=====================");
    println!("Employee:      {}", session.employee_id());
    println!("Project:       {}", session.project_id());
    println!("Backend:       {}", config.backend.base_url);
    println!();
    print_help();
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        print!("[{}]> ", session.checkpoint());
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line.context("reading from stdin")?,
            _ = &mut ctrl_c => {
                println!();
                break;
            }
        };
        let Some(line) = line else {
            println!();
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<PromptCommand>() {
            Ok(PromptCommand::Locate) => handle_prompt_locate(&mut session).await,
            Ok(PromptCommand::Submit) => handle_prompt_submit(&mut session).await,
            Ok(PromptCommand::Status) => print_status(&session),
            Ok(PromptCommand::Help) => print_help(),
            Ok(PromptCommand::Quit) => break,
            Err(message) => println!("{message}"),
        }
    }

    if let Some(stats) = session.shutdown().await {
        println!(
            "Location log: {} sent, {} skipped, {} failed",
            stats.sent, stats.skipped, stats.failed
        );
    }
    Ok(())
}

async fn handle_prompt_locate(session: &mut TrackingSession) {
    println!("Getting your location...");
    match session.refresh_location().await {
        Ok(status) if status.inside_boundary => {
            println!("{}: you are inside the geofence", status.evaluated_for);
        }
        Ok(status) => {
            println!(
                "{}: you are outside the project geofence!",
                status.evaluated_for
            );
        }
        Err(err) => println!("Error: {err}"),
    }
}

async fn handle_prompt_submit(session: &mut TrackingSession) {
    match session.submit().await {
        Ok(recorded) => {
            println!("{} ({})", recorded.message, recorded.checkpoint);
            if session.checkpoint().is_completed() {
                println!("All sessions completed for today");
            } else {
                println!("Next checkpoint: {}", session.checkpoint());
            }
        }
        Err(err) => println!("Error: {err}"),
    }
}

fn print_status(session: &TrackingSession) {
    println!("Current Session: {}", session.checkpoint());
    match session.position() {
        Some(position) => println!("Location:        {position}"),
        None => println!("Location:        Not fetched"),
    }
    let status = match session.geofence_status() {
        Some(_) if session.is_inside() => "Inside Geofence",
        Some(_) => "Outside Geofence",
        None => "Not validated",
    };
    println!("Status:          {status}");
    if let Some(stats) = session.logger_stats() {
        println!(
            "Location log:    {} sent, {} skipped, {} failed",
            stats.sent, stats.skipped, stats.failed
        );
    }
}

fn print_help() {
    println!("Commands:");
    for (name, description) in PromptCommand::USAGE {
        println!("  {name:<8} {description}");
    }
}

async fn handle_locate(mut config: Config, cmd: &LocateCommand) -> anyhow::Result<()> {
    cmd.session.apply(&mut config);
    let mut session = open_session(&config, false)?;

    let outcome = session.refresh_location().await;
    session.shutdown().await;
    let status = outcome?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("Location:      {}", status.evaluated_for);
        println!(
            "Status:        {}",
            if status.inside_boundary {
                "Inside Geofence"
            } else {
                "Outside Geofence"
            }
        );
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                let mut shown = config.clone();
                if shown.backend.auth_token.is_some() {
                    shown.backend.auth_token = Some("<redacted>".to_string());
                }
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                print_config(config);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn print_config(config: &Config) {
    fn or_unset<T: std::fmt::Display>(value: Option<T>) -> String {
        value.map_or_else(|| "not set".to_string(), |v| v.to_string())
    }

    println!("Current Configuration");
    println!("=====================");
    println!();
    println!("[Backend]");
    println!("  Base URL:           {}", config.backend.base_url);
    println!(
        "  Auth token:         {}",
        if config.backend.auth_token.is_some() {
            "set"
        } else {
            "not set"
        }
    );
    println!(
        "  Request timeout:    {}s",
        config.backend.request_timeout_secs
    );
    println!();
    println!("[Attendance]");
    println!(
        "  Employee id:        {}",
        or_unset(config.attendance.employee_id)
    );
    println!(
        "  Project id:         {}",
        or_unset(config.attendance.project_id)
    );
    println!();
    println!("[Location]");
    println!("  Enabled:            {}", config.location.enabled);
    println!("  Latitude:           {}", or_unset(config.location.latitude));
    println!("  Longitude:          {}", or_unset(config.location.longitude));
    println!(
        "  Acquire timeout:    {}s",
        config.location.acquire_timeout_secs
    );
    println!();
    println!("[Logger]");
    println!("  Enabled:            {}", config.logger.enabled);
    println!("  Interval (secs):    {}", config.logger.interval_secs);
}
