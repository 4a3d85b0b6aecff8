//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::settings::Credentials;

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "moco-timer")]
#[command(about = "A persistent work timer that books tracked time to MOCO")]
#[command(version)]
pub struct Config {
    /// Port the daemon listens on
    #[arg(short, long, default_value = "20554", global = true)]
    pub port: u16,

    /// Host address the daemon listens on
    #[arg(long, default_value = "127.0.0.1", global = true)]
    pub host: String,

    /// Storage file holding the timer and the credentials
    #[arg(long, env = "MOCO_TIMER_STATE_FILE", global = true)]
    pub state_file: Option<PathBuf>,

    /// Seconds between badge refreshes while a timer runs
    #[arg(long, default_value = "60")]
    pub badge_refresh_secs: u64,

    /// MOCO account subdomain, overrides the stored one
    #[arg(long, env = "MOCO_DOMAIN", global = true)]
    pub moco_domain: Option<String>,

    /// MOCO API key, overrides the stored one
    #[arg(long, env = "MOCO_API_KEY", hide_env_values = true, global = true)]
    pub moco_api_key: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the timer daemon (default)
    Serve,
    /// Start timing a task, replacing any running timer
    Start {
        #[arg(long)]
        project_id: i64,
        #[arg(long)]
        task_id: i64,
        #[arg(long, default_value = "")]
        project_name: String,
        #[arg(long, default_value = "")]
        task_name: String,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Stop the running timer
    Stop {
        /// Book the stopped entry on MOCO
        #[arg(long)]
        submit: bool,
    },
    /// Show the current timer
    Status,
    /// Follow the running timer, refreshing every second
    Watch,
    /// List the entries booked on a day
    Entries {
        /// Day to list (YYYY-MM-DD), today by default
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List active projects to pick ids from
    Projects {
        /// Also list each project's active tasks
        #[arg(long)]
        tasks: bool,
        /// Only projects assigned to the current user
        #[arg(long)]
        assigned: bool,
    },
    /// Book time on MOCO directly, e.g. to retry a failed submission
    Book {
        #[arg(long)]
        project_id: i64,
        #[arg(long)]
        task_id: i64,
        #[arg(long)]
        hours: f64,
        /// Day to book on (YYYY-MM-DD), today by default
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Store MOCO credentials
    Configure {
        #[arg(long, required_unless_present = "clear")]
        domain: Option<String>,
        #[arg(long, required_unless_present = "clear")]
        api_key: Option<String>,
        /// Check the credentials against MOCO before saving
        #[arg(long)]
        test: bool,
        /// Remove stored credentials
        #[arg(long, conflicts_with_all = ["domain", "api_key", "test"])]
        clear: bool,
    },
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL clients use to reach the daemon
    pub fn server_url(&self) -> String {
        let host = if self.host == "0.0.0.0" { "127.0.0.1" } else { &self.host };
        format!("http://{}:{}", host, self.port)
    }

    /// Storage file, defaulting to the user data directory
    pub fn state_file(&self) -> PathBuf {
        self.state_file.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("moco-timer")
                .join("storage.json")
        })
    }

    pub fn badge_refresh_period(&self) -> Duration {
        Duration::from_secs(self.badge_refresh_secs.max(1))
    }

    /// Credentials given on the command line or in the environment
    pub fn credentials(&self) -> Credentials {
        Credentials {
            domain: self.moco_domain.clone().filter(|s| !s.trim().is_empty()),
            api_key: self.moco_api_key.clone().filter(|s| !s.trim().is_empty()),
        }
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
