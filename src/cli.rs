use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser, Clone)]
#[command(
    name = "pacepod",
    version,
    about = "Track runs, log how they felt, and follow your pod"
)]
pub struct Cli {
    /// Directory holding the run database and settings.json
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Runner id to act as (overrides PACEPOD_USER and settings)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Track a run interactively, then log your mood and a note
    Run {
        /// Where the run takes place (defaults to the configured location)
        #[arg(long)]
        location: Option<String>,

        /// Calories burned per km (defaults to the configured rate)
        #[arg(long)]
        calories_per_km: Option<f64>,
    },
    /// Show your lifetime totals and streak
    Stats,
    /// Show recent runs from the community
    Feed {
        /// Maximum number of runs to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Set the name other runners see next to your runs
    Profile {
        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        avatar_url: Option<String>,
    },
    /// Show your pod's progress toward this week's goal, or set up a pod
    Pod {
        /// Pod name; replaces the configured pod
        #[arg(long, requires = "goal_km")]
        name: Option<String>,

        /// Comma-separated runner ids sharing the goal (you are always included)
        #[arg(long, value_delimiter = ',', requires = "name")]
        members: Vec<String>,

        /// Weekly distance goal in km
        #[arg(long, requires = "name")]
        goal_km: Option<f64>,
    },
}
