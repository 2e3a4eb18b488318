mod cli;
mod commands;
pub mod context;
pub mod db;
pub mod error;
pub mod feed;
pub mod journal;
pub mod models;
pub mod pod;
pub mod settings;
pub mod stats;
pub mod tracker;
mod utils;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use context::UserContext;
use db::Database;
use settings::SettingsStore;

pub(crate) struct AppState {
    pub(crate) db: Database,
    pub(crate) settings: SettingsStore,
    pub(crate) user: UserContext,
}

fn default_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("pacepod"))
        .context("could not determine a data directory; pass --data-dir")
}

pub fn run() -> Result<()> {
    // Warn by default so log lines don't break the live run display (RUST_LOG overrides).
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let Cli {
        data_dir,
        user,
        json,
        command,
    } = Cli::parse();

    let data_dir = match data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async move {
        let db = Database::new(data_dir.join("pacepod.sqlite3"))?;
        let settings = SettingsStore::new(data_dir.join("settings.json"))?;
        let user = UserContext::resolve(user, &settings)?;
        log::info!("PacePod starting for user {}", user.user_id());

        let state = AppState { db, settings, user };
        commands::dispatch(&state, command, json).await
    })
}
