//! join - A kanban task board backed by a Firebase Realtime Database.
//!
//! This binary loads the board, repairs legacy tasks, and prints it.

mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use join_board::{Board, Outcome, TaskRepository};
use join_config::Config;
use join_protocol::Intent;
use join_protocol::dummy::sample_collection;
use join_store::{HttpStore, MemoryStore, RemoteStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Print the join task board.
#[derive(Parser, Debug)]
#[command(name = "join", version, about)]
struct Args {
    /// Read configuration from this file instead of the default locations.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use built-in sample tasks instead of the remote store.
    #[arg(long)]
    demo: bool,

    /// Only show tasks whose title or description contains this text.
    #[arg(long)]
    search: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(config.log_filter()).context("invalid log filter")?)
        .with_writer(std::io::stderr)
        .init();

    let store = open_store(&config, args.demo).await?;
    let board = Board::new(TaskRepository::new(store, config.store.tasks_path.clone()));

    if let Outcome::Failed(reason) = board.dispatch(Intent::Load).await? {
        anyhow::bail!("could not load tasks: {reason}");
    }
    if let Outcome::Repaired(report) = board.dispatch(Intent::Repair).await?
        && report.failed > 0
    {
        tracing::warn!(failed = report.failed, "some legacy tasks could not be repaired");
    }
    if let Some(query) = args.search {
        board.dispatch(Intent::Search { query }).await?;
    }

    println!("{}", render::render_board(&board.view(), &board.summary().await));
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let Some(path) = &args.config else {
        return Config::load().context("failed to load configuration");
    };
    let mut config = Config::load_from(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    config.apply_overrides(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

async fn open_store(config: &Config, demo: bool) -> anyhow::Result<Arc<dyn RemoteStore>> {
    if demo {
        info!("using built-in sample tasks");
        let store = MemoryStore::new();
        store
            .put(&config.store.tasks_path, &sample_collection())
            .await?;
        store.clear_requests();
        return Ok(Arc::new(store));
    }

    info!(base_url = %config.store.base_url, "connecting to store");
    let store = HttpStore::new(
        &config.store.base_url,
        config.store.timeout(),
        config.store.retries,
    )?;
    Ok(Arc::new(store))
}
