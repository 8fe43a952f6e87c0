use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod common;
mod config;
mod docs;
mod infrastructure;
mod middleware;
mod modules;
mod routes;
mod state;
mod workers;

use cli::{Cli, Command};
use config::settings::AppConfig;
use infrastructure::mail::mailgun::MailgunNotifier;
use infrastructure::storage::s3::StorageService;
use modules::auth::repository::AccountRepository;
use state::AppState;
use workers::dispatcher::TaskDispatcher;
use workers::pipeline::Pipeline;
use workers::ytdl::YoutubeDl;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command() {
        Command::HashPassword { password } => {
            println!("{}", common::security::hash_password(&password)?);
            Ok(())
        }
        Command::Serve => serve().await,
    }
}

async fn serve() -> anyhow::Result<()> {
    info!("Starting server...");

    let config = AppConfig::new().context("loading configuration")?;
    let accounts = AccountRepository::load(&config.accounts_file)?;

    let storage = StorageService::new(&config.storage)?;
    let notifier = MailgunNotifier::new(&config.mailgun)?;

    let ytdl = Arc::new(YoutubeDl::new(&config.downloader));
    match ytdl.locate() {
        Some(path) => info!("Using downloader at {}", path.display()),
        None => warn!("{} not found in PATH, downloads will fail", config.downloader.program),
    }

    tokio::fs::create_dir_all(&config.downloader.work_dir)
        .await
        .with_context(|| format!("creating work dir {}", config.downloader.work_dir.display()))?;

    let pipeline = Pipeline::new(
        ytdl.clone(),
        ytdl,
        Arc::new(storage),
        Arc::new(notifier),
        config.downloader.work_dir.clone(),
    );
    let scheduler = Arc::new(TaskDispatcher::new(Arc::new(pipeline)));

    let addr = format!("0.0.0.0:{}", config.server_port);
    let state = AppState::new(config, accounts, scheduler);
    let app = app::create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
