mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use client::Navigator;
use engine::store::JsonFileStore;

use crate::{
    cli::{Cli, Command},
    commands::Context,
    config::AppConfig,
    error::{AppError, Result, message_for_error},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match config::load(&cli.global) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", message_for_error(&err));
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "budgetdesk={level},client={level},engine={level}",
            level = config.log_level
        ))
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", message_for_error(&err));
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: AppConfig) -> Result<()> {
    let store = Arc::new(JsonFileStore::open(&config.state_path)?);
    tracing::debug!(path = %store.path().display(), "local state opened");
    let ctx = Context::new(config, store);
    let mut navigator = Navigator::new(ctx.api.tokens().clone(), commands::route_of(&command));

    match commands::dispatch(&ctx, command).await {
        Err(AppError::Client(err)) if err.is_auth() => {
            if navigator.handle_error(&err)? {
                tracing::info!(route = %navigator.current(), "session cleared");
            }
            Err(AppError::Client(err))
        }
        other => other,
    }
}
