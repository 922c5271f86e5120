mod args;
mod config;
mod render;

use std::process::ExitCode;

use directory_core::{Directory, DirectoryError, Transport, UserId};
use tracing::{debug, error, info};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

use crate::{
    args::{Args, Command},
    config::Config,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match Args::parse() {
        Ok(args) => args,
        Err(e) => e.exit(),
    };

    let config = match Config::new(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load `Config`: {e}");
            return ExitCode::FAILURE;
        }
    };

    let level = tracing::Level::from(config.log.level);
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(level).into())
                .from_env_lossy(),
        )
        .init();

    let directory = Directory::connect(&config.api.base_url);
    let mut changes = directory.subscribe();
    let watcher = tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let (users, pending) = {
                let state = changes.borrow_and_update();
                (state.users.len(), state.pending().count())
            };
            debug!(users, pending, "state changed");
        }
    });

    let result = run(&directory, args.command).await;
    print!("{}", render::render(&directory.snapshot()));
    drop(directory);
    let _ = watcher.await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Loads the collection, then performs `command` through the form helpers.
async fn run<T: Transport>(directory: &Directory<T>, command: Command) -> Result<(), DirectoryError> {
    directory.load().await?;

    match command {
        Command::List => {}
        Command::Create { name, email } => {
            directory.set_draft(&name, &email);
            let user = directory.submit_create().await?;
            info!(id = %user.id, "created");
        }
        Command::Update { id, name, email } => {
            let id = UserId(id);
            directory.begin_edit(id)?;
            let current = directory
                .snapshot()
                .editing()
                .cloned()
                .ok_or(DirectoryError::NotEditing)?;
            directory.set_edit(
                name.as_deref().unwrap_or(&current.name),
                email.as_deref().unwrap_or(&current.email),
            )?;
            directory.submit_edit().await?;
            info!(%id, "updated");
        }
        Command::Delete { id } => {
            let id = directory.delete(UserId(id)).await?;
            info!(%id, "deleted");
        }
    }
    Ok(())
}
