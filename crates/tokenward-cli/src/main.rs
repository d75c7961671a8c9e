mod backend;
mod cli;
mod commands;
mod config;
mod observability;
mod output;

use anyhow::Result;
use clap::Parser;

use cli::{BackendArg, Cli, Commands};
use crate::config::StorageBackend;
use output::print_error;

#[tokio::main]
async fn main() {
    // .env is optional
    if let Err(e) = dotenvy::dotenv()
        && !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
    {
        eprintln!("Warning: Failed to load .env file: {e}");
    }

    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = crate::config::load_config(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        cfg.storage.backend = match backend {
            BackendArg::Memory => StorageBackend::Memory,
            BackendArg::Postgres => StorageBackend::Postgres,
        };
        cfg.validate()?;
    }

    observability::init_tracing(&cfg.logging.level);
    tracing::debug!(backend = ?cfg.storage.backend, "Configuration loaded");

    match &cli.command {
        Commands::Migrate => commands::admin::migrate(&cfg).await?,
        Commands::Config => commands::admin::show_config(&cfg)?,
        Commands::Demo(args) => commands::demo::run(&cfg, &args.user).await?,
        Commands::Issue(args) => {
            let service = backend::token_service(&cfg).await?;
            commands::tokens::issue(&service, args).await?;
        }
        Commands::Refresh(args) => {
            let service = backend::token_service(&cfg).await?;
            commands::tokens::refresh(&service, args).await?;
        }
        Commands::Rotate(args) => {
            let service = backend::token_service(&cfg).await?;
            commands::tokens::rotate(&service, args).await?;
        }
        Commands::Authenticate(args) => {
            let service = backend::token_service(&cfg).await?;
            commands::tokens::authenticate(&service, args).await?;
        }
        Commands::Logout(args) => {
            let service = backend::token_service(&cfg).await?;
            commands::tokens::logout(&service, args).await?;
        }
        Commands::LogoutAll(args) => {
            let service = backend::token_service(&cfg).await?;
            commands::tokens::logout_all(&service, args).await?;
        }
        Commands::Sessions(args) => {
            let service = backend::token_service(&cfg).await?;
            commands::tokens::sessions(&service, args).await?;
        }
    }

    Ok(())
}
