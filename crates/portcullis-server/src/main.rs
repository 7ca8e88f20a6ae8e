use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod error;
mod middleware;
mod routes;
mod state;

#[derive(Parser, Debug)]
#[command(name = "portcullis-server", version, about = "Portcullis authentication server")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server.
    Serve {
        /// Config file, defaults to $PORTCULLIS_CONFIG or ./portcullis.toml
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Signing key management.
    Keys {
        #[command(subcommand)]
        cmd: KeysCommand,
    },
}

#[derive(Subcommand, Debug)]
enum KeysCommand {
    /// Generate a new token signing keypair.
    Generate {
        /// Directory for private.key and public.key; prints to stdout if unset
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match Cli::parse().cmd {
        Command::Serve { config } => serve(config).await,
        Command::Keys {
            cmd: KeysCommand::Generate { output },
        } => commands::keys::generate(output),
    }
}

async fn serve(config: Option<PathBuf>) -> anyhow::Result<()> {
    let config = config::load_config(config)?;
    let state = state::AppState::from_config(&config)?;
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("portcullis-server listening on {}", config.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}
