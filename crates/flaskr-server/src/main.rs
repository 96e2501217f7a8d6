//! flaskr binary: `serve` runs the HTTP server, `init-db` (re)creates the
//! database schema.

use clap::{Parser, Subcommand};
use flaskr_db::ScriptSchema;
use flaskr_server::{app, cli, config, AppState};
use std::net::SocketAddr;
use std::process::ExitCode;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// configuration file path; falls back to $FLASKR_CONFIG_PATH, then config.toml
    #[clap(short, long)]
    config: Option<String>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clear the existing data and create new tables.
    InitDb,

    /// Run the HTTP server.
    Serve,
}

fn resolve_config_path(flag: Option<String>) -> (String, &'static str) {
    if let Some(path) = flag.filter(|value| !value.trim().is_empty()) {
        return (path, "cli-arg");
    }

    if let Ok(path) = std::env::var("FLASKR_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (path, "env-var");
        }
    }

    ("config.toml".to_string(), "default")
}

fn init_tracing(logging: &config::LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so command output on stdout stays clean.
    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let (config_path, config_source) = resolve_config_path(cli.config);

    let (config, loaded_from) = match config::load_config(Some(&config_path)) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.logging);

    tracing::info!(
        source = config_source,
        path = %config_path,
        "resolved startup configuration path"
    );
    if loaded_from == config::ConfigSource::Defaults {
        tracing::info!(path = %config_path, "config file not found, using defaults");
    }

    if let Err(e) = config.database.ensure_parent_dir() {
        tracing::error!(path = %config.database.path, error = %e, "failed to create database directory");
        eprintln!("error: failed to create directory for '{}': {e}", config.database.path);
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::InitDb => {
            let settings = config.database.settings();
            tokio::task::spawn_blocking(move || {
                cli::run_init_db(settings, &ScriptSchema::default(), &mut std::io::stdout().lock())
                    .map_err(|e| e.to_string())
            })
            .await
            .unwrap_or_else(|e| Err(format!("init-db task failed: {e}")))
        }
        Commands::Serve => serve(config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn serve(config: config::Config) -> Result<(), String> {
    let app = app(AppState::from_config(&config));
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, database = %config.database.path, "starting flaskr server");

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("failed to bind to {addr}: {e}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("server error: {e}"))?;

    tracing::info!("flaskr server shut down");
    Ok(())
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_db_subcommand_is_kebab_case() {
        let cli = Cli::try_parse_from(["flaskr", "init-db"]).expect("should parse");
        assert!(matches!(cli.command, Commands::InitDb));
        assert!(cli.config.is_none());
    }

    #[test]
    fn config_flag_takes_precedence() {
        let cli = Cli::try_parse_from(["flaskr", "--config", "blog.toml", "serve"])
            .expect("should parse");
        assert!(matches!(cli.command, Commands::Serve));
        let (path, source) = resolve_config_path(cli.config);
        assert_eq!(path, "blog.toml");
        assert_eq!(source, "cli-arg");
    }
}
