use anyhow::Result;
use clap::{CommandFactory, Parser};
use scribed::cli::{Cli, Commands};
use scribed::config::Config;
use scribed::defaults;
use scribed::delivery::ResultStore;
use scribed::diagnostics::check_dependencies;
use scribed::gateway::ModelRegistry;
use scribed::server::{router, AppState};
use scribed::task::queue::job_queue;
use scribed::worker::Worker;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Check) => {
            let config = load_config(cli.config.as_deref())?;
            check_dependencies(&config);
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "scribed", &mut std::io::stdout());
        }
        None => {
            run_server(cli).await?;
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/scribed/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };
    Ok(config.with_env_overrides())
}

async fn run_server(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    eprintln!("{} starting", scribed::version_string());
    eprintln!(
        "scribed: loading model '{}' on {} ({})",
        config.models.model, config.models.device, config.models.compute_type
    );
    let registry = ModelRegistry::load(&config.models).await?;
    eprintln!("scribed: models loaded");

    let (queue, consumer) = job_queue();
    let store = ResultStore::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker = Worker::new(registry, store.clone(), config.clone(), cli.quiet)?;
    let worker_handle = tokio::spawn(worker.run(consumer, shutdown_rx));

    let state = AppState {
        queue,
        store,
        config: Arc::new(config.clone()),
    };
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    eprintln!(
        "scribed: listening on {}:{}",
        config.server.host, config.server.port
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            eprintln!("scribed: shutdown signal received");
        })
        .await?;

    // Let the job in flight finish, then abandon the rest of the queue
    let _ = shutdown_tx.send(true);
    match tokio::time::timeout(
        Duration::from_secs(defaults::SHUTDOWN_GRACE_SECS),
        worker_handle,
    )
    .await
    {
        Ok(_) => {}
        Err(_) => eprintln!("scribed: worker still busy after grace period, exiting"),
    }

    Ok(())
}
