/*
[INPUT]:  CLI arguments, optional YAML configuration file, OS shutdown signals
[OUTPUT]: Relayer socket events logged until shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use aqueduct_client::{Aqueduct, ClientConfig, ConnectionState};
use aqueduct_watch::{Output, Overrides, WatchConfig, subscribe_all, unsubscribe_all};

#[derive(Parser, Debug)]
#[command(name = "aqueduct-watch", version, about = "Watch Aqueduct relayer socket events")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long, value_name = "HOST")]
    host: Option<String>,
    #[arg(long = "api-key-id", value_name = "ID")]
    api_key_id: Option<String>,
    #[arg(long = "socket-url", value_name = "URL")]
    socket_url: Option<String>,
    /// Watch every account channel for this address (repeatable)
    #[arg(long = "account", value_name = "ADDRESS")]
    accounts: Vec<String>,
    /// Watch pair channels, given as MAKER_TOKEN:TAKER_TOKEN (repeatable)
    #[arg(long = "pair", value_name = "MAKER:TAKER")]
    pairs: Vec<String>,
    #[arg(long)]
    ticker: bool,
    /// Print raw events as JSON lines on stdout
    #[arg(long)]
    json: bool,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[arg(long = "dry-run")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    info!(
        config_path = ?args.config_path,
        dry_run = args.dry_run,
        "starting aqueduct-watch"
    );

    let config = load_config(&args)?;
    config.validate().context("validate configuration")?;
    info!(
        subscription_count = config.subscriptions.len(),
        "configuration loaded"
    );

    let client_config = config.client_config(ClientConfig::from_env());
    if args.dry_run {
        info!(
            socket_url = %client_config.socket_url().context("socket url")?,
            "dry-run requested; configuration validated"
        );
        return Ok(());
    }

    let client = Aqueduct::initialize(client_config).context("initialize client")?;
    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    if let Some(state) = client.connection_state() {
        spawn_state_logger(state, shutdown.clone());
    }

    let output = if args.json { Output::Json } else { Output::Log };
    let handles = subscribe_all(client.events(), &config.subscriptions, output)
        .context("subscribe to channels")?;
    info!(channels = handles.len(), "subscriptions registered");

    shutdown.cancelled().await;
    info!("shutdown signal received");

    let failed = unsubscribe_all(handles);
    if failed > 0 {
        warn!(failed, "some unsubscribe frames were not sent");
    }
    client.close().await;
    info!("socket closed");

    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn load_config(args: &Cli) -> Result<WatchConfig> {
    let base = match &args.config_path {
        Some(path) => {
            let path_str = path.to_str().context("config path must be valid utf-8")?;
            WatchConfig::from_file(path_str).context("load config")?
        }
        None => WatchConfig::default(),
    };

    base.merge(Overrides {
        host: args.host.clone(),
        api_key_id: args.api_key_id.clone(),
        socket_url: args.socket_url.clone(),
        accounts: args.accounts.clone(),
        pairs: args.pairs.clone(),
        ticker: args.ticker,
    })
}

fn spawn_state_logger(
    mut state: tokio::sync::watch::Receiver<ConnectionState>,
    shutdown: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    match *state.borrow_and_update() {
                        ConnectionState::Connected => info!("socket connected"),
                        ConnectionState::Connecting => info!("socket connecting"),
                        ConnectionState::Disconnected { retry_count } => {
                            warn!(retry_count, "socket disconnected")
                        }
                    }
                }
            }
        }
    });
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
