//! Merge guard demo entry point: status API server and terminal status watcher.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use merge_guard_demo::api::{create_router, serve_until, AppState};
use merge_guard_demo::client::{render, Poller, StatusClient, ViewState};
use merge_guard_demo::config::{Config, Environment};
use merge_guard_demo::metrics;
use merge_guard_demo::utils::shutdown_signal;

/// Status API and polling client for the merge guard demo.
#[derive(Parser, Debug)]
#[command(name = "merge-guard-demo")]
#[command(about = "Process status API with a polling terminal client")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the status API server (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Poll the status API and render it in the terminal.
    Watch {
        /// Base URL of the API (overrides API_URL).
        #[arg(long)]
        api_url: Option<String>,

        /// Seconds between fetches (overrides POLL_INTERVAL_SECS).
        #[arg(long)]
        interval: Option<u64>,

        /// Fetch once, print, and exit.
        #[arg(long)]
        once: bool,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    let config = Config::load();
    let (env, filter) = match &config {
        Ok(c) => (c.app_env, c.log_filter(args.verbose)),
        Err(_) => (Environment::default(), Config::default().log_filter(args.verbose)),
    };

    // Initialize logging
    init_logging(&filter, env);

    let config = config.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    // Handle subcommands
    match args.command {
        Some(Command::Serve { port }) => cmd_serve(config, port.or(args.port)).await,
        Some(Command::Watch {
            api_url,
            interval,
            once,
        }) => cmd_watch(config, api_url, interval, once).await,
        Some(Command::CheckConfig) => cmd_check_config(&config),
        None => cmd_serve(config, args.port).await,
    }
}

/// Human-readable logs in development, JSON lines in production.
fn init_logging(directive: &str, env: Environment) {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));

    match env {
        Environment::Development => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init(),
        Environment::Production => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
    }
}

/// Check configuration validity.
fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("MERGE GUARD DEMO - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Environment: {}", config.app_env);
    println!("  Version: {}", config.version());
    println!("  Listen: {}:{}", config.host, config.port);
    println!("  CORS Origin: {}", config.frontend_url);
    println!("  Shutdown Grace: {}s", config.shutdown_grace_secs);
    match config.metrics_port {
        Some(port) => println!("  Metrics: port {}", port),
        None => println!("  Metrics: Disabled"),
    }
    println!("  API URL: {}", config.api_url);
    println!("  Poll Interval: {}s", config.poll_interval_secs);
    println!("  Log Filter: {}", config.log_filter(false));
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run the status API until SIGINT/SIGTERM.
async fn cmd_serve(mut config: Config, port_override: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port_override {
        config.port = port;
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    // Initialize metrics
    metrics::init_metrics();
    if let Some(metrics_port) = config.metrics_port {
        metrics::install_exporter(SocketAddr::from(([0, 0, 0, 0], metrics_port)))?;
    }

    let state = AppState::from_config(&config)?;
    let router = create_router(state);

    let addr = config.bind_addr().map_err(anyhow::Error::msg)?;
    let listener = TcpListener::bind(addr).await?;

    info!("Backend server running on {}", addr);
    info!("Health check available at http://localhost:{}/health", config.port);
    info!("Environment: {}", config.app_env);
    info!("Version: {}", config.version());

    serve_until(listener, router, shutdown_signal(), config.shutdown_grace()).await?;
    Ok(())
}

/// Poll `/health` and print every view change.
async fn cmd_watch(
    mut config: Config,
    api_url: Option<String>,
    interval: Option<u64>,
    once: bool,
) -> anyhow::Result<()> {
    if let Some(url) = api_url {
        config.api_url = url;
    }
    if let Some(secs) = interval {
        config.poll_interval_secs = secs;
    }

    config.validate().map_err(anyhow::Error::msg)?;
    metrics::init_metrics();

    let client = StatusClient::new(&config)?;
    info!("Polling {} every {}s", client.health_url(), config.poll_interval_secs);

    if once {
        let mut state = ViewState::default();
        state.begin_fetch();
        let result = client.fetch_health().await;
        let failed = result.is_err();
        state.apply(result);

        println!("{}", render(state.view()));
        if failed {
            return Err(anyhow::anyhow!("Backend status unavailable"));
        }
        return Ok(());
    }

    let handle = Poller::new(Arc::new(client), config.poll_interval()).start();
    let mut rx = handle.subscribe();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut last_rendered = String::new();
    loop {
        let rendered = render(rx.borrow_and_update().view());
        if rendered != last_rendered {
            println!("----------------------------------------------------------------------");
            println!("{}", rendered);
            last_rendered = rendered;
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = &mut shutdown => break,
        }
    }

    handle.stop().await;
    Ok(())
}
