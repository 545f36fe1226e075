mod config;
mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use forecast::{ForecastFetcher, ForecastTool};
use mcp::{Dispatcher, ServerInfo, SseTransport};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{API_KEY_ENV, Config, DEFAULT_CONFIG_FILE, Transport};
use error::{Error, Result};

const SERVER_NAME: &str = "weather";

#[derive(Parser, Debug)]
#[command(name = "qweather-mcp")]
#[command(about = "MCP server exposing QWeather 7-day forecasts", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./qweather-mcp.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Transport to serve on
    #[arg(short, long, value_enum)]
    transport: Option<Transport>,

    /// Listen address for the SSE transport
    #[arg(short, long)]
    bind: Option<String>,

    /// Upstream request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(transport) = self.transport {
            config.server.transport = transport;
        }
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(timeout) = self.timeout_secs {
            config.qweather.timeout_secs = timeout;
        }
    }
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    config.apply_env(|name| std::env::var(name).ok());
    cli.apply(&mut config);

    if !config.has_api_key() {
        warn!("{API_KEY_ENV} is not set; upstream requests will be sent without a key");
    }

    let fetcher = ForecastFetcher::new(config.forecast_config()?)?;
    let mut dispatcher = Dispatcher::new(
        ForecastTool::new(fetcher),
        ServerInfo::new(SERVER_NAME, env!("CARGO_PKG_VERSION")),
    );
    if let Some(instructions) = config.server.instructions.take() {
        dispatcher = dispatcher.with_instructions(instructions);
    }

    match config.server.transport {
        Transport::Sse => {
            SseTransport::new(config.server.bind)
                .serve(Arc::new(dispatcher), shutdown_signal())
                .await?;
        }
        Transport::Stdio => mcp::serve_stdio(&dispatcher).await?,
    }

    info!("server stopped");
    Ok(())
}

/// Explicit `--config` must exist; the default file is optional.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) if !path.exists() => Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        }),
        Some(path) => Ok(Config::load(path)?),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                info!(path = DEFAULT_CONFIG_FILE, "loading config");
                Ok(Config::load(default)?)
            } else {
                Ok(Config::default())
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
