//! StudyMetrics gateway CLI entry point.
//!
//! Loads configuration, installs logging and runs the HTTP server until a
//! termination signal drains it.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use study_gateway_common::{ConfigFile, GatewayConfig};
use study_gateway_server::GatewayServer;
use study_gateway_server::collaborators::unconfigured_routes;

const DEFAULT_LOG_FILTER: &str = "info,study_gateway=debug,tower_http=debug";

#[derive(Debug, Parser)]
#[command(name = "study-gateway", version, about)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, env = "STUDY_GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the HTML pages and static assets.
    #[arg(long)]
    public_dir: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<GatewayConfig> {
        let mut config = match &self.config {
            Some(path) => {
                ConfigFile::from_file(path)
                    .with_context(|| format!("Failed to load {}", path.display()))?
                    .server
            }
            None => GatewayConfig::default(),
        };

        if let Some(dir) = &self.public_dir {
            config = config.with_public_dir(dir);
        }

        config.apply_env().context("Invalid environment override")
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    info!("Starting StudyMetrics gateway");

    let config = cli.load_config()?;
    info!(
        bind_addr = %config.bind_addr(),
        public_dir = %config.public_dir.display(),
        "Configuration loaded"
    );

    let server = GatewayServer::new(config, unconfigured_routes());
    server.run().await.context("Server failed")?;

    Ok(())
}
