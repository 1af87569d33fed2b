use anyhow::Context;
use clap::Parser;
use lbx_config::Config;
use lbx_server::{load_config, Connectors, LockboxConfig, Services, ENV_PREFIX};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lockboxd", about = "Lockbox server", version)]
struct Cli {
    /// Prefix of the environment variables to read.
    #[arg(long, default_value = ENV_PREFIX)]
    prefix: String,

    /// Print every recognized environment variable and exit.
    #[arg(long)]
    describe_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    if cli.describe_config {
        for entry in LockboxConfig::schema(&cli.prefix) {
            println!("{entry}");
        }
        return Ok(());
    }

    let config = load_config(&cli.prefix).context("invalid configuration")?;
    let services = Services::from_config(&config, &Connectors::default())
        .await
        .context("failed to start services")?;

    services
        .logger
        .log("server.start", [("port", config.server.port.to_string())])
        .await?;
    info!(port = config.server.port, client_url = %config.server.client_url, "lockboxd ready");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}
