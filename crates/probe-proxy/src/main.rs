use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};

use probe_proxy::{router, ProxyConfig};

#[derive(Parser)]
#[command(name = "probe-proxy")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serve the probe UI and forward chat requests to Anthropic", long_about = None)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    probe_core::init_tracing(args.json, level);

    let config = ProxyConfig::from_env().context("Proxy configuration is incomplete")?;
    let app = router(config)?;

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(address = %addr, "serving consciousness forge at http://{addr}/consciousness-forge");

    axum::serve(listener, app).await.context("Proxy server failed")?;
    Ok(())
}
