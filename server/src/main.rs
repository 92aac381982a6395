use std::{fs::OpenOptions, net::{IpAddr, SocketAddr}, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use local_ip_address::local_ip;
use server::{server_state::ServerState, webhook_endpoint};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "server")]
#[command(about = "Receives planned trips over a webhook", long_about = None)]
struct Args {
    /// Address to bind. Defaults to this machine's local IP
    #[arg(long)]
    host: Option<IpAddr>,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, default_value = "server/log")]
    log_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    std::fs::create_dir_all(&args.log_dir).with_context(|| format!("Failed to create {}", args.log_dir.display()))?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(args.log_dir.join("server.log"))
        .context("Failed to open log file")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=trace,tower_http=debug", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        .init();

    tracing::info!("Starting server...");

    let server_state = Arc::new(ServerState::new());

    let app = webhook_endpoint::router(server_state).layer(TraceLayer::new_for_http());

    let ip = match args.host {
        Some(host) => host,
        None => local_ip().context("Failed to find local IP address")?,
    };

    let listener = tokio::net::TcpListener::bind(SocketAddr::from((ip, args.port))).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
