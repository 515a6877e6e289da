use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;

use bookforge::app::{AppState, router};
use bookforge::config::Config;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct AppArgs {
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// YAML config file (also read from `BOOKFORGE_CONFIG`).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    bookforge::logging::init()?;

    let args = AppArgs::parse();
    tracing::info!(?args, "starting bookforge-app");

    let config = Config::load(args.config.as_deref()).context("load config")?;
    tracing::info!(
        projects_dir = %config.projects_dir.display(),
        output_dir = %config.output_dir.display(),
        offline = config.is_offline(),
        "configuration loaded"
    );
    let app = router(AppState::new(config)?);

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", args.addr))?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("install ctrl-c handler: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
