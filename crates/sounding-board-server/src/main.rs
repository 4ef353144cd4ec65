use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sounding_board_core::AzureSettings;
use sounding_board_server::{router, AppState};

#[derive(Parser)]
#[command(name = "sounding-board-server")]
#[command(about = "Proxy that forwards Sounding Board chats to Azure OpenAI")]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "SOUNDING_BOARD_ADDR", default_value = "127.0.0.1:3000")]
    addr: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let settings = AzureSettings::from_env();
    let missing = settings.missing();
    if !missing.is_empty() {
        log::warn!(
            "Azure OpenAI credentials incomplete (missing {}); chat requests will fail",
            missing.join(", ")
        );
    }

    let app = router(Arc::new(AppState::new(settings)));

    let listener = tokio::net::TcpListener::bind(cli.addr)
        .await
        .with_context(|| format!("Failed to bind {}", cli.addr))?;
    log::info!("listening on {}", cli.addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
