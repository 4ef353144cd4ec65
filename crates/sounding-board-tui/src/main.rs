mod app;
mod handler;
mod tui;
mod ui;

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sounding_board_core::{ClientConfig, ProxyClient};

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "sounding-board")]
#[command(about = "Chat with your AI career coach from the terminal")]
struct Cli {
    /// Base URL of the Sounding Board server
    #[arg(short, long)]
    server: Option<String>,
    /// Directory where exported conversations are written
    #[arg(short, long)]
    export_dir: Option<PathBuf>,
}

/// Log to a file; the terminal belongs to the UI
fn init_logging() -> Result<()> {
    let Some(log_dir) = dirs::cache_dir().map(|d| d.join("sounding-board")) else {
        return Ok(());
    };
    std::fs::create_dir_all(&log_dir)?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("sounding-board.log"))
        .context("Failed to open log file")?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = init_logging() {
        eprintln!("Logging disabled: {:#}", e);
    }

    let config = ClientConfig::load().unwrap_or_else(|e| {
        log::warn!("Ignoring unreadable config: {:#}", e);
        ClientConfig::new()
    });

    let server_url = cli.server.unwrap_or_else(|| config.server_url());
    let export_dir = cli.export_dir.unwrap_or_else(|| config.export_dir());
    log::info!("using chat server {}", server_url);

    let mut app = App::new(ProxyClient::new(&server_url), export_dir);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event).await?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}
