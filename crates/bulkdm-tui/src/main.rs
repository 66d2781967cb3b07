use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bulkdm_core::{spawn_worker, Command, Config, Controller, HttpApiClient};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "bulkdm")]
#[command(about = "Terminal dashboard for a bulk direct-message automation backend")]
struct Cli {
    /// Backend base URL (overrides BULKDM_API_URL and the config file)
    #[arg(long)]
    api_url: Option<String>,
    /// Remember the resolved backend URL in the config file
    #[arg(long)]
    save: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, load_error) = Config::load_or_default();
    init_logging(&config)?;
    if let Some(err) = &load_error {
        warn!(error = %err, "could not read config file, using defaults");
    }

    let (api_base_url, source) = config
        .resolve_base_url(cli.api_url.as_deref())
        .context("invalid backend URL")?;
    info!(%api_base_url, source, "starting dashboard");

    if cli.save {
        if let Some(err) = load_error {
            return Err(err.context("refusing to overwrite an unreadable config file"));
        }
        config.api_base_url = Some(api_base_url.clone());
        config.save().context("could not save config")?;
    }

    let client = HttpApiClient::new(&api_base_url)?;
    let (mut handle, mut ui_events) = spawn_worker(Controller::new(client));
    // The backend is the only source of an existing session
    handle.submit(Command::CheckStatus)?;

    let mut app = App::new(handle, api_base_url);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            tokio::select! {
                Some(event) = events.next() => handler::handle_event(&mut app, event)?,
                Some(update) = ui_events.recv() => app.apply(update),
                else => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    info!("dashboard closed");
    result
}

/// The TUI owns stderr, so logs go to a file next to the config.
fn init_logging(config: &Config) -> Result<()> {
    let log_dir = Config::config_dir()?;
    std::fs::create_dir_all(&log_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("bulkdm.log"))
        .context("could not open log file")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_deref().unwrap_or("info")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    Ok(())
}
