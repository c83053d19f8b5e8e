use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use artifex_core::{
    save_artifact, ClaudeClient, Config, Controller, CredentialStore, SandboxedPreview, TurnOutcome,
};

mod app;
mod handler;
mod platform;
mod tui;
mod ui;

use app::App;

const TICK_RATE: Duration = Duration::from_millis(300);

#[derive(Parser)]
#[command(name = "artifex")]
#[command(about = "Describe an app, get a working single-file HTML preview")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model to request, overriding the settings file
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Directory for the sandboxed preview page
    #[arg(long, global = true)]
    preview_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one app without the interactive UI
    Generate {
        /// What to build
        prompt: String,
        /// Directory to save generated-app.html into
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    init_logging(&config_path)?;

    let mut config = Config::load_from(&config_path)?;
    if let Some(model) = cli.model {
        config.model = Some(model);
    }
    if let Some(dir) = cli.preview_dir {
        config.preview_dir = Some(dir);
    }

    let credential_store = CredentialStore::at(&config_path);
    let loaded = credential_store.load_with_env()?;
    let credential_source = loaded.as_ref().map(|(_, source)| *source);
    let credential = loaded.map(|(credential, _)| credential);

    let client = ClaudeClient::from_config(&config)?;
    log::info!("Starting with model {} against {}", client.model(), client.endpoint());

    let preview = SandboxedPreview::new(&config.preview_dir()?);
    let preview_path = preview.path().to_path_buf();
    let controller = Controller::new(Arc::new(client), Box::new(preview), credential);

    match cli.command {
        Some(Commands::Generate { prompt, out }) => {
            run_generate(controller, &prompt, out.as_deref(), &preview_path).await
        }
        None => {
            let app = App::new(&config, controller, credential_store, credential_source, preview_path);
            run_tui(app).await
        }
    }
}

/// The terminal belongs to the UI, so logs go to a file next to the settings.
fn init_logging(config_path: &Path) -> Result<()> {
    let log_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join("artifex.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Could not open log file {}", log_path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();
    Ok(())
}

async fn run_tui(mut app: App) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new(TICK_RATE);

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

async fn run_generate(
    mut controller: Controller,
    prompt: &str,
    out: Option<&Path>,
    preview_path: &Path,
) -> Result<()> {
    eprintln!("Generating...");
    let outcome = controller.submit(prompt).await?;

    match outcome {
        TurnOutcome::Rendered { .. } => {
            println!("Preview written to {}", preview_path.display());
        }
        TurnOutcome::RenderFailed { message, .. } => {
            eprintln!("Preview not updated: {}", message);
        }
        TurnOutcome::Failed(err) => return Err(anyhow!("{}", err)),
        TurnOutcome::Stale => {}
    }

    if let (Some(dir), Some(artifact)) = (out, controller.artifact()) {
        let path = save_artifact(artifact, dir)?;
        println!("Saved {}", path.display());
    }
    Ok(())
}
