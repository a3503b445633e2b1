use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use quotawatch::startup;
use quotawatch::ui::App;
use quotawatch_core::config::Config;
use quotawatch_core::usage::UsageClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Config::parse_args();

    // Setup logging
    if let Err(e) = setup_logging(cli.debug) {
        eprintln!("warning: logging disabled: {:#}", e);
    }

    // Load settings and token; any failure here is fatal before the UI starts
    let startup = match startup::prepare(&cli) {
        Ok(startup) => startup,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    for warning in &startup.warnings {
        eprintln!("{}", warning);
    }

    let client = UsageClient::new(startup.settings.client_config(startup.token))?;

    // Run the application
    let mut app = App::new(startup.settings);
    app.run(Arc::new(client)).await
}

/// Log to a file so output never interferes with the alternate screen
fn setup_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("quotawatch=debug,quotawatch_core=debug")
    } else {
        EnvFilter::new("quotawatch=info,quotawatch_core=info")
    };

    let dir = dirs::cache_dir()
        .context("No cache directory available")?
        .join("quotawatch");
    let file = open_log_file(&dir)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

/// Open `quotawatch.log` under `dir` for appending, keeping earlier runs
fn open_log_file(dir: &Path) -> Result<File> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory: {:?}", dir))?;
    let path = dir.join("quotawatch.log");
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {:?}", path))
}
