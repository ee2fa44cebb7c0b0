// Deploykit
// Main entry point for the deploykit binary

use clap::Parser;
use deploykit_engine::cli::{Cli, Command, ConfigAction};
use deploykit_engine::handlers::{
    handle_build, handle_config_show, handle_upload, load_config, OutputFormat,
};
use deploykit_engine::telemetry::{init_telemetry, init_telemetry_with_level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let config = match load_config(&cli.project, cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_telemetry();
            return Err(e);
        }
    };

    // --log wins over the config file; RUST_LOG wins over both
    init_telemetry_with_level(cli.log.as_deref().unwrap_or(&config.core.log_level));

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("Deploykit v{} ({} - {})", version, commit, timestamp);

    // Handle commands
    match cli.command {
        Command::Build { transformer } => {
            tracing::info!("Building {}", cli.project.display());
            handle_build(&cli.project, transformer, &config, format).await
        }

        Command::Upload { dir, endpoint } => {
            handle_upload(&cli.project, dir, endpoint, &config, format).await
        }

        Command::Config { action } => match action {
            ConfigAction::Show => handle_config_show(&config, format),
        },
    }
}
