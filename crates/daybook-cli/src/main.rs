//! daybook: command-line day journal
//!
//! Keeps a local snapshot of the journal in the data directory and syncs
//! with the journal backend when logged in. See `daybook --help`.

mod cli;
mod config;

use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

use cli::{execute_command, Commands, Context};
use config::Config;

#[derive(Parser)]
#[command(name = "daybook")]
#[command(about = "A day journal: one entry, one mood per day")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "daybook.toml")]
    config: PathBuf,

    /// Data directory (overrides config file)
    #[arg(short, long, env = "DAYBOOK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Journal server URL (overrides config file)
    #[arg(long, env = "DAYBOOK_SERVER_URL")]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("daybook=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    debug!(config = %cli.config.display(), "Loading config");

    let mut config = Config::load(&cli.config)?;

    // Apply CLI overrides
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }
    if let Some(server) = cli.server {
        config.server.base_url = server;
    }

    info!(
        server = %config.server.base_url,
        data_dir = %config.storage.data_dir.display(),
        "Starting daybook"
    );

    let ctx = Context::new(config)?;
    match execute_command(&ctx, cli.command).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
