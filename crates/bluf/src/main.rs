use anyhow::Result;
use bluf_common::{logger, AppConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            return None;
        }
    }
}

/// Load .env from the project root, falling back to the working directory
fn load_dotenv() {
    match find_project_root().map(|root| root.join(".env")) {
        Some(path) if path.exists() => {
            dotenv::from_path(&path).ok();
        }
        _ => {
            dotenv::dotenv().ok();
        }
    }
}

#[derive(Parser)]
#[command(name = "bluf")]
#[command(about = "BLUF - Bottom Line Up Front summarization service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides SERVER_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides SERVER_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    load_dotenv();

    let mut config = AppConfig::from_env()?;

    if let Some(Commands::Serve { host, port }) = cli.command {
        if let Some(host) = host {
            config.server_host = host;
        }
        if let Some(port) = port {
            config.server_port = port;
        }
        config.validate()?;
    }

    logger::setup_logging(&config)?;

    tracing::info!("BLUF starting...");
    tracing::info!("  Bind: {}", config.server_bind_address());
    tracing::info!("  Retries: {}, base delay: {}s", config.max_retries, config.retry_delay_secs);
    tracing::info!("  Cache capacity: {}", config.cache_capacity);
    tracing::info!("  Pool capacity: {}", config.pool_capacity);

    println!("Server listening on http://{}", config.server_bind_address());

    bluf_server::start_server(config).await?;

    Ok(())
}
