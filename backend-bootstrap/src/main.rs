use anyhow::Result;
use clap::Parser;

use backend_infrastructure::{AppConfig, CONFIG_PATH_ENV};

#[derive(Parser, Debug)]
#[command(name = "hoard-backend")]
#[command(about = "Hoard game economy backend", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var(CONFIG_PATH_ENV, config);
    }

    let config = AppConfig::load().await?;
    let _log_guard = backend_bootstrap::logging::init_tracing(config.log_dir.as_deref())?;

    backend_bootstrap::run_standalone(config).await
}
