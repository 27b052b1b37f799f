use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context, Result};

use tierlog::{config, Config, Level, Logger};

/// Log every stdin line at the level given as the only argument (default: info)
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tierlog=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let level = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<Level>()
            .with_context(|| format!("Invalid level argument: {}", arg))?,
        None => Level::Info,
    };

    let config_path = std::env::var_os("TIERLOG_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(config::config_file_path);
    let config = Config::load_from(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let logger = Logger::from_config(&config).context("Failed to initialize logger")?;
    tracing::info!("Logging to: {}", logger.dir().display());

    for line in std::io::stdin().lock().lines() {
        let line = line.context("Failed to read stdin")?;
        logger.log(level, None, format_args!("{}", line));
    }

    logger.close();
    Ok(())
}
