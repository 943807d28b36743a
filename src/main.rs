use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use daylog::{Level, LoggerConfig};

/// Pipe stdin into a logger
///
/// Usage: `daylog [CONFIG.toml]`. Each input line is logged at info level,
/// unless it starts with a level name followed by a colon (`warn: disk low`).
fn main() -> Result<()> {
    // Diagnostics about the logger itself go to stderr
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "daylog=warn".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => LoggerConfig::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => LoggerConfig::console(),
    };

    let logger = daylog::init_global_logger(&config).context("Failed to initialize logger")?;

    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read stdin")?;
        let (level, message) = split_level(&line);
        logger.log(level, message);
    }

    daylog::reset_global_logger();
    Ok(())
}

fn split_level(line: &str) -> (Level, &str) {
    if let Some((head, rest)) = line.split_once(':') {
        if let Ok(level) = head.parse::<Level>() {
            return (level, rest.trim_start());
        }
    }
    (Level::Info, line)
}
