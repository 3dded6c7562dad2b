use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, info};

use crate::badge::TracingBadge;
use crate::classifier::Classifier;
use crate::cli::Cli;
use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use crate::export;
use crate::page::Page;
use crate::storage::{InsertOutcome, JsonFileStore, SiteRecord, SiteRepository};

/// Classify a saved page and record it on a match
pub async fn scan(file: PathBuf, url: String, config: &Config) -> Result<()> {
    info!("Scanning {} as {}", file.display(), url);

    let html = fs::read_to_string(&file)?;
    let page = Page::parse(&url, &html)?;
    let classifier = Classifier::new()?;

    let Some(detection) = classifier.detect(&page) else {
        println!("No newsletter/subscribe block found on {}", url);
        return Ok(());
    };

    println!("✓ Subscription block found: {}", detection.element);
    println!(
        "   email input: {}, keyword: {}, platform: {}, subscribe button: {}",
        detection.signals.has_email_input,
        detection.signals.has_keyword,
        detection.signals.is_platform_like,
        detection.signals.has_subscribe_button
    );

    let record = SiteRecord::from_page(&page);
    let title = record.title.clone();

    let repo = open_repository(config)?;
    match repo.insert_unique(record).await? {
        InsertOutcome::Inserted { total } => {
            println!("✅ Saved \"{}\" ({} sites recorded)", title, total)
        }
        InsertOutcome::Duplicate => println!("Already saved: {}", url),
    }

    Ok(())
}

/// Print recorded sites, newest first
pub async fn list(config: &Config) -> Result<()> {
    let repo = open_repository(config)?;
    let sites = repo.list().await?;

    if sites.is_empty() {
        println!("📋 Nothing found yet.");
        println!("   Scan pages with: newsletter-finder scan <file> --url <url>");
        return Ok(());
    }

    println!("📋 Sites with newsletter forms ({}):", sites.len());
    for (i, site) in sites.iter().enumerate() {
        println!("\n{}. {}", i + 1, site.title);
        println!("   {} · {}", site.discovered_at, site.display_hostname());
        println!("   {}", site.url);
    }

    Ok(())
}

/// Delete the site at 1-based `index`
pub async fn delete(index: usize, config: &Config) -> Result<()> {
    let position = index
        .checked_sub(1)
        .ok_or_else(|| Error::Invalid("positions start at 1".to_string()))?;

    let repo = open_repository(config)?;
    let removed = repo.delete(position).await?;

    println!("✅ Deleted: {} ({})", removed.title, removed.url);
    Ok(())
}

pub async fn clear(config: &Config) -> Result<()> {
    let repo = open_repository(config)?;
    let removed = repo.clear().await?;

    println!("✅ List cleared ({} sites removed)", removed);
    Ok(())
}

pub async fn export(output: PathBuf, config: &Config) -> Result<()> {
    let repo = open_repository(config)?;
    let sites = repo.list().await?;

    let path = export::export_to_dir(&sites, &output)?;
    println!("✅ Exported {} sites to {}", sites.len(), path.display());
    Ok(())
}

/// Generate shell completions
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

/// Open the sites repository at the configured store path
pub fn open_repository(config: &Config) -> Result<SiteRepository> {
    let store = JsonFileStore::open(&config.storage.path)?;
    debug!("Using store {}", store.path().display());
    Ok(SiteRepository::new(Arc::new(store), Arc::new(TracingBadge)))
}

/// Initialize logging from the command-line flags and the logging config
pub fn init_logging(debug: bool, verbose: bool, logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        logging.level.as_str()
    };

    let filter = EnvFilter::try_new(level)
        .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", level, e)))?;

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(debug)
        .with_line_number(debug);

    let appender = if logging.log_to_file {
        let dir = log_dir()?;
        fs::create_dir_all(&dir)?;
        Some(tracing_appender::rolling::never(dir, &logging.log_file))
    } else {
        None
    };

    let installed = match (logging.json_format, appender) {
        (true, Some(appender)) => builder.json().with_writer(appender).try_init(),
        (true, None) => builder.json().try_init(),
        (false, Some(appender)) => builder.with_ansi(false).with_writer(appender).try_init(),
        (false, None) => builder.try_init(),
    };
    installed.map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))?;

    debug!("Logging initialized");
    Ok(())
}

fn log_dir() -> Result<PathBuf> {
    Ok(Config::data_dir()?.join("logs"))
}
