pub mod commands;
pub mod watch;

use clap::{Parser, Subcommand};
use crate::config::Config;
use crate::error::Result;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "newsletter-finder")]
#[command(about = "Find pages with newsletter subscription forms")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a saved page and record it if it has a subscription form
    Scan {
        /// Saved HTML file
        file: PathBuf,

        /// Address the page was saved from
        #[arg(short, long)]
        url: String,
    },

    /// Keep re-classifying a page file while it changes
    Watch {
        /// HTML file to watch
        file: PathBuf,

        /// Address the page was saved from
        #[arg(short, long)]
        url: String,
    },

    /// List recorded sites, newest first
    List,

    /// Delete a recorded site
    Delete {
        /// Position as shown by `list` (starting at 1)
        index: usize,
    },

    /// Delete all recorded sites
    Clear,

    /// Export recorded sites to a text file
    Export {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::resolve(self.config.as_deref())?;
        commands::init_logging(self.debug, self.verbose, &config.logging)?;

        match self.command {
            Commands::Scan { file, url } => commands::scan(file, url, &config).await,
            Commands::Watch { file, url } => watch::watch(file, url, &config).await,
            Commands::List => commands::list(&config).await,
            Commands::Delete { index } => commands::delete(index, &config).await,
            Commands::Clear => commands::clear(&config).await,
            Commands::Export { output } => commands::export(output, &config).await,
            Commands::Completions { shell } => {
                commands::generate_completions(shell);
                Ok(())
            }
        }
    }
}
