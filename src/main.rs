use std::process;
use clap::Parser;

use newsletter_finder::cli::Cli;

#[tokio::main]
async fn main() {
    // Environment overrides may live in a local .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = cli.run().await {
        eprintln!("Error [{}]: {}", e.error_code(), e);
        process::exit(1);
    }
}
