use clap::{Parser, Subcommand};
use fdg_scraper::apis::aranjuez::AranjuezCrawler;
use fdg_scraper::config::Config;
use fdg_scraper::logging;
use fdg_scraper::pipeline::{run_update, UpdateOptions};
use std::path::PathBuf;
use std::time::Duration;
use tracing::error;

#[derive(Parser)]
#[command(name = "fdg_scraper")]
#[command(about = "Aranjuez on-duty pharmacy schedule scraper")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the schedule page and refresh the duty calendar
    Update {
        /// Pharmacy registry JSON (overrides config)
        #[arg(long)]
        registry: Option<PathBuf>,
        /// Output calendar JSON (overrides config)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Update { registry, output } => {
            println!("🔄 Updating on-duty pharmacy calendar...");

            let options = UpdateOptions {
                registry_file: registry.unwrap_or_else(|| PathBuf::from(&config.registry_file)),
                calendar_file: output.unwrap_or_else(|| PathBuf::from(&config.calendar_file)),
                fetch_retries: config.fetch_retries,
            };
            let source = AranjuezCrawler::with_url(
                config.source_url.clone(),
                Duration::from_secs(config.timeout_seconds),
            )?;

            match run_update(&source, &options).await {
                Ok(result) => {
                    println!("\n📊 Update results:");
                    println!("   Extracted entries: {}", result.extracted);
                    println!("   Calendar dates:    {}", result.matched_dates);
                    println!("   Unmatched entries: {}", result.unmatched);
                    match result.output_file {
                        Some(path) => println!("   Output file:       {}", path.display()),
                        None => println!("   Output file:       (not written)"),
                    }
                }
                Err(e) => {
                    error!("Update failed: {}", e);
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}
