use bms_scraper::config::{default_date_code, Config};
use bms_scraper::fetch::BmsApi;
use bms_scraper::logging;
use bms_scraper::pipeline::Orchestrator;
use clap::Parser;
use std::sync::Arc;
use tracing::error;

#[derive(Parser)]
#[command(name = "bms_scraper")]
#[command(about = "Per-venue showtime availability scraper and aggregator")]
#[command(version = "0.1.0")]
struct Cli {
    /// Shard number; selects the venue roster and output file suffixes
    #[arg(long)]
    shard: Option<u32>,

    /// Target date code (YYYYMMDD); defaults to tomorrow in IST
    #[arg(long)]
    date: Option<String>,

    /// Venue roster file; defaults to venues{shard}.json
    #[arg(long)]
    venues: Option<String>,

    /// Root directory for output artifacts
    #[arg(long)]
    data_dir: Option<String>,

    /// Config file path
    #[arg(long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(shard) = cli.shard {
        config.shard = shard;
    }
    if let Some(venues) = cli.venues {
        config.venues_file = Some(venues);
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    let date_code = cli.date.unwrap_or_else(default_date_code);

    let log_dir = config.run_dir(&date_code).join("logs");
    logging::init_logging(&log_dir.to_string_lossy());

    println!("🚀 Starting showtime collection for {date_code} (shard {})", config.shard);

    let orchestrator = Orchestrator::new(config, Arc::new(BmsApi::new()));
    match orchestrator.run(&date_code).await {
        Ok(result) => {
            println!("\n📊 Run results:");
            println!("   Venues: {}/{} fetched", result.fetched_venues, result.total_venues);
            println!("   Shows: {}", result.records);
            println!("   Movies: {}", result.movies);
            if !result.failures.is_empty() {
                println!("   Failures:");
                for (kind, count) in &result.failures {
                    println!("     - {kind}: {count}");
                }
            }
            println!("   Detailed file: {}", result.detailed_file);
            println!("   Summary file: {}", result.summary_file);
        }
        Err(e) => {
            error!("Run failed: {}", e);
            println!("❌ Run failed: {e}");
            std::process::exit(1);
        }
    }
    Ok(())
}
