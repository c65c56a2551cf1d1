use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use gigradar::config::{Secrets, Settings};
use gigradar::logging::init_logging;
use gigradar::pipeline::Aggregator;
use gigradar::providers::spotify::SpotifyClient;
use gigradar::providers::ticketmaster::TicketmasterClient;

#[derive(Parser)]
#[command(name = "gigradar")]
#[command(about = "Ranks upcoming live events against your music taste")]
#[command(version = "0.1.0")]
struct Cli {
    /// User location as "lat,lon", overriding config.toml
    #[arg(long)]
    geo: Option<String>,

    /// Search radius in miles (provider accepts 1-200)
    #[arg(long)]
    radius: Option<u32>,

    /// How many days ahead to search
    #[arg(long)]
    days: Option<i64>,

    /// Cap on the ranked output
    #[arg(long)]
    limit: Option<usize>,

    /// Comma-separated artist names to exclude from the pool
    #[arg(long)]
    ignore: Option<String>,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_logging();

    if let Err(e) = run(Cli::parse()).await {
        // Single message out; internal partial state stays internal
        error!("{}", e);
        eprintln!("gigradar: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> gigradar::error::Result<()> {
    let mut settings = Settings::load()?;
    if let Some(geo) = cli.geo {
        settings.geo_point = geo;
    }
    if let Some(radius) = cli.radius {
        settings.radius_miles = radius;
    }
    if let Some(days) = cli.days {
        settings.lookahead_days = days;
    }
    if let Some(limit) = cli.limit {
        settings.max_results = limit;
    }
    if let Some(ignore) = cli.ignore {
        settings
            .ignore_artists
            .extend(ignore.split(',').map(|s| s.trim().to_string()));
    }

    let secrets = Secrets::from_env()?;
    let aggregator = Aggregator::new(
        Arc::new(SpotifyClient::new(secrets.spotify_token)),
        Arc::new(TicketmasterClient::new(secrets.ticketmaster_key)),
        settings,
    );

    let ranked = aggregator.recommend().await?;
    info!(results = ranked.len(), "aggregation finished");

    println!("\n🎯 {} ranked events\n", ranked.len());
    for (i, r) in ranked.iter().enumerate() {
        let venue = r.event.venue_name.as_deref().unwrap_or("venue TBA");
        let city = r.event.city.as_deref().unwrap_or("");
        let when = r.event.start_utc.as_deref().unwrap_or("date TBA");
        println!(
            "{:>3}. [{:>6.1}] {} — {}\n       {} {} | {} | {}",
            i + 1,
            r.score,
            r.event.artist_name,
            r.event.event_name,
            venue,
            city,
            when,
            r.event.url
        );
    }
    Ok(())
}
