use anyhow::Result;
use clap::Parser;
use raincheck_app::{bookmark, LocationSource, RaincheckService, ServiceOutcome};
use raincheck_engine::{Coordinate, DEFAULT_LOOKBACK_DAYS, DEFAULT_THRESHOLD_MM};
use tracing_subscriber::EnvFilter;

/// How long since it last rained here?
#[derive(Debug, Parser)]
#[command(name = "raincheck", version)]
struct Cli {
    /// Latitude in decimal degrees, -90 to 90
    #[arg(requires = "longitude", conflicts_with = "bookmark")]
    latitude: Option<f64>,

    /// Longitude in decimal degrees, -180 to 180
    longitude: Option<f64>,

    /// Shareable reference ("lat=..&lon=..") or a full bookmarked URL
    #[arg(long)]
    bookmark: Option<String>,

    /// Wetness threshold in mm/hr; samples must strictly exceed it
    #[arg(long, default_value_t = DEFAULT_THRESHOLD_MM)]
    threshold_mm: f64,

    /// Trailing window of hourly history to query
    #[arg(long, default_value_t = DEFAULT_LOOKBACK_DAYS)]
    lookback_days: u32,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (latitude, longitude, source) = match (&cli.bookmark, cli.latitude, cli.longitude) {
        (Some(reference), _, _) => {
            let coordinate = bookmark::decode(reference)
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            (
                coordinate.latitude(),
                coordinate.longitude(),
                LocationSource::Bookmark,
            )
        }
        (None, Some(latitude), Some(longitude)) => {
            (latitude, longitude, LocationSource::ManualEntry)
        }
        _ => anyhow::bail!("provide LATITUDE and LONGITUDE, or --bookmark"),
    };

    let service = RaincheckService::new()?
        .with_threshold_mm(cli.threshold_mm)
        .with_lookback_days(cli.lookback_days);

    match service
        .on_location_selected(latitude, longitude, source)
        .await
    {
        ServiceOutcome::Classified { result, .. } => {
            println!("{} [{}]", result.tier.description(), result.tier.image_name());
            println!("{}", result.narrative);
            if let Ok(coordinate) = Coordinate::new(latitude, longitude) {
                println!("Share: ?{}", bookmark::encode(&coordinate));
            }
            Ok(())
        }
        ServiceOutcome::Failed { message, tier, .. } => {
            eprintln!("{} [{}]", tier.description(), tier.image_name());
            eprintln!("{}", message);
            std::process::exit(1);
        }
    }
}
