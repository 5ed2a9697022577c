//! Command-line interface of the `aq-collector` binary.

use crate::collector::AirQualityCollector;
use crate::config::Settings;
use crate::epa::catalog::StationCatalog;
use crate::epa::fetcher::EpaFetcher;
use crate::error::CollectorError;
use crate::http::transport::HttpTransport;
use crate::openaq::locations::LocationDirectory;
use crate::types::location::Location;
use crate::types::parameter::Parameter;
use crate::types::window::CollectionWindow;
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;

/// Collects air-quality measurements from OpenAQ and the EPA AQS API into CSV files.
#[derive(Debug, Clone, Parser)]
#[command(name = "aq-collector", version)]
pub struct Args {
    /// Settings file. Defaults to `collector.toml` in the working directory, if present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory the CSV files are written to (overrides the configured one)
    #[arg(long = "output-dir", global = true, value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Fetch recent measurements for the locations of each city, one CSV per location
    Openaq(OpenAqArgs),
    /// List OpenAQ locations of a country
    Locations(LocationsArgs),
    /// Fetch recent EPA daily summaries for the NYC stations
    Epa,
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct OpenAqArgs {
    /// City to collect; repeat for several. Defaults to the configured cities.
    #[arg(long = "city", value_name = "NAME")]
    pub cities: Vec<String>,

    /// ISO country code of the cities
    #[arg(long)]
    pub country: Option<String>,

    /// Number of days, ending today, to fetch
    #[arg(long)]
    pub days: Option<u32>,

    #[arg(long)]
    pub locations_per_city: Option<u32>,

    /// Page cap per parameter and location
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Pollutant to fetch (pm25, pm10, o3, no2, so2, co); repeat for several.
    /// Defaults to the configured parameters.
    #[arg(long = "parameter", value_name = "CODE")]
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, clap::Args)]
pub struct LocationsArgs {
    #[arg(long)]
    pub country: Option<String>,

    #[arg(long, default_value_t = 20)]
    pub limit: u32,
}

impl Args {
    /// Folds the command-line overrides into `settings`.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(dir) = &self.output_dir {
            settings.collection.output_dir = dir.clone();
        }

        if let Commands::Openaq(openaq) = &self.command {
            if !openaq.cities.is_empty() {
                settings.collection.cities = openaq.cities.clone();
            }
            if let Some(country) = &openaq.country {
                settings.collection.country = country.clone();
            }
            if let Some(days) = openaq.days {
                settings.collection.lookback_days = days;
            }
            if let Some(n) = openaq.locations_per_city {
                settings.collection.locations_per_city = n;
            }
            if let Some(n) = openaq.max_pages {
                settings.collection.max_pages = n;
            }
            if !openaq.parameters.is_empty() {
                settings.collection.parameters = openaq.parameters.clone();
            }
        }
    }
}

/// One line of the `locations` listing.
pub fn format_location(location: &Location) -> String {
    format!(
        "ID: {} | Name: {} | City: {} | Parameters: [{}]",
        location.id,
        location.name,
        location.city.as_deref().unwrap_or(""),
        location.parameter_codes().join(", ")
    )
}

/// Runs the selected command. Partial data is not an error; configuration and output
/// failures are.
pub async fn run<T>(args: Args, mut settings: Settings, transport: T) -> Result<(), CollectorError>
where
    T: HttpTransport + Clone,
{
    args.apply(&mut settings);

    match args.command {
        Commands::Openaq(_) => {
            let collector = AirQualityCollector::new(transport, &settings)?;
            let collection = &settings.collection;
            let window =
                CollectionWindow::trailing_days(Utc::now().date_naive(), collection.lookback_days);
            let files = collector
                .collect_cities()
                .cities(&collection.cities)
                .country(&collection.country)
                .window(window)
                .call()
                .await?;
            if files.is_empty() {
                warn!("No data was collected for any location");
            }
            for file in &files {
                info!("{} rows -> {}", file.rows, file.path.display());
            }
        }
        Commands::Locations(locations) => {
            let country = locations
                .country
                .unwrap_or_else(|| settings.collection.country.clone());
            let directory = LocationDirectory::new(transport, &settings.openaq)?;
            let found = directory.list(&country, locations.limit).await;
            if found.is_empty() {
                return Err(CollectorError::NoLocations(country));
            }
            for location in &found {
                println!("{}", format_location(location));
            }
        }
        Commands::Epa => {
            let catalog = StationCatalog::nyc();
            info!("Found {} stations in NYC", catalog.len());
            let fetcher = EpaFetcher::new(transport, &settings.epa, catalog);
            fetcher.collect(&settings.collection.output_dir).await?;
        }
    }

    Ok(())
}
