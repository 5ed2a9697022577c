//! The OpenAQ collection run: resolve the locations of each city, fetch every location's
//! measurements and write one CSV per location.

use crate::config::Settings;
use crate::error::CollectorError;
use crate::http::transport::HttpTransport;
use crate::openaq::key_preview;
use crate::openaq::locations::LocationDirectory;
use crate::openaq::measurements::MeasurementFetcher;
use crate::output::{slugify, write_csv};
use crate::types::location::Location;
use crate::types::parameter::Parameter;
use crate::types::window::CollectionWindow;
use bon::bon;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// One CSV written by a collection run.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedFile {
    pub city: String,
    pub location_id: i64,
    pub location_name: String,
    pub rows: usize,
    pub path: PathBuf,
}

pub struct AirQualityCollector<T> {
    directory: LocationDirectory<T>,
    fetcher: MeasurementFetcher<T>,
    output_dir: PathBuf,
    max_pages: u32,
    locations_per_city: u32,
    parameters: Vec<Parameter>,
}

#[bon]
impl<T: HttpTransport + Clone> AirQualityCollector<T> {
    /// Creates the collector. Fails when the OpenAQ API key is missing.
    pub fn new(transport: T, settings: &Settings) -> Result<Self, CollectorError> {
        let api_key = settings.openaq.require_api_key()?;
        info!("Using API key starting with: {}", key_preview(api_key));
        Ok(Self {
            directory: LocationDirectory::new(transport.clone(), &settings.openaq)?,
            fetcher: MeasurementFetcher::new(transport, &settings.openaq, &settings.collection)?,
            output_dir: settings.collection.output_dir.clone(),
            max_pages: settings.collection.max_pages,
            locations_per_city: settings.collection.locations_per_city,
            parameters: settings.collection.parameters.clone(),
        })
    }

    /// Collects every city in turn. Cities without locations are skipped; locations
    /// without data are logged and produce no file.
    ///
    /// # Arguments
    ///
    /// * `.cities(&[String])`: **Required.** City names as OpenAQ spells them.
    /// * `.country(&str)`: **Required.** ISO country code.
    /// * `.window(CollectionWindow)`: **Required.** Dates to fetch.
    /// * `.locations_per_city(u32)`: Optional. Defaults to the configured value.
    #[builder]
    pub async fn collect_cities(
        &self,
        cities: &[String],
        country: &str,
        window: CollectionWindow,
        locations_per_city: Option<u32>,
    ) -> Result<Vec<CollectedFile>, CollectorError> {
        let limit = locations_per_city.unwrap_or(self.locations_per_city);
        let mut written = Vec::new();

        for city in cities {
            info!("Looking up locations for {}, {}", city, country);
            let locations = self.directory.lookup(city, country, limit).await;
            if locations.is_empty() {
                warn!("No locations found for {}, skipping.", city);
                continue;
            }

            for location in &locations {
                if let Some(file) = self.collect_location(city, location, window).await? {
                    written.push(file);
                }
            }
        }

        info!("Collection finished, {} files written", written.len());
        Ok(written)
    }

    async fn collect_location(
        &self,
        city: &str,
        location: &Location,
        window: CollectionWindow,
    ) -> Result<Option<CollectedFile>, CollectorError> {
        info!(
            "Fetching data for {} - {} (ID: {})",
            city, location.name, location.id
        );
        let table = self
            .fetcher
            .fetch_range()
            .location_id(location.id)
            .start(window.start)
            .end(window.end)
            .parameters(self.parameters.clone())
            .max_pages(self.max_pages)
            .call()
            .await?;

        if table.is_empty() {
            warn!("No data collected for {} - {}", city, location.name);
            return Ok(None);
        }

        let rows = table.height();
        let file_name = format!(
            "{}_{}_air_quality.csv",
            slugify(city),
            slugify(&location.name)
        );
        let path = write_csv(table.into_frame(), &self.output_dir.join(file_name)).await?;
        info!(
            "Saved data for {} - {} to {}",
            city,
            location.name,
            path.display()
        );

        Ok(Some(CollectedFile {
            city: city.to_string(),
            location_id: location.id,
            location_name: location.name.clone(),
            rows,
            path,
        }))
    }
}
