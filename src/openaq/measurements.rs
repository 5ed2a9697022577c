//! Pages through the OpenAQ `measurements` resource for one location and reshapes the
//! accumulated rows into a [`MeasurementTable`].

use crate::config::{CollectionSettings, OpenAqSettings};
use crate::error::CollectorError;
use crate::http::error::FetchError;
use crate::http::transport::HttpTransport;
use crate::openaq::authorized_request;
use crate::openaq::reshape::MeasurementTable;
use crate::types::measurement::{Measurement, MeasurementsResponse};
use crate::types::parameter::Parameter;
use crate::types::window::CollectionWindow;
use bon::bon;
use chrono::NaiveDate;
use log::{error, info, warn};
use secrecy::Secret;
use std::time::Duration;

/// Rows requested per page. A page shorter than this is the last one.
pub const PAGE_SIZE: usize = 100;
pub const DEFAULT_MAX_PAGES: u32 = 10;

/// Why the page loop of one parameter stopped.
#[derive(Debug)]
pub enum PageLoopExit {
    /// A page came back without rows.
    EmptyPage,
    /// A page came back with fewer than [`PAGE_SIZE`] rows; its rows are kept.
    ShortPage,
    /// The page cap was reached while pages were still full.
    CapReached,
    /// A request failed; rows from earlier pages are kept.
    Error(FetchError),
}

/// Everything fetched for one parameter.
#[derive(Debug)]
pub struct ParameterPages {
    pub parameter: Parameter,
    pub rows: Vec<Measurement>,
    pub requests: u32,
    pub exit: PageLoopExit,
}

pub struct MeasurementFetcher<T> {
    transport: T,
    base_url: String,
    api_key: Secret<String>,
    page_delay: Duration,
}

#[bon]
impl<T: HttpTransport> MeasurementFetcher<T> {
    pub fn new(
        transport: T,
        openaq: &OpenAqSettings,
        collection: &CollectionSettings,
    ) -> Result<Self, CollectorError> {
        Ok(Self {
            transport,
            base_url: openaq.base_url.clone(),
            api_key: openaq.require_api_key()?.clone(),
            page_delay: collection.page_delay(),
        })
    }

    /// Fetches every parameter for `location_id` between `start` and `end` (inclusive)
    /// and returns the pivoted table.
    ///
    /// # Arguments
    ///
    /// * `.location_id(i64)`: **Required.** OpenAQ location id.
    /// * `.start(NaiveDate)` / `.end(NaiveDate)`: **Required.** Date range.
    /// * `.parameters(Vec<Parameter>)`: Optional. Defaults to the six canonical pollutants.
    /// * `.max_pages(u32)`: Optional. Page cap per parameter, defaults to 10.
    ///
    /// Request failures never surface here: they end the failing parameter's page loop
    /// and are logged. Only an error while building the table is returned.
    #[builder]
    pub async fn fetch_range(
        &self,
        location_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        parameters: Option<Vec<Parameter>>,
        max_pages: Option<u32>,
    ) -> Result<MeasurementTable, CollectorError> {
        let parameters = parameters.unwrap_or_else(|| Parameter::ALL.to_vec());
        let max_pages = max_pages.unwrap_or(DEFAULT_MAX_PAGES);

        let window = CollectionWindow::new(start, end);
        let mut all_rows: Vec<Measurement> = Vec::new();
        for &parameter in &parameters {
            let pages = self
                .fetch_parameter(location_id, parameter, window, max_pages)
                .await;
            if pages.rows.is_empty() {
                warn!(
                    "No data found for {} in location {}",
                    parameter, location_id
                );
            }
            all_rows.extend(pages.rows);
        }

        if all_rows.is_empty() {
            return Ok(MeasurementTable::empty());
        }
        Ok(MeasurementTable::from_measurements(&all_rows, &parameters)?)
    }

    /// Runs the page loop of a single parameter.
    pub async fn fetch_parameter(
        &self,
        location_id: i64,
        parameter: Parameter,
        window: CollectionWindow,
        max_pages: u32,
    ) -> ParameterPages {
        let (date_from, date_to) = window.iso_bounds();
        let mut rows = Vec::new();
        let mut page: u32 = 1;

        let exit = loop {
            if page > max_pages {
                break PageLoopExit::CapReached;
            }
            if page > 1 && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }

            let request = authorized_request(&self.base_url, "measurements", &self.api_key)
                .query("location_id", location_id)
                .query("parameter", parameter)
                .query("date_from", &date_from)
                .query("date_to", &date_to)
                .query("limit", PAGE_SIZE)
                .query("page", page);

            let result = match self.transport.send(&request).await {
                Ok(response) => response.decode::<MeasurementsResponse>(&request.url),
                Err(e) => Err(e),
            };
            let results = match result {
                Ok(response) => response.results,
                Err(e) => {
                    error!(
                        "Error fetching {} data for location {} on page {}: {}",
                        parameter, location_id, page, e
                    );
                    if let Some(body) = e.response_body() {
                        error!("Response text: {}", body);
                    }
                    break PageLoopExit::Error(e);
                }
            };

            let page_len = results.len();
            if page_len == 0 {
                break PageLoopExit::EmptyPage;
            }

            let before = rows.len();
            rows.extend(
                results
                    .into_iter()
                    .filter_map(|raw| raw.into_measurement(parameter)),
            );
            let kept = rows.len() - before;
            if kept < page_len {
                warn!(
                    "Skipped {} {} rows without a usable date or value in location {} (page {})",
                    page_len - kept,
                    parameter,
                    location_id,
                    page
                );
            }
            info!(
                "Fetched {} records for {} in location {} (page {})",
                kept, parameter, location_id, page
            );

            if page_len < PAGE_SIZE {
                break PageLoopExit::ShortPage;
            }
            page += 1;
        };

        ParameterPages {
            parameter,
            rows,
            requests: page.min(max_pages),
            exit,
        }
    }
}
