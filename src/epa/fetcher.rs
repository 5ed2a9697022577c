//! Fetches recent daily summaries from the EPA AQS API for a fixed set of stations.

use crate::config::EpaSettings;
use crate::epa::catalog::StationCatalog;
use crate::error::CollectorError;
use crate::http::transport::{ApiRequest, HttpTransport};
use crate::output::write_csv;
use crate::types::epa_record::{DailyDataResponse, EpaRecord};
use crate::types::window::CollectionWindow;
use chrono::{Local, NaiveDateTime};
use log::{error, info, warn};
use polars::prelude::*;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// An AQS row that belongs to a catalog station.
#[derive(Debug, Clone, PartialEq)]
pub struct StationRecord {
    pub station_id: String,
    pub station_name: String,
    pub record: EpaRecord,
}

/// Row counts of one EPA run, most frequent first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EpaSummary {
    pub total: usize,
    pub by_parameter: Vec<(String, usize)>,
    pub by_station: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpaReport {
    pub path: PathBuf,
    pub summary: EpaSummary,
}

pub struct EpaFetcher<T> {
    transport: T,
    settings: EpaSettings,
    catalog: StationCatalog,
}

impl<T: HttpTransport> EpaFetcher<T> {
    pub fn new(transport: T, settings: &EpaSettings, catalog: StationCatalog) -> Self {
        Self {
            transport,
            settings: settings.clone(),
            catalog,
        }
    }

    pub fn catalog(&self) -> &StationCatalog {
        &self.catalog
    }

    /// Fetches the configured trailing window ending today. Failures are logged and
    /// yield an empty result.
    pub async fn fetch_recent(&self) -> Vec<EpaRecord> {
        let today = Local::now().date_naive();
        self.fetch_window(CollectionWindow::trailing_days(today, self.settings.lookback_days))
            .await
    }

    pub async fn fetch_window(&self, window: CollectionWindow) -> Vec<EpaRecord> {
        let (bdate, edate) = window.compact_bounds();
        let request = ApiRequest::get(&self.settings.base_url)
            .query("email", &self.settings.email)
            .query("key", self.settings.key.expose_secret())
            .query("param", self.settings.parameter_codes.join(","))
            .query("bdate", bdate)
            .query("edate", edate)
            .query("state", &self.settings.state_code);

        let response = match self.transport.send(&request).await {
            Ok(response) => response,
            Err(e) => {
                error!("Exception fetching EPA data: {}", e);
                return Vec::new();
            }
        };

        if response.status != StatusCode::OK {
            error!("Error fetching EPA data: {}", response.status);
            error!("Response: {}", response.body);
            return Vec::new();
        }

        match response.decode::<DailyDataResponse>(&request.url) {
            Ok(DailyDataResponse { data: Some(data) }) => {
                info!("Received {} EPA rows", data.len());
                data
            }
            Ok(DailyDataResponse { data: None }) => {
                warn!("EPA response contained no Data section");
                Vec::new()
            }
            Err(e) => {
                error!("Could not decode EPA response: {}", e);
                Vec::new()
            }
        }
    }

    /// Keeps the rows of catalog stations and tags them with the station name.
    pub fn filter_to_catalog(&self, records: Vec<EpaRecord>) -> Vec<StationRecord> {
        records
            .into_iter()
            .filter_map(|record| {
                let station_id = record.station_id()?;
                let station = self.catalog.get(&station_id)?;
                Some(StationRecord {
                    station_name: station.name.clone(),
                    station_id,
                    record,
                })
            })
            .collect()
    }

    /// Fetches the trailing window, writes the catalog rows to a timestamped CSV under
    /// `output_dir` and logs a summary. Returns `None` (and writes nothing) when there
    /// is nothing to write.
    pub async fn collect(&self, output_dir: &Path) -> Result<Option<EpaReport>, CollectorError> {
        let today = Local::now().date_naive();
        let window = CollectionWindow::trailing_days(today, self.settings.lookback_days);
        self.collect_window(window, output_dir, Local::now().naive_local())
            .await
    }

    pub async fn collect_window(
        &self,
        window: CollectionWindow,
        output_dir: &Path,
        run_time: NaiveDateTime,
    ) -> Result<Option<EpaReport>, CollectorError> {
        info!("Using {} monitoring stations", self.catalog.len());
        let records = self.fetch_window(window).await;
        if records.is_empty() {
            warn!("No measurements were collected");
            return Ok(None);
        }

        let rows = self.filter_to_catalog(records);
        if rows.is_empty() {
            warn!("No measurements matched the station catalog");
            return Ok(None);
        }

        let summary = summarize(&rows);
        let frame = station_records_to_frame(&rows)?;
        let file_name = format!("nyc_air_quality_{}.csv", run_time.format("%Y%m%d_%H%M%S"));
        let path = write_csv(frame, &output_dir.join(file_name)).await?;
        info!("Data saved to {}", path.display());
        log_summary(&summary);

        Ok(Some(EpaReport { path, summary }))
    }
}

pub fn summarize(rows: &[StationRecord]) -> EpaSummary {
    EpaSummary {
        total: rows.len(),
        by_parameter: value_counts(
            rows.iter()
                .filter_map(|r| r.record.parameter.as_deref()),
        ),
        by_station: value_counts(rows.iter().map(|r| r.station_name.as_str())),
    }
}

fn value_counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(value, n)| (value.to_string(), n))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

fn log_summary(summary: &EpaSummary) {
    info!("Total measurements: {}", summary.total);
    for (parameter, n) in &summary.by_parameter {
        info!("  parameter {}: {}", parameter, n);
    }
    for (station, n) in &summary.by_station {
        info!("  station {}: {}", station, n);
    }
}

fn text_column(
    name: &str,
    rows: &[StationRecord],
    field: fn(&EpaRecord) -> &Option<String>,
) -> Column {
    let values: Vec<Option<&str>> = rows.iter().map(|r| field(&r.record).as_deref()).collect();
    Column::new(name.into(), values)
}

fn number_column(name: &str, rows: &[StationRecord], field: fn(&EpaRecord) -> Option<f64>) -> Column {
    let values: Vec<Option<f64>> = rows.iter().map(|r| field(&r.record)).collect();
    Column::new(name.into(), values)
}

fn integer_column(name: &str, rows: &[StationRecord], field: fn(&EpaRecord) -> Option<i64>) -> Column {
    let values: Vec<Option<i64>> = rows.iter().map(|r| field(&r.record)).collect();
    Column::new(name.into(), values)
}

/// One column per typed AQS field, then one per untyped field seen in any row
/// (sorted by name, null where a row lacks it).
pub fn station_records_to_frame(rows: &[StationRecord]) -> PolarsResult<DataFrame> {
    let mut columns = vec![
        Column::new(
            "station_id".into(),
            rows.iter().map(|r| r.station_id.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            "station_name".into(),
            rows.iter().map(|r| r.station_name.as_str()).collect::<Vec<_>>(),
        ),
        text_column("date_local", rows, |r| &r.date_local),
        text_column("state_code", rows, |r| &r.state_code),
        text_column("county_code", rows, |r| &r.county_code),
        text_column("site_number", rows, |r| &r.site_number),
        text_column("parameter_code", rows, |r| &r.parameter_code),
        text_column("parameter", rows, |r| &r.parameter),
        integer_column("poc", rows, |r| r.poc),
        text_column("sample_duration_code", rows, |r| &r.sample_duration_code),
        text_column("sample_duration", rows, |r| &r.sample_duration),
        text_column("pollutant_standard", rows, |r| &r.pollutant_standard),
        text_column("event_type", rows, |r| &r.event_type),
        text_column("units_of_measure", rows, |r| &r.units_of_measure),
        integer_column("observation_count", rows, |r| r.observation_count),
        number_column("observation_percent", rows, |r| r.observation_percent),
        text_column("validity_indicator", rows, |r| &r.validity_indicator),
        number_column("arithmetic_mean", rows, |r| r.arithmetic_mean),
        number_column("first_max_value", rows, |r| r.first_max_value),
        integer_column("first_max_hour", rows, |r| r.first_max_hour),
        number_column("aqi", rows, |r| r.aqi),
        text_column("method_code", rows, |r| &r.method_code),
        text_column("method", rows, |r| &r.method),
        number_column("latitude", rows, |r| r.latitude),
        number_column("longitude", rows, |r| r.longitude),
        text_column("local_site_name", rows, |r| &r.local_site_name),
        text_column("county", rows, |r| &r.county),
        text_column("cbsa", rows, |r| &r.cbsa),
    ];

    let extra_names: BTreeSet<&str> = rows
        .iter()
        .flat_map(|r| r.record.extra.keys().map(String::as_str))
        .collect();
    for name in extra_names {
        let values: Vec<Option<String>> = rows.iter().map(|r| r.record.extra_text(name)).collect();
        columns.push(Column::new(name.into(), values));
    }

    DataFrame::new(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::http::testing::{network_failure, ok_json, status, ScriptedTransport};
    use chrono::NaiveDate;
    use serde_json::json;

    fn fetcher(transport: ScriptedTransport) -> EpaFetcher<ScriptedTransport> {
        let settings = Settings::build(None, None).unwrap();
        EpaFetcher::new(transport, &settings.epa, StationCatalog::nyc())
    }

    fn window() -> CollectionWindow {
        CollectionWindow::trailing_days(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(), 30)
    }

    fn run_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(8, 15, 0)
            .unwrap()
    }

    fn sample_data() -> serde_json::Value {
        json!({"Data": [
            {"state_code": "36", "county_code": "005", "site_number": "0112",
             "parameter": "Ozone", "parameter_code": "44201", "date_local": "2024-03-01",
             "arithmetic_mean": 0.031, "aqi": 29},
            {"state_code": "36", "county_code": "005", "site_number": "0112",
             "parameter": "Ozone", "parameter_code": "44201", "date_local": "2024-03-02",
             "arithmetic_mean": 0.035, "aqi": 33},
            {"state_code": "36", "county_code": "061", "site_number": "0014",
             "parameter": "PM2.5 - Local Conditions", "parameter_code": "88101",
             "date_local": "2024-03-01", "arithmetic_mean": 8.2},
            {"state_code": "36", "county_code": "001", "site_number": "0005",
             "parameter": "Ozone", "parameter_code": "44201", "date_local": "2024-03-01",
             "arithmetic_mean": 0.029}
        ]})
    }

    #[tokio::test]
    async fn test_request_carries_credentials_and_window() {
        let transport = ScriptedTransport::new(|_| ok_json(json!({"Data": []})));
        let records = fetcher(transport.clone()).fetch_window(window()).await;
        assert!(records.is_empty());

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.query_value("email"), Some("test@example.com"));
        assert_eq!(request.query_value("key"), Some("test"));
        assert_eq!(
            request.query_value("param"),
            Some("42101,42401,42602,44201,88101")
        );
        assert_eq!(request.query_value("bdate"), Some("20240301"));
        assert_eq!(request.query_value("edate"), Some("20240331"));
        assert_eq!(request.query_value("state"), Some("36"));
    }

    #[tokio::test]
    async fn test_fetch_recent_ends_today() {
        let transport = ScriptedTransport::new(|_| ok_json(json!({"Data": []})));
        fetcher(transport.clone()).fetch_recent().await;

        let today = Local::now().date_naive();
        let (bdate, edate) = CollectionWindow::trailing_days(today, 30).compact_bounds();
        let request = &transport.requests()[0];
        assert_eq!(request.query_value("edate"), Some(edate.as_str()));
        assert_eq!(request.query_value("bdate"), Some(bdate.as_str()));
    }

    #[tokio::test]
    async fn test_filter_keeps_catalog_stations_only() {
        let transport = ScriptedTransport::new(|_| ok_json(sample_data()));
        let fetcher = fetcher(transport);
        let records = fetcher.fetch_window(window()).await;
        assert_eq!(records.len(), 4);

        let rows = fetcher.filter_to_catalog(records);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.station_id != "36-001-0005"));
        assert_eq!(rows[2].station_name, "CCNY - Manhattan");

        let summary = summarize(&rows);
        assert_eq!(summary.total, 3);
        assert_eq!(
            summary.by_parameter,
            vec![
                ("Ozone".to_string(), 2),
                ("PM2.5 - Local Conditions".to_string(), 1)
            ]
        );
        assert_eq!(
            summary.by_station,
            vec![
                ("IS 52 - Bronx".to_string(), 2),
                ("CCNY - Manhattan".to_string(), 1)
            ]
        );
    }

    #[tokio::test]
    async fn test_collect_writes_timestamped_csv() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let transport = ScriptedTransport::new(|_| ok_json(sample_data()));

        let report = fetcher(transport)
            .collect_window(window(), dir.path(), run_time())
            .await?
            .expect("rows were written");

        assert_eq!(
            report.path,
            dir.path().join("nyc_air_quality_20240331_081500.csv")
        );
        let contents = std::fs::read_to_string(&report.path)?;
        let mut lines = contents.lines();
        assert!(lines
            .next()
            .unwrap()
            .starts_with("station_id,station_name,date_local,state_code,county_code,site_number,parameter_code,parameter,poc"));
        assert_eq!(lines.count(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_rows_differing_by_standard_stay_distinct() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let transport = ScriptedTransport::new(|_| {
            let row = |standard: &str| {
                json!({"state_code": "36", "county_code": "005", "site_number": "0112",
                       "parameter": "Ozone", "parameter_code": "44201", "poc": 1,
                       "date_local": "2024-03-01", "arithmetic_mean": 0.031,
                       "pollutant_standard": standard, "cbsa_code": "35620"})
            };
            ok_json(json!({"Data": [row("Ozone 1-hour 1979"), row("Ozone 8-hour 2015")]}))
        });

        let report = fetcher(transport)
            .collect_window(window(), dir.path(), run_time())
            .await?
            .expect("rows were written");

        let contents = std::fs::read_to_string(&report.path)?;
        let lines: Vec<&str> = contents.lines().collect();
        let header: Vec<&str> = lines[0].split(',').collect();
        assert!(header.contains(&"pollutant_standard"));
        assert_eq!(header.last(), Some(&"cbsa_code"));
        assert_eq!(lines.len(), 3);
        assert_ne!(lines[1], lines[2]);
        assert!(lines[1].contains("Ozone 1-hour 1979"));
        assert!(lines[2].contains("Ozone 8-hour 2015"));
        assert!(lines[1].ends_with(",35620"));
        Ok(())
    }

    #[tokio::test]
    async fn test_non_200_yields_no_data_and_no_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let transport =
            ScriptedTransport::new(|_| status(StatusCode::BAD_REQUEST, "{\"Header\": []}"));

        let report = fetcher(transport)
            .collect_window(window(), dir.path(), run_time())
            .await?;

        assert!(report.is_none());
        assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_transport_failure_yields_no_data() {
        let transport = ScriptedTransport::new(|r| network_failure(&r.url));
        assert!(fetcher(transport).fetch_window(window()).await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_data_section_yields_no_data() {
        let transport =
            ScriptedTransport::new(|_| ok_json(json!({"Header": [{"status": "No data matched"}]})));
        assert!(fetcher(transport).fetch_window(window()).await.is_empty());
    }
}
