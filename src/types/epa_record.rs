//! Data structures for the EPA AQS `dailyData/byState` endpoint.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Response envelope. AQS reports failures inside a `Header` and omits `Data`,
/// so the data array is optional.
#[derive(Debug, Deserialize)]
pub struct DailyDataResponse {
    #[serde(rename = "Data", default)]
    pub data: Option<Vec<EpaRecord>>,
}

/// One daily summary row.
///
/// AQS reports several rows per site and day (one per pollutant standard, event type
/// or method), so every field that tells them apart is kept. Fields without a typed
/// counterpart land in `extra` and are written out as well.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EpaRecord {
    #[serde(default)]
    pub state_code: Option<String>,
    #[serde(default)]
    pub county_code: Option<String>,
    #[serde(default)]
    pub site_number: Option<String>,
    #[serde(default)]
    pub parameter_code: Option<String>,
    #[serde(default)]
    pub poc: Option<i64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub parameter: Option<String>,
    #[serde(default)]
    pub sample_duration_code: Option<String>,
    #[serde(default)]
    pub sample_duration: Option<String>,
    #[serde(default)]
    pub pollutant_standard: Option<String>,
    #[serde(default)]
    pub date_local: Option<String>,
    #[serde(default)]
    pub units_of_measure: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub observation_count: Option<i64>,
    #[serde(default)]
    pub observation_percent: Option<f64>,
    #[serde(default)]
    pub validity_indicator: Option<String>,
    #[serde(default)]
    pub arithmetic_mean: Option<f64>,
    #[serde(default)]
    pub first_max_value: Option<f64>,
    #[serde(default)]
    pub first_max_hour: Option<i64>,
    #[serde(default)]
    pub aqi: Option<f64>,
    #[serde(default)]
    pub method_code: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub local_site_name: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub cbsa: Option<String>,
    /// Remaining AQS fields, by name.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl EpaRecord {
    /// An `extra` field as CSV text; strings are unquoted, nulls are missing.
    pub fn extra_text(&self, name: &str) -> Option<String> {
        match self.extra.get(name)? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }

    /// The `SS-CCC-NNNN` site id, or the bare site number when the state or county code is absent.
    pub fn station_id(&self) -> Option<String> {
        match (&self.state_code, &self.county_code, &self.site_number) {
            (Some(state), Some(county), Some(site)) => Some(format!("{state}-{county}-{site}")),
            (_, _, Some(site)) => Some(site.clone()),
            _ => None,
        }
    }
}
