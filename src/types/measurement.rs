//! Data structures for the OpenAQ `measurements` resource and the validated
//! measurement rows that feed the reshape step.

use crate::types::parameter::Parameter;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

/// Response envelope of the `measurements` endpoint.
#[derive(Debug, Deserialize)]
pub struct MeasurementsResponse {
    #[serde(default)]
    pub results: Vec<RawMeasurement>,
}

/// A measurement row exactly as it came over the wire. Every field is optional so a
/// single odd row does not reject the whole page; [`RawMeasurement::into_measurement`]
/// decides whether the row is usable.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMeasurement {
    #[serde(default)]
    pub date: Option<RawDate>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// The `date` field is either an object with a `utc` member or a flat timestamp string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawDate {
    Nested {
        utc: String,
        #[serde(default)]
        local: Option<String>,
    },
    Flat(String),
}

impl RawDate {
    pub fn utc_text(&self) -> &str {
        match self {
            RawDate::Nested { utc, .. } => utc,
            RawDate::Flat(text) => text,
        }
    }

    /// Resolves the timestamp to UTC. Strings with an offset are converted, strings
    /// without one are taken to already be UTC.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        parse_utc_timestamp(self.utc_text())
    }
}

pub fn parse_utc_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// A validated measurement, tagged with the parameter it was requested for.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub timestamp: DateTime<Utc>,
    pub parameter: Parameter,
    pub value: f64,
    pub unit: String,
    pub location: String,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl RawMeasurement {
    /// Converts the raw row, or returns `None` when the timestamp or value is missing
    /// or unparseable.
    pub fn into_measurement(self, parameter: Parameter) -> Option<Measurement> {
        let timestamp = self.date.as_ref()?.to_utc()?;
        let value = self.value?;
        Some(Measurement {
            timestamp,
            parameter,
            value,
            unit: self.unit.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            city: self.city,
            country: self.country,
        })
    }
}
