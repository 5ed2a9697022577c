//! Data structures for the OpenAQ `locations` resource.

use serde::Deserialize;

/// Response envelope of the `locations` endpoint.
#[derive(Debug, Deserialize)]
pub struct LocationsResponse {
    #[serde(default)]
    pub results: Vec<Location>,
}

/// A monitoring site as reported by OpenAQ.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Location {
    /// Provider-assigned location id, used to query measurements.
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<CountryField>,
    /// Parameters measured at this site.
    #[serde(default)]
    pub parameters: Vec<LocationParameter>,
}

/// The country of a location. Older payloads carry a plain ISO code, newer ones an object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CountryField {
    Code(String),
    Detailed { code: String },
}

/// One entry of a location's parameter list. Only the code is kept.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationParameter {
    pub parameter: String,
}

impl Location {
    pub fn country_code(&self) -> Option<&str> {
        self.country.as_ref().map(|c| match c {
            CountryField::Code(code) => code.as_str(),
            CountryField::Detailed { code } => code.as_str(),
        })
    }

    pub fn parameter_codes(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.parameter.as_str()).collect()
    }
}
