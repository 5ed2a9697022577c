pub mod locations;
pub mod measurements;
pub mod reshape;

use crate::http::transport::ApiRequest;
use secrecy::{ExposeSecret, Secret};

const USER_AGENT: &str = "AirQualityDataCollector/1.0";

/// A GET on `{base_url}/{resource}` carrying the OpenAQ key header.
fn authorized_request(base_url: &str, resource: &str, api_key: &Secret<String>) -> ApiRequest {
    ApiRequest::get(format!("{}/{}", base_url.trim_end_matches('/'), resource))
        .header("Accept", "application/json")
        .header("User-Agent", USER_AGENT)
        .header("X-API-Key", api_key.expose_secret().as_str())
}

/// The first few characters of a key, for log lines.
pub fn key_preview(api_key: &Secret<String>) -> String {
    let preview: String = api_key.expose_secret().chars().take(4).collect();
    format!("{preview}...")
}
