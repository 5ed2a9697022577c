//! Resolves OpenAQ monitoring locations for a city or a whole country.

use crate::config::OpenAqSettings;
use crate::error::CollectorError;
use crate::http::transport::{ApiRequest, HttpTransport};
use crate::openaq::authorized_request;
use crate::types::location::{Location, LocationsResponse};
use log::{error, info, warn};
use secrecy::Secret;

pub struct LocationDirectory<T> {
    transport: T,
    base_url: String,
    api_key: Secret<String>,
}

impl<T: HttpTransport> LocationDirectory<T> {
    pub fn new(transport: T, settings: &OpenAqSettings) -> Result<Self, CollectorError> {
        Ok(Self {
            transport,
            base_url: settings.base_url.clone(),
            api_key: settings.require_api_key()?.clone(),
        })
    }

    /// Up to `limit` locations in `city`, `country`. Errors are logged and yield an
    /// empty list.
    pub async fn lookup(&self, city: &str, country: &str, limit: u32) -> Vec<Location> {
        let request = authorized_request(&self.base_url, "locations", &self.api_key)
            .query("city", city)
            .query("country", country)
            .query("limit", limit);
        self.fetch(request, &format!("{city}, {country}")).await
    }

    /// Up to `limit` locations anywhere in `country`.
    pub async fn list(&self, country: &str, limit: u32) -> Vec<Location> {
        let request = authorized_request(&self.base_url, "locations", &self.api_key)
            .query("country", country)
            .query("limit", limit);
        self.fetch(request, country).await
    }

    async fn fetch(&self, request: ApiRequest, scope: &str) -> Vec<Location> {
        let result = match self.transport.send(&request).await {
            Ok(response) => response.decode::<LocationsResponse>(&request.url),
            Err(e) => Err(e),
        };

        match result {
            Ok(response) if response.results.is_empty() => {
                warn!("No locations found for {}", scope);
                Vec::new()
            }
            Ok(response) => {
                info!("Found {} locations for {}", response.results.len(), scope);
                response.results
            }
            Err(e) => {
                error!("Error fetching locations for {}: {}", scope, e);
                if let Some(body) = e.response_body() {
                    error!("Response text: {}", body);
                }
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::http::testing::{network_failure, ok_json, status, ScriptedTransport};
    use reqwest::StatusCode;
    use serde_json::json;

    fn directory(transport: ScriptedTransport) -> LocationDirectory<ScriptedTransport> {
        let settings = Settings::build(None, Some("secret-key".into())).unwrap();
        LocationDirectory::new(transport, &settings.openaq).unwrap()
    }

    #[tokio::test]
    async fn test_lookup_returns_locations() {
        let transport = ScriptedTransport::new(|_| {
            ok_json(json!({"results": [
                {"id": 8118, "name": "Reseda", "city": "Los Angeles", "country": "US",
                 "parameters": [{"parameter": "pm25"}, {"parameter": "o3"}]},
                {"id": 7936, "name": "North Main Street", "city": "Los Angeles", "country": "US"}
            ]}))
        });
        let locations = directory(transport.clone())
            .lookup("Los Angeles", "US", 3)
            .await;

        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].id, 8118);
        assert_eq!(locations[1].name, "North Main Street");

        let request = &transport.requests()[0];
        assert_eq!(request.url, "https://api.openaq.org/v3/locations");
        assert_eq!(request.query_value("city"), Some("Los Angeles"));
        assert_eq!(request.query_value("country"), Some("US"));
        assert_eq!(request.query_value("limit"), Some("3"));
        assert!(request
            .headers
            .contains(&("X-API-Key", "secret-key".to_string())));
    }

    #[tokio::test]
    async fn test_lookup_http_error_is_empty() {
        let transport =
            ScriptedTransport::new(|_| status(StatusCode::UNAUTHORIZED, "{\"detail\":\"invalid key\"}"));
        assert!(directory(transport).lookup("Chicago", "US", 3).await.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_transport_error_is_empty() {
        let transport = ScriptedTransport::new(|r| network_failure(&r.url));
        assert!(directory(transport).lookup("Chicago", "US", 3).await.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_malformed_body_is_empty() {
        let transport = ScriptedTransport::new(|_| status(StatusCode::OK, "not json"));
        assert!(directory(transport).lookup("Chicago", "US", 3).await.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_no_results_is_empty() {
        let transport = ScriptedTransport::new(|_| ok_json(json!({"results": []})));
        assert!(directory(transport).lookup("Nowhere", "US", 3).await.is_empty());
    }

    #[tokio::test]
    async fn test_list_queries_country_only() {
        let transport = ScriptedTransport::new(|_| {
            ok_json(json!({"results": [{"id": 1, "name": "A"}]}))
        });
        let locations = directory(transport.clone()).list("US", 20).await;
        assert_eq!(locations.len(), 1);

        let request = &transport.requests()[0];
        assert_eq!(request.query_value("city"), None);
        assert_eq!(request.query_value("country"), Some("US"));
        assert_eq!(request.query_value("limit"), Some("20"));
    }

    #[test]
    fn test_new_requires_api_key() {
        let settings = Settings::build(None, None).unwrap();
        let transport = ScriptedTransport::new(|_| ok_json(json!({})));
        assert!(matches!(
            LocationDirectory::new(transport, &settings.openaq),
            Err(CollectorError::MissingApiKey(_))
        ));
    }
}
