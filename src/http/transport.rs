//! The HTTP seam shared by every fetch component.
//!
//! Components build an [`ApiRequest`], hand it to an [`HttpTransport`] and decode the
//! [`ApiResponse`] into a typed record. The production transport is `reqwest::Client`.

use crate::http::error::FetchError;
use log::info;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::future::Future;

/// A GET request: URL, query pairs and extra headers.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub url: String,
    pub query: Vec<(&'static str, String)>,
    pub headers: Vec<(&'static str, String)>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn query(mut self, name: &'static str, value: impl ToString) -> Self {
        self.query.push((name, value.to_string()));
        self
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    /// Checks for a 2xx status and parses the body as `T`.
    pub fn decode<T: DeserializeOwned>(self, url: &str) -> Result<T, FetchError> {
        if !self.status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: self.status,
                body: self.body,
            });
        }
        serde_json::from_str(&self.body).map_err(|source| FetchError::JsonParse {
            url: url.to_string(),
            source,
        })
    }
}

pub trait HttpTransport {
    fn send(
        &self,
        request: &ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, FetchError>> + Send;
}

impl HttpTransport for Client {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, FetchError> {
        info!("Requesting {} with {:?}", request.url, request.query);
        let mut builder = self.get(&request.url).query(&request.query);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(request.url.clone(), e))?;
        let status = response.status();
        info!("Response status for {}: {}", request.url, status);

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::NetworkRequest(request.url.clone(), e))?;
        Ok(ApiResponse { status, body })
    }
}
