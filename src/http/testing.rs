//! In-memory transport used by the unit tests of the fetch components.

use crate::http::error::FetchError;
use crate::http::transport::{ApiRequest, ApiResponse, HttpTransport};
use reqwest::StatusCode;
use std::sync::{Arc, Mutex};

type Responder = dyn Fn(&ApiRequest) -> Result<ApiResponse, FetchError> + Send + Sync;

/// Answers every request with a caller-supplied closure and records what was sent.
/// Clones share the request log.
#[derive(Clone)]
pub struct ScriptedTransport {
    responder: Arc<Responder>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
}

impl ScriptedTransport {
    pub fn new(
        responder: impl Fn(&ApiRequest) -> Result<ApiResponse, FetchError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Arc::new(responder),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests whose `parameter` query value equals `parameter`.
    pub fn requests_for(&self, parameter: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.query_value("parameter") == Some(parameter))
            .collect()
    }
}

impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, FetchError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.responder)(request)
    }
}

pub fn ok_json(body: serde_json::Value) -> Result<ApiResponse, FetchError> {
    Ok(ApiResponse {
        status: StatusCode::OK,
        body: body.to_string(),
    })
}

pub fn status(status: StatusCode, body: &str) -> Result<ApiResponse, FetchError> {
    Ok(ApiResponse {
        status,
        body: body.to_string(),
    })
}

/// A genuine `reqwest::Error`, produced by building a request with an unparseable URL.
pub fn network_failure(url: &str) -> Result<ApiResponse, FetchError> {
    let source = reqwest::Client::new()
        .get("http://[not-a-host")
        .build()
        .unwrap_err();
    Err(FetchError::NetworkRequest(url.to_string(), source))
}
