use thiserror::Error;

/// Failure of a single API call. These never leave the fetch components: they are
/// logged and turned into an empty result or an aborted page loop.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse JSON response from {url}")]
    JsonParse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Response body of a failed HTTP call, if the server sent one.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            FetchError::HttpStatus { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }
}
