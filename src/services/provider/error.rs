use thiserror::Error;

/// Failures talking to the challenge platform's REST API.
///
/// Messages carry the request URL but never the bearer token.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider URL must use HTTPS: {0}")]
    InsecureUrl(String),

    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("network error requesting {url}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP status {status}")]
    Status { url: String, status: u16 },

    #[error("response from {url} too large ({size} bytes > {limit} bytes)")]
    TooLarge { url: String, size: usize, limit: usize },

    #[error("malformed payload from {url}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProviderError {
    /// Whether a retry could plausibly succeed: network faults, throttling and
    /// server errors. Client errors and bad payloads are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Network { .. } => true,
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
