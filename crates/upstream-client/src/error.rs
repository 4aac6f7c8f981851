use std::time::Duration;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UpstreamError {
    /// The connection could not be established or broke down.
    #[error("the upstream service is unreachable: {0}")]
    Unreachable(String),
    #[error("the upstream request did not complete within {0:?}")]
    Timeout(Duration),
    /// The upstream answered the introspection query with errors only.
    #[error("introspection is disabled on the upstream service: {}", .0.join(", "))]
    IntrospectionDisabled(Vec<String>),
    /// The upstream answered with GraphQL errors. `data` holds the partial result, if any.
    #[error("the upstream service returned errors: {}", .messages.join(", "))]
    GraphQl {
        messages: Vec<String>,
        data: Option<serde_json::Value>,
    },
    #[error("the upstream response could not be understood: {0}")]
    InvalidResponse(String),
    /// The HTTP client could not be set up, e.g. because of an invalid header.
    #[error("invalid upstream client configuration: {0}")]
    Client(String),
}

impl UpstreamError {
    pub(crate) fn from_reqwest(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            UpstreamError::Timeout(timeout)
        } else if error.is_builder() {
            UpstreamError::Client(error.to_string())
        } else if error.is_decode() || error.is_body() || error.is_status() {
            UpstreamError::InvalidResponse(error.to_string())
        } else {
            UpstreamError::Unreachable(error.to_string())
        }
    }
}
