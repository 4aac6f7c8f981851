use std::time::Duration;

use url::Url;

/// Where the upstream GraphQL service lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    pub url: Url,
    /// Upper bound of every request, connection included.
    pub timeout: Duration,
    /// Sent with every request, after the default headers.
    pub headers: Vec<(String, String)>,
}

impl RemoteEndpoint {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(url: Url) -> Self {
        RemoteEndpoint {
            url,
            timeout: Self::DEFAULT_TIMEOUT,
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}
