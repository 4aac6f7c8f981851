use upstream_client::UpstreamError;

use crate::startup::StartupError;

/// The gateway server error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Neither the configuration nor the command line names the upstream
    #[error("no upstream URL configured, set `upstream.url` or pass `--upstream-url`")]
    MissingUpstreamUrl,
    /// The upstream client cannot be built from the configuration
    #[error("upstream client: {0}")]
    UpstreamClient(#[source] UpstreamError),
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("invalid CORS configuration: {0}")]
    InvalidCors(String),
    /// Cannot start the HTTP server
    #[error("starting server: {0}")]
    Server(#[source] std::io::Error),
}
