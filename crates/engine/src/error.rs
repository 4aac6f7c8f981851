use async_graphql::ErrorExtensions;
use upstream_client::UpstreamError;

/// Why a resolver could not produce a value. Turned into a GraphQL field error with an
/// `extensions.code`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolverError {
    #[error("the collection is empty")]
    EmptyCollection,
    /// The item vanished between the listing and the lookup.
    #[error("the item `{id}` no longer exists")]
    StaleReference { id: String },
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("unexpected upstream response: {0}")]
    UnexpectedShape(String),
}

impl ResolverError {
    pub fn code(&self) -> &'static str {
        match self {
            ResolverError::EmptyCollection => "EMPTY_COLLECTION",
            ResolverError::StaleReference { .. } => "STALE_REFERENCE",
            ResolverError::Upstream(UpstreamError::Timeout(_)) => "UPSTREAM_TIMEOUT",
            ResolverError::Upstream(UpstreamError::Unreachable(_)) => "UPSTREAM_UNREACHABLE",
            ResolverError::Upstream(UpstreamError::InvalidResponse(_)) => "UPSTREAM_INVALID_RESPONSE",
            ResolverError::Upstream(_) => "UPSTREAM_ERROR",
            ResolverError::UnexpectedShape(_) => "UNEXPECTED_SHAPE",
        }
    }
}

impl ErrorExtensions for ResolverError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, extensions| extensions.set("code", self.code()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("the root field `{0}` has no resolver")]
    UnboundField(String),
    #[error("invalid default value `{value}` for `{location}`")]
    InvalidDefaultValue { location: String, value: String },
    #[error("invalid executable schema: {0}")]
    Schema(String),
}
