//! Client of the upstream GraphQL service.
//!
//! The gateway talks to its upstream twice: once at startup, to introspect its schema, and then
//! for every delegated or derived field at request time. Both go through [`UpstreamClient`].

mod endpoint;
mod error;
mod http;

use schema_composition::SchemaDescriptor;

pub use endpoint::RemoteEndpoint;
pub use error::UpstreamError;
pub use http::HttpUpstreamClient;

#[async_trait::async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Fetches the schema of the upstream service with the standard introspection query.
    async fn introspect(&self) -> Result<SchemaDescriptor, UpstreamError>;

    /// Runs a GraphQL operation upstream and returns the `data` member of the response.
    ///
    /// A response carrying errors is an [`UpstreamError::GraphQl`], even when it also carries
    /// partial data.
    async fn query(
        &self,
        document: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, UpstreamError>;
}
