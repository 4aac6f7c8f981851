mod random_item;
mod upstream;

use std::sync::Arc;

use schema_composition::OperationType;

pub use random_item::{IndexSource, RandomItemQueries, RandomItemResolver, ThreadRngIndex};
pub use upstream::UpstreamResolver;

use crate::{ResolverError, Selection};

/// The field being resolved.
#[derive(Debug, Clone, Copy)]
pub struct ResolverRequest<'a> {
    pub operation: OperationType,
    pub field: &'a Selection,
}

/// Produces the value of a root field, as JSON.
#[async_trait::async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, request: ResolverRequest<'_>) -> Result<serde_json::Value, ResolverError>;
}

pub type SharedResolver = Arc<dyn Resolver>;
