use std::sync::Arc;

use upstream_client::UpstreamClient;

use super::{Resolver, ResolverRequest};
use crate::ResolverError;

/// Forwards a root field to the upstream service as a single-field operation.
pub struct UpstreamResolver {
    client: Arc<dyn UpstreamClient>,
}

impl UpstreamResolver {
    pub fn new(client: Arc<dyn UpstreamClient>) -> Self {
        UpstreamResolver { client }
    }
}

#[async_trait::async_trait]
impl Resolver for UpstreamResolver {
    async fn resolve(&self, request: ResolverRequest<'_>) -> Result<serde_json::Value, ResolverError> {
        let document = format!("{} {{ {} }}", request.operation, request.field);

        tracing::debug!("delegating upstream: {document}");

        let mut data = self.client.query(&document, None).await?;
        let key = request.field.response_key();

        data.get_mut(key)
            .map(serde_json::Value::take)
            .ok_or_else(|| ResolverError::UnexpectedShape(format!("the response has no `{key}` member")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use schema_composition::{OperationType, SchemaDescriptor};
    use serde_json::json;
    use upstream_client::{UpstreamClient, UpstreamError};

    use super::UpstreamResolver;
    use crate::{Resolver, ResolverError, ResolverRequest, Selection};

    #[derive(Default)]
    struct RecordingClient {
        response: Option<serde_json::Value>,
        documents: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl UpstreamClient for RecordingClient {
        async fn introspect(&self) -> Result<SchemaDescriptor, UpstreamError> {
            Err(UpstreamError::Unreachable(String::from("not used")))
        }

        async fn query(
            &self,
            document: &str,
            _variables: Option<serde_json::Value>,
        ) -> Result<serde_json::Value, UpstreamError> {
            self.documents.lock().unwrap().push(document.to_owned());

            self.response.clone().ok_or(UpstreamError::GraphQl {
                messages: vec![String::from("nope")],
                data: None,
            })
        }
    }

    #[tokio::test]
    async fn forwards_the_field_and_reads_its_response_key() {
        let client = Arc::new(RecordingClient {
            response: Some(json!({ "items": [{ "__typename": "Item", "id": "1" }] })),
            ..Default::default()
        });

        let resolver = UpstreamResolver::new(client.clone());
        let field = Selection::new("allItems").with_alias("items").with_field(Selection::new("id"));

        let value = resolver
            .resolve(ResolverRequest {
                operation: OperationType::Query,
                field: &field,
            })
            .await
            .unwrap();

        assert_eq!(json!([{ "__typename": "Item", "id": "1" }]), value);
        assert_eq!(
            vec![String::from("query { items: allItems { __typename id } }")],
            *client.documents.lock().unwrap()
        );
    }

    #[tokio::test]
    async fn mutations_stay_mutations() {
        let client = Arc::new(RecordingClient {
            response: Some(json!({ "deleteItem": null })),
            ..Default::default()
        });

        let resolver = UpstreamResolver::new(client.clone());
        let field = Selection::new("deleteItem")
            .with_argument("id", "1")
            .with_field(Selection::new("id"));

        let value = resolver
            .resolve(ResolverRequest {
                operation: OperationType::Mutation,
                field: &field,
            })
            .await
            .unwrap();

        assert_eq!(json!(null), value);
        assert_eq!(
            vec![String::from(r#"mutation { deleteItem(id: "1") { __typename id } }"#)],
            *client.documents.lock().unwrap()
        );
    }

    #[tokio::test]
    async fn upstream_errors_are_forwarded() {
        let resolver = UpstreamResolver::new(Arc::new(RecordingClient::default()));
        let field = Selection::new("allItems").with_field(Selection::new("id"));

        let error = resolver
            .resolve(ResolverRequest {
                operation: OperationType::Query,
                field: &field,
            })
            .await
            .unwrap_err();

        assert_eq!("UPSTREAM_ERROR", error.code());
        assert!(matches!(error, ResolverError::Upstream(UpstreamError::GraphQl { .. })));
    }
}
