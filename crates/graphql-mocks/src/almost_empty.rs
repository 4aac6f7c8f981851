use async_graphql::{EmptyMutation, EmptySubscription, Object};

/// A schema with a single `string(input: String!): String!` field and no items at all.
///
/// Used to change the upstream schema behind the back of a running gateway.
pub struct AlmostEmptySchema {
    schema: async_graphql::Schema<Query, EmptyMutation, EmptySubscription>,
}

#[async_trait::async_trait]
impl crate::Schema for AlmostEmptySchema {
    async fn execute(&self, request: async_graphql::Request) -> async_graphql::Response {
        self.schema.execute(request).await
    }
}

impl Default for AlmostEmptySchema {
    fn default() -> Self {
        AlmostEmptySchema {
            schema: async_graphql::Schema::build(Query, EmptyMutation, EmptySubscription).finish(),
        }
    }
}

#[derive(Default)]
pub struct Query;

#[Object]
impl Query {
    async fn string(&self, input: String) -> String {
        input
    }
}
