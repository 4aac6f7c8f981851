use std::sync::Arc;

use rand::Rng;
use serde_json::json;
use upstream_client::UpstreamClient;

use super::{Resolver, ResolverRequest};
use crate::{ResolverError, Selection};

/// Picks an index in `[0, len)`. Never called with `len == 0`.
pub trait IndexSource: Send + Sync {
    fn pick(&self, len: usize) -> usize;
}

/// Uniform picks from the thread-local random generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngIndex;

impl IndexSource for ThreadRngIndex {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// The upstream fields the random item is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomItemQueries {
    /// Lists every item: `allItems: [Item!]!`.
    pub list_field: String,
    /// Counts them: `_allItemsMeta: _QueryMeta!`, with a `count: Int!` field.
    pub count_field: String,
    /// Fetches one item: `Item(id: ID!): Item`.
    pub item_field: String,
    pub id_argument: String,
}

impl Default for RandomItemQueries {
    fn default() -> Self {
        RandomItemQueries {
            list_field: String::from("allItems"),
            count_field: String::from("_allItemsMeta"),
            item_field: String::from("Item"),
            id_argument: String::from("id"),
        }
    }
}

impl RandomItemQueries {
    fn count_document(&self) -> String {
        format!(
            "query {{ {} {{ id }} {} {{ count }} }}",
            self.list_field, self.count_field
        )
    }

    fn item_document(&self, selection_set: &str) -> String {
        format!(
            "query ($id: ID!) {{ {}({}: $id) {selection_set} }}",
            self.item_field, self.id_argument
        )
    }
}

/// Resolves a random item of the upstream collection in two round trips: the first one lists
/// the identifiers and the size of the collection, the second one fetches the chosen item with
/// the selection of the caller.
pub struct RandomItemResolver {
    client: Arc<dyn UpstreamClient>,
    queries: RandomItemQueries,
    index: Box<dyn IndexSource>,
}

impl RandomItemResolver {
    pub fn new(client: Arc<dyn UpstreamClient>, queries: RandomItemQueries) -> Self {
        RandomItemResolver {
            client,
            queries,
            index: Box::new(ThreadRngIndex),
        }
    }

    #[must_use]
    pub fn with_index_source(mut self, index: impl IndexSource + 'static) -> Self {
        self.index = Box::new(index);
        self
    }

    /// Returns the chosen item, shaped by `selection` when given.
    pub async fn random_item(&self, selection: Option<&Selection>) -> Result<serde_json::Value, ResolverError> {
        let data = self.client.query(&self.queries.count_document(), None).await?;

        let ids = self.identifiers(&data)?;
        let count = self.count(&data)?;

        // The list and the count come from the same response but nothing forces the upstream
        // to keep them consistent.
        let len = usize::try_from(count).unwrap_or(usize::MAX).min(ids.len());

        if len == 0 {
            return Err(ResolverError::EmptyCollection);
        }

        if count != ids.len() as u64 {
            tracing::warn!("the upstream counts {count} items but lists {}", ids.len());
        }

        let index = self.index.pick(len);
        let id = ids
            .get(..len)
            .and_then(|ids| ids.get(index))
            .cloned()
            .ok_or_else(|| ResolverError::UnexpectedShape(format!("picked index {index} is outside of 0..{len}")))?;

        tracing::debug!("picked item {index} of {len}: {id}");

        let selection_set = selection
            .and_then(Selection::render_selection_set)
            .unwrap_or_else(|| String::from("{ id }"));

        let mut data = self
            .client
            .query(&self.queries.item_document(&selection_set), Some(json!({ "id": id })))
            .await?;

        match data.get_mut(&self.queries.item_field).map(serde_json::Value::take) {
            Some(serde_json::Value::Null) => Err(ResolverError::StaleReference { id: display_id(&id) }),
            Some(item) => Ok(item),
            None => Err(ResolverError::UnexpectedShape(format!(
                "the response has no `{}` member",
                self.queries.item_field
            ))),
        }
    }

    fn identifiers(&self, data: &serde_json::Value) -> Result<Vec<serde_json::Value>, ResolverError> {
        let list_field = &self.queries.list_field;

        let items = data
            .get(list_field)
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| ResolverError::UnexpectedShape(format!("`{list_field}` is not a list")))?;

        items
            .iter()
            .map(|item| match item.get("id") {
                Some(id @ (serde_json::Value::String(_) | serde_json::Value::Number(_))) => Ok(id.clone()),
                _ => Err(ResolverError::UnexpectedShape(format!(
                    "an entry of `{list_field}` has no id"
                ))),
            })
            .collect()
    }

    fn count(&self, data: &serde_json::Value) -> Result<u64, ResolverError> {
        let count_field = &self.queries.count_field;

        data.get(count_field)
            .and_then(|meta| meta.get("count"))
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| ResolverError::UnexpectedShape(format!("`{count_field}.count` is not a count")))
    }
}

fn display_id(id: &serde_json::Value) -> String {
    match id {
        serde_json::Value::String(id) => id.clone(),
        other => other.to_string(),
    }
}

#[async_trait::async_trait]
impl Resolver for RandomItemResolver {
    async fn resolve(&self, request: ResolverRequest<'_>) -> Result<serde_json::Value, ResolverError> {
        self.random_item(Some(request.field)).await
    }
}
