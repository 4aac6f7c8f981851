use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use async_graphql::{Context, EmptySubscription, Object, SimpleObject, ID};

pub type ItemsSchema = async_graphql::Schema<Query, Mutation, EmptySubscription>;

/// A CRUD collection of items, shaped like the simple APIs the gateway is built for:
///
/// ```graphql
/// type Query {
///   allItems: [Item!]!
///   _allItemsMeta: _QueryMeta!
///   Item(id: ID!): Item
/// }
/// ```
///
/// Clones share the same items, so tests can modify the collection behind a running server.
#[derive(Clone, Default)]
pub struct ItemsBackend {
    items: Arc<Mutex<Vec<Item>>>,
    next_id: Arc<AtomicU64>,
}

#[derive(Clone, Debug, PartialEq, Eq, SimpleObject)]
pub struct Item {
    pub id: ID,
    pub title: String,
}

#[derive(SimpleObject)]
#[graphql(name = "_QueryMeta")]
pub struct QueryMeta {
    count: i32,
}

impl ItemsBackend {
    pub fn with_titles<'a>(titles: impl IntoIterator<Item = &'a str>) -> Self {
        let backend = ItemsBackend::default();

        for title in titles {
            backend.insert(title);
        }

        backend
    }

    pub fn insert(&self, title: &str) -> Item {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let item = Item {
            id: ID(format!("item-{id}")),
            title: title.to_owned(),
        };

        self.items.lock().unwrap().push(item.clone());

        item
    }

    pub fn remove(&self, id: &str) -> Option<Item> {
        let mut items = self.items.lock().unwrap();
        let position = items.iter().position(|item| item.id.as_str() == id)?;

        Some(items.remove(position))
    }

    pub fn items(&self) -> Vec<Item> {
        self.items.lock().unwrap().clone()
    }

    pub fn ids(&self) -> Vec<String> {
        self.items().into_iter().map(|item| item.id.0).collect()
    }

    pub fn schema(&self) -> ItemsSchema {
        async_graphql::Schema::build(Query, Mutation, EmptySubscription)
            .data(self.clone())
            .finish()
    }

    /// The same schema, refusing introspection queries.
    pub fn schema_without_introspection(&self) -> ItemsSchema {
        async_graphql::Schema::build(Query, Mutation, EmptySubscription)
            .data(self.clone())
            .disable_introspection()
            .finish()
    }
}

#[derive(Default)]
pub struct Query;

#[Object]
impl Query {
    async fn all_items(&self, ctx: &Context<'_>) -> Vec<Item> {
        ctx.data_unchecked::<ItemsBackend>().items()
    }

    #[graphql(name = "_allItemsMeta")]
    async fn all_items_meta(&self, ctx: &Context<'_>) -> QueryMeta {
        let count = ctx.data_unchecked::<ItemsBackend>().items().len();

        QueryMeta {
            count: i32::try_from(count).unwrap_or(i32::MAX),
        }
    }

    #[graphql(name = "Item")]
    async fn item(&self, ctx: &Context<'_>, id: ID) -> Option<Item> {
        ctx.data_unchecked::<ItemsBackend>()
            .items()
            .into_iter()
            .find(|item| item.id == id)
    }
}

#[derive(Default)]
pub struct Mutation;

#[Object]
impl Mutation {
    async fn create_item(&self, ctx: &Context<'_>, title: String) -> Item {
        ctx.data_unchecked::<ItemsBackend>().insert(&title)
    }

    async fn delete_item(&self, ctx: &Context<'_>, id: ID) -> Option<Item> {
        ctx.data_unchecked::<ItemsBackend>().remove(id.as_str())
    }
}
