use async_graphql::{EmptyMutation, EmptySubscription, Enum, Interface, Object, SimpleObject, Union, ID};

/// Items and users behind an interface and a union:
///
/// ```graphql
/// type Query {
///   node(id: ID!): Node
///   search(term: String, order: Order! = DESC): [SearchResult!]!
///   item: Item
/// }
/// ```
pub struct DirectorySchema {
    schema: async_graphql::Schema<Query, EmptyMutation, EmptySubscription>,
}

impl DirectorySchema {
    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }
}

#[async_trait::async_trait]
impl crate::Schema for DirectorySchema {
    async fn execute(&self, request: async_graphql::Request) -> async_graphql::Response {
        self.schema.execute(request).await
    }
}

impl Default for DirectorySchema {
    fn default() -> Self {
        DirectorySchema {
            schema: async_graphql::Schema::build(Query, EmptyMutation, EmptySubscription).finish(),
        }
    }
}

#[derive(Clone, SimpleObject)]
struct Item {
    id: ID,
    title: String,
}

#[derive(Clone, SimpleObject)]
struct User {
    id: ID,
    name: String,
    role: Role,
}

#[derive(Clone, Copy, PartialEq, Eq, Enum)]
enum Role {
    Admin,
    Member,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Enum)]
enum Order {
    Asc,
    #[default]
    Desc,
}

#[derive(Clone, Interface)]
#[graphql(field(name = "id", ty = "&ID"))]
enum Node {
    Item(Item),
    User(User),
}

#[derive(Clone, Union)]
enum SearchResult {
    Item(Item),
    User(User),
}

fn nodes() -> Vec<Node> {
    vec![
        Node::Item(Item {
            id: ID::from("i1"),
            title: String::from("Lamp"),
        }),
        Node::Item(Item {
            id: ID::from("i2"),
            title: String::from("Desk"),
        }),
        Node::User(User {
            id: ID::from("u1"),
            name: String::from("Ada"),
            role: Role::Admin,
        }),
        Node::User(User {
            id: ID::from("u2"),
            name: String::from("Grace"),
            role: Role::Member,
        }),
    ]
}

#[derive(Default)]
pub struct Query;

#[Object]
impl Query {
    async fn node(&self, id: ID) -> Option<Node> {
        nodes().into_iter().find(|node| match node {
            Node::Item(item) => item.id == id,
            Node::User(user) => user.id == id,
        })
    }

    /// Nodes whose title or name contains `term`, ignoring case, sorted by id.
    async fn search(&self, term: Option<String>, #[graphql(default)] order: Order) -> Vec<SearchResult> {
        let term = term.unwrap_or_default().to_lowercase();

        let mut results: Vec<_> = nodes()
            .into_iter()
            .filter_map(|node| match node {
                Node::Item(item) if item.title.to_lowercase().contains(&term) => Some(SearchResult::Item(item)),
                Node::User(user) if user.name.to_lowercase().contains(&term) => Some(SearchResult::User(user)),
                _ => None,
            })
            .collect();

        if order == Order::Desc {
            results.reverse();
        }

        results
    }

    async fn item(&self) -> Option<Item> {
        nodes().into_iter().find_map(|node| match node {
            Node::Item(item) => Some(item),
            Node::User(_) => None,
        })
    }
}
