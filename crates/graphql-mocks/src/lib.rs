//! GraphQL backends served over HTTP, standing in for the upstream service in tests.

mod almost_empty;
mod directory;
mod items;

use std::sync::{Arc, Mutex, RwLock};

use axum::{extract::State, routing::post, Json, Router};
use url::Url;

pub use almost_empty::AlmostEmptySchema;
pub use directory::DirectorySchema;
pub use items::{Item, ItemsBackend, ItemsSchema};

pub struct MockGraphQlServer {
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    state: AppState,
    port: u16,
}

impl Drop for MockGraphQlServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            shutdown.send(()).ok();
        }
    }
}

impl MockGraphQlServer {
    pub async fn new(schema: impl Schema + 'static) -> MockGraphQlServer {
        let state = AppState {
            schema: Arc::new(RwLock::new(Arc::new(schema))),
            received_requests: Arc::default(),
        };

        let app = Router::new().route("/", post(graphql_handler)).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        MockGraphQlServer {
            shutdown: Some(shutdown_tx),
            state,
            port,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn url(&self) -> Url {
        format!("http://127.0.0.1:{}/", self.port).parse().unwrap()
    }

    /// Serves another schema from now on, the server keeps its address.
    pub fn replace_schema(&self, schema: impl Schema + 'static) {
        *self.state.schema.write().unwrap() = Arc::new(schema);
    }

    /// The JSON bodies of all the requests received so far.
    pub fn received_requests(&self) -> Vec<serde_json::Value> {
        self.state.received_requests.lock().unwrap().clone()
    }

    /// Requests whose query contains `needle`.
    pub fn requests_containing(&self, needle: &str) -> Vec<serde_json::Value> {
        self.received_requests()
            .into_iter()
            .filter(|request| {
                request
                    .get("query")
                    .and_then(serde_json::Value::as_str)
                    .is_some_and(|query| query.contains(needle))
            })
            .collect()
    }
}

async fn graphql_handler(State(state): State<AppState>, Json(body): Json<serde_json::Value>) -> Json<serde_json::Value> {
    state.received_requests.lock().unwrap().push(body.clone());

    let response = match serde_json::from_value::<async_graphql::Request>(body) {
        Ok(request) => {
            let schema = state.schema.read().unwrap().clone();
            schema.execute(request).await
        }
        Err(error) => async_graphql::Response::from_errors(vec![async_graphql::ServerError::new(
            error.to_string(),
            None,
        )]),
    };

    Json(serde_json::to_value(response).unwrap())
}

#[derive(Clone)]
struct AppState {
    schema: Arc<RwLock<Arc<dyn Schema>>>,
    received_requests: Arc<Mutex<Vec<serde_json::Value>>>,
}

/// Creating a trait for schema so we can use it as a trait object and avoid
/// making everything generic over Query, Mutation & Subscription params
#[async_trait::async_trait]
pub trait Schema: Send + Sync {
    async fn execute(&self, request: async_graphql::Request) -> async_graphql::Response;
}

#[async_trait::async_trait]
impl<Q, M, S> Schema for async_graphql::Schema<Q, M, S>
where
    Q: async_graphql::ObjectType + 'static,
    M: async_graphql::ObjectType + 'static,
    S: async_graphql::SubscriptionType + 'static,
{
    async fn execute(&self, request: async_graphql::Request) -> async_graphql::Response {
        async_graphql::Schema::execute(self, request).await
    }
}
