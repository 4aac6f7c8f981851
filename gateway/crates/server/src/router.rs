use std::sync::Arc;

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use gateway_config::Config;
use gateway_engine::Engine;
use tower_http::cors::CorsLayer;

use crate::cors;

#[derive(Clone)]
pub(crate) struct ServerState {
    inner: Arc<ServerStateInner>,
}

struct ServerStateInner {
    engine: Engine,
    graphql_path: String,
}

impl ServerState {
    fn new(engine: Engine, graphql_path: String) -> Self {
        Self {
            inner: Arc::new(ServerStateInner { engine, graphql_path }),
        }
    }
}

/// Routes GraphQL requests on `graph.path` to the engine and serves GraphiQL on
/// `graph.playground_path` when enabled.
pub fn create(engine: Engine, config: &Config) -> crate::Result<Router> {
    let path = config.graph.path.as_str();

    let cors = match config.cors {
        Some(ref cors_config) => cors::generate(cors_config)?,
        None => CorsLayer::permissive(),
    };

    let mut router = Router::new().route(path, get(execute).post(execute));

    if config.graph.playground {
        router = router.route(&config.graph.playground_path, get(playground));
    }

    let state = ServerState::new(engine, path.to_owned());

    Ok(router.with_state(state).layer(cors))
}

async fn execute(State(state): State<ServerState>, request: GraphQLRequest) -> GraphQLResponse {
    state.inner.engine.execute(request.into_inner()).await.into()
}

async fn playground(State(state): State<ServerState>) -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint(&state.inner.graphql_path).finish())
}
