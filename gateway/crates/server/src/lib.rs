//! The HTTP side of the random item gateway: startup, routing and graceful shutdown.

mod cors;
mod error;
mod extension;
pub mod router;
pub mod startup;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use gateway_config::Config;
use tokio::signal;
use upstream_client::{HttpUpstreamClient, RemoteEndpoint, UpstreamClient};

pub use error::Error;
pub use extension::RANDOM_ITEM_EXTENSION;
pub use startup::{Startup, StartupError, StartupPhase};

pub type Result<T> = std::result::Result<T, Error>;

/// Start parameters for the gateway.
pub struct ServeConfig {
    /// The GraphQL endpoint listen address.
    pub listen_address: SocketAddr,
    /// The gateway configuration, command line overrides applied.
    pub config: Config,
}

/// The upstream endpoint described by the configuration.
pub fn remote_endpoint(config: &Config) -> Result<RemoteEndpoint> {
    let url = config.upstream.url.clone().ok_or(Error::MissingUpstreamUrl)?;

    let endpoint = config.upstream.headers.iter().fold(
        RemoteEndpoint::new(url).with_timeout(config.upstream.timeout.unwrap_or(RemoteEndpoint::DEFAULT_TIMEOUT)),
        |endpoint, (name, value)| endpoint.with_header(name, value),
    );

    Ok(endpoint)
}

/// Runs the startup phases against `client` and builds the router serving the result.
pub async fn build(config: &Config, client: Arc<dyn UpstreamClient>) -> Result<Router> {
    let mut startup = Startup::new(client, config.visibility.clone(), config.random_item.clone());
    let engine = startup.run().await?;

    router::create(engine, config)
}

/// Starts the gateway: introspects the upstream once, then listens until Ctrl+C or SIGTERM.
pub async fn serve(ServeConfig { listen_address, config }: ServeConfig) -> Result<()> {
    let endpoint = remote_endpoint(&config)?;

    tracing::info!("upstream GraphQL service at {}", endpoint.url);

    let client = HttpUpstreamClient::new(endpoint).map_err(Error::UpstreamClient)?;
    let router = build(&config, Arc::new(client)).await?;

    bind(listen_address, &config, router).await
}

async fn bind(addr: SocketAddr, config: &Config, router: Router) -> Result<()> {
    let app = router.into_make_service();

    let handle = axum_server::Handle::new();

    // Spawn a task to gracefully shutdown server.
    tokio::spawn(graceful_shutdown(handle.clone()));

    tracing::info!("GraphQL endpoint exposed at http://{addr}{}", config.graph.path);

    if config.graph.playground {
        tracing::info!("GraphiQL available at http://{addr}{}", config.graph.playground_path);
    }

    axum_server::bind(addr)
        .handle(handle)
        .serve(app)
        .await
        .map_err(Error::Server)
}

async fn graceful_shutdown(handle: axum_server::Handle) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down gracefully...");
    handle.graceful_shutdown(Some(Duration::from_secs(3)));
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gateway_config::Config;

    use super::{remote_endpoint, Error};

    #[test]
    fn endpoint_from_config() {
        let config: Config = toml::from_str(
            r#"
            [upstream]
            url = "http://127.0.0.1:4000/graphql"
            timeout = "2s"
            headers = { "x-api-key" = "secret" }
            "#,
        )
        .unwrap();

        let endpoint = remote_endpoint(&config).unwrap();

        assert_eq!("http://127.0.0.1:4000/graphql", endpoint.url.as_str());
        assert_eq!(Duration::from_secs(2), endpoint.timeout);
        assert_eq!(vec![(String::from("x-api-key"), String::from("secret"))], endpoint.headers);
    }

    #[test]
    fn default_timeout() {
        let config: Config = toml::from_str("[upstream]\nurl = \"http://127.0.0.1:4000/\"").unwrap();

        assert_eq!(Duration::from_secs(30), remote_endpoint(&config).unwrap().timeout);
    }

    #[test]
    fn missing_url() {
        assert!(matches!(
            remote_endpoint(&Config::default()),
            Err(Error::MissingUpstreamUrl)
        ));
    }
}
