use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use tracing::Subscriber;
use tracing_subscriber::{registry::LookupSpan, Layer};
use url::Url;

mod log;

pub(crate) use log::LogLevel;

use self::log::LogStyle;

pub(crate) type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

#[derive(Debug, Parser)]
#[command(name = "random-item-gateway", version)]
/// A GraphQL gateway serving a random item of its upstream collection
pub struct Args {
    /// IP address on which the server will listen for incoming connections. Defaults to 127.0.0.1:3000.
    #[arg(short, long, env = "GATEWAY_LISTEN_ADDRESS")]
    pub listen_address: Option<SocketAddr>,
    /// Path to the TOML configuration file
    #[arg(long, short, env = "GATEWAY_CONFIG_PATH", default_value = "./gateway.toml")]
    pub config: PathBuf,
    /// URL of the upstream GraphQL service, overrides `upstream.url`
    #[arg(long, short, env = "GATEWAY_UPSTREAM_URL")]
    pub upstream_url: Option<Url>,
    /// Set the logging level
    #[arg(long = "log", env = "GATEWAY_LOG")]
    pub log_level: Option<LogLevel>,
    /// Set the style of log output
    #[arg(long, env = "GATEWAY_LOG_STYLE", default_value_t = LogStyle::Text)]
    log_style: LogStyle,
}

pub(crate) fn parse() -> Args {
    Args::parse()
}

impl Args {
    pub fn log_filter(&self) -> String {
        self.log_level.unwrap_or_default().as_filter_string()
    }

    pub fn log_format<S>(&self) -> BoxedLayer<S>
    where
        S: Subscriber + for<'span> LookupSpan<'span> + Send + Sync,
    {
        let layer = tracing_subscriber::fmt::layer();

        match self.log_style {
            // for interactive terminals we provide colored output
            LogStyle::Text if atty::is(atty::Stream::Stdout) => layer.with_ansi(true).boxed(),
            // for server logs, colors are off
            LogStyle::Text => layer.with_ansi(false).boxed(),
            LogStyle::Json => layer.json().boxed(),
        }
    }
}
