use std::net::SocketAddr;

use anyhow::Context;
use gateway_config::{Config, DEFAULT_LISTEN_ADDRESS};

use crate::args::Args;

/// Reads the configuration file, if any, and applies the command line on top of it.
pub(crate) fn load(args: &Args) -> anyhow::Result<Config> {
    let mut config = Config::load(&args.config)
        .context("loading the configuration")?
        .unwrap_or_default();

    merge(&mut config, args);

    if config.upstream.url.is_none() {
        anyhow::bail!(
            "no upstream URL configured, set `upstream.url` in {} or pass --upstream-url",
            args.config.display()
        );
    }

    Ok(config)
}

fn merge(config: &mut Config, args: &Args) {
    if let Some(url) = &args.upstream_url {
        config.upstream.url = Some(url.clone());
    }

    if let Some(listen_address) = args.listen_address {
        config.network.listen_address = Some(listen_address);
    }
}

pub(crate) fn listen_address(config: &Config) -> SocketAddr {
    config.network.listen_address.unwrap_or(DEFAULT_LISTEN_ADDRESS)
}
