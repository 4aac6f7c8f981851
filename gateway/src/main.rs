#![cfg_attr(test, allow(unused_crate_dependencies))]

use std::process::ExitCode;

use args::Args;
use clap::crate_version;
use gateway_server::ServeConfig;
use mimalloc::MiMalloc;
use tokio::runtime;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod args;
mod config;
mod telemetry;

const THREAD_NAME: &str = "random-item-gateway";

fn main() -> anyhow::Result<ExitCode> {
    let args = self::args::parse();

    telemetry::init(&args)?;

    // From here on, errors are reported through the installed subscriber, once.
    match run(&args) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            tracing::error!("{err:#}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = self::config::load(args)?;

    let runtime = runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name(THREAD_NAME)
        .build()?;

    runtime.block_on(async move {
        let crate_version = crate_version!();
        tracing::info!("Random Item Gateway {crate_version}");

        let config = ServeConfig {
            listen_address: self::config::listen_address(&config),
            config,
        };

        gateway_server::serve(config).await?;

        Ok::<(), anyhow::Error>(())
    })
}
