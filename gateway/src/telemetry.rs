use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::args::Args;

/// Installs the global subscriber: the filter derived from `--log`, formatted per `--log-style`.
pub(crate) fn init(args: &Args) -> anyhow::Result<()> {
    let env_filter = EnvFilter::new(args.log_filter());

    tracing_subscriber::registry()
        .with(args.log_format())
        .with(env_filter)
        .try_init()?;

    Ok(())
}
