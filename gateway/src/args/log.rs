use std::fmt;

use clap::ValueEnum;

/// The crates whose logs are shown below the `trace` level.
const GATEWAY_CRATES: &[&str] = &[
    "random_item_gateway",
    "gateway_server",
    "gateway_engine",
    "schema_composition",
    "upstream_client",
];

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum LogLevel {
    /// Completely disables logging
    Off,
    /// Only errors from the gateway
    Error,
    /// Warnings and errors from the gateway
    Warn,
    /// Info, warning and error messages from the gateway
    #[default]
    Info,
    /// Debug, info, warning and error messages from the gateway
    Debug,
    /// Trace, debug, info, warning and error messages from all dependencies
    Trace,
}

impl LogLevel {
    pub(crate) fn as_filter_string(&self) -> String {
        match self {
            LogLevel::Off => String::from("off"),
            LogLevel::Trace => String::from("trace"),
            level => GATEWAY_CRATES
                .iter()
                .map(|name| format!("{name}={level}"))
                .chain(std::iter::once(String::from("off")))
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl AsRef<str> for LogLevel {
    fn as_ref(&self) -> &str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum LogStyle {
    /// Standard text
    Text,
    /// JSON objects
    Json,
}

impl AsRef<str> for LogStyle {
    fn as_ref(&self) -> &str {
        match self {
            LogStyle::Text => "text",
            LogStyle::Json => "json",
        }
    }
}

impl fmt::Display for LogStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}
