pub mod cors;

use std::{
    collections::BTreeMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

pub use cors::*;
use schema_composition::FieldWhitelist;
use url::Url;

/// The field added to the query root of the upstream schema.
pub const RANDOM_ITEM_FIELD: &str = "randomItem";

pub const DEFAULT_LISTEN_ADDRESS: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Configuration of the random item gateway, usually read from `gateway.toml`.
pub struct Config {
    /// Server bind settings
    pub network: NetworkConfig,
    /// Paths of the GraphQL endpoint and of the playground
    pub graph: GraphConfig,
    /// The GraphQL service the gateway sits in front of
    pub upstream: UpstreamConfig,
    /// Root fields exposed to clients. Only `randomItem` by default.
    pub visibility: FieldWhitelist,
    /// Upstream fields the random item is derived from
    pub random_item: RandomItemConfig,
    /// Cross-origin resource sharing settings
    pub cors: Option<CorsConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: Default::default(),
            graph: Default::default(),
            upstream: Default::default(),
            visibility: FieldWhitelist::only([RANDOM_ITEM_FIELD]),
            random_item: Default::default(),
            cors: Default::default(),
        }
    }
}

impl Config {
    /// Loads the configuration file. A missing file is not an error: `None` is returned and the
    /// defaults apply.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Config>, ConfigError> {
        let path = path.as_ref();

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_owned(),
                    source,
                })
            }
        };

        toml::from_str(&content).map(Some).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    pub listen_address: Option<SocketAddr>,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
    pub path: String,
    /// Serves GraphiQL on `playground_path`
    pub playground: bool,
    pub playground_path: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            path: String::from("/graphql"),
            playground: true,
            playground_path: String::from("/playground"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Required, either here or on the command line.
    pub url: Option<Url>,
    /// Timeout of every upstream request. Default: 30 seconds.
    #[serde(deserialize_with = "duration_str::deserialize_option_duration")]
    pub timeout: Option<Duration>,
    /// Headers sent with every upstream request, introspection included
    pub headers: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RandomItemConfig {
    /// `[Item!]!`, every item with its `id`
    pub list_field: String,
    /// An object with a `count: Int!` field
    pub count_field: String,
    /// `Item(id: ID!): Item`
    pub item_field: String,
    pub id_argument: String,
}

impl Default for RandomItemConfig {
    fn default() -> Self {
        Self {
            list_field: String::from("allItems"),
            count_field: String::from("_allItemsMeta"),
            item_field: String::from("Item"),
            id_argument: String::from("id"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Write, time::Duration};

    use indoc::indoc;

    use super::*;

    #[test]
    fn defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(Config::default(), config);
        assert_eq!("/graphql", config.graph.path);
        assert!(config.graph.playground);
        assert_eq!(None, config.upstream.url);
        assert!(config.visibility.is_visible("randomItem"));
        assert!(!config.visibility.is_visible("allItems"));
        assert_eq!("_allItemsMeta", config.random_item.count_field);
    }

    #[test]
    fn full_config() {
        let input = indoc! {r#"
            [network]
            listen_address = "0.0.0.0:4000"

            [graph]
            path = "/api"
            playground = false

            [upstream]
            url = "https://api.example.com/simple/v1/items"
            timeout = "5s"
            headers = { "x-api-key" = "secret" }

            [visibility]
            "*" = false
            randomItem = true
            allItems = true

            [random_item]
            list_field = "allPosts"
            count_field = "_allPostsMeta"
            item_field = "Post"
        "#};

        let config: Config = toml::from_str(input).unwrap();

        insta::assert_debug_snapshot!(&config, @r###"
        Config {
            network: NetworkConfig {
                listen_address: Some(
                    0.0.0.0:4000,
                ),
            },
            graph: GraphConfig {
                path: "/api",
                playground: false,
                playground_path: "/playground",
            },
            upstream: UpstreamConfig {
                url: Some(
                    Url {
                        scheme: "https",
                        cannot_be_a_base: false,
                        username: "",
                        password: None,
                        host: Some(
                            Domain(
                                "api.example.com",
                            ),
                        ),
                        port: None,
                        path: "/simple/v1/items",
                        query: None,
                        fragment: None,
                    },
                ),
                timeout: Some(
                    5s,
                ),
                headers: {
                    "x-api-key": "secret",
                },
            },
            visibility: FieldWhitelist {
                default: false,
                overrides: {
                    "allItems": true,
                    "randomItem": true,
                },
            },
            random_item: RandomItemConfig {
                list_field: "allPosts",
                count_field: "_allPostsMeta",
                item_field: "Post",
                id_argument: "id",
            },
            cors: None,
        }
        "###);
    }

    #[test]
    fn visibility_without_wildcard_shows_everything_else() {
        let input = indoc! {r#"
            [visibility]
            allItems = false
        "#};

        let config: Config = toml::from_str(input).unwrap();

        assert!(config.visibility.is_visible("randomItem"));
        assert!(config.visibility.is_visible("Item"));
        assert!(!config.visibility.is_visible("allItems"));
    }

    #[test]
    fn timeout_in_milliseconds() {
        let config: Config = toml::from_str("[upstream]\ntimeout = \"250ms\"").unwrap();

        assert_eq!(Some(Duration::from_millis(250)), config.upstream.timeout);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = toml::from_str::<Config>("[upstream]\nendpoint = \"http://localhost\"")
            .unwrap_err()
            .to_string();

        assert!(error.contains("unknown field `endpoint`"), "{error}");
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();

        assert_eq!(None, Config::load(dir.path().join("gateway.toml")).unwrap());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[upstream]\nurl = \"http://127.0.0.1:4000/graphql\"").unwrap();

        let config = Config::load(file.path()).unwrap().unwrap();

        assert_eq!(
            Some("http://127.0.0.1:4000/graphql"),
            config.upstream.url.as_ref().map(Url::as_str)
        );
    }

    #[test]
    fn invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[graph]\nplayground = \"yes\"").unwrap();

        let error = Config::load(file.path()).unwrap_err();

        assert!(matches!(error, ConfigError::Parse { .. }), "{error}");
    }
}
