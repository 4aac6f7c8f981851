use std::time::Duration;

use ascii::AsciiString;
use duration_str::deserialize_option_duration;
use http::{HeaderName, HeaderValue};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, ExposeHeaders};
use url::Url;

#[derive(Clone, Default, Debug, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// If false (or not defined), credentials are not allowed in requests
    pub allow_credentials: bool,
    /// Origins from which we allow requests, `"any"` or a list of URLs
    pub allow_origins: Option<AnyOrUrlArray>,
    /// Maximum time between OPTIONS and the next request
    #[serde(deserialize_with = "deserialize_option_duration")]
    pub max_age: Option<Duration>,
    /// HTTP methods allowed to the endpoint.
    pub allow_methods: Option<AnyOrHttpMethodArray>,
    /// Headers allowed in incoming requests
    pub allow_headers: Option<AnyOrAsciiStringArray>,
    /// Headers exposed from the OPTIONS request
    pub expose_headers: Option<AnyOrAsciiStringArray>,
}

/// A `[cors]` entry that cannot be sent in an HTTP header.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidCorsValue {
    #[error("`{0}` is not an origin, expected `scheme://host[:port]`")]
    Origin(String),
    #[error("`{0}` is not a valid header name")]
    HeaderName(String),
}

#[derive(Debug, PartialEq, Clone, Copy, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Head,
    Options,
}

impl From<HttpMethod> for http::Method {
    fn from(value: HttpMethod) -> Self {
        match value {
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Post => http::Method::POST,
            HttpMethod::Head => http::Method::HEAD,
            HttpMethod::Options => http::Method::OPTIONS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
#[serde(expecting = "expecting string \"any\", or an array of urls")]
pub enum AnyOrUrlArray {
    Any,
    #[serde(untagged)]
    Explicit(Vec<Url>),
}

impl TryFrom<&AnyOrUrlArray> for AllowOrigin {
    type Error = InvalidCorsValue;

    fn try_from(value: &AnyOrUrlArray) -> Result<Self, Self::Error> {
        match value {
            AnyOrUrlArray::Any => Ok(AllowOrigin::any()),
            AnyOrUrlArray::Explicit(origins) => {
                let origins = origins.iter().map(origin).collect::<Result<Vec<_>, _>>()?;
                Ok(AllowOrigin::list(origins))
            }
        }
    }
}

/// Browsers send `scheme://host[:port]`, without the trailing slash a parsed URL carries.
fn origin(url: &Url) -> Result<HeaderValue, InvalidCorsValue> {
    let origin = url.origin();

    if !origin.is_tuple() || url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(InvalidCorsValue::Origin(url.to_string()));
    }

    HeaderValue::from_str(&origin.ascii_serialization()).map_err(|_| InvalidCorsValue::Origin(url.to_string()))
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
#[serde(expecting = "expecting string \"any\", or an array of capitalized HTTP methods")]
pub enum AnyOrHttpMethodArray {
    Any,
    #[serde(untagged)]
    Explicit(Vec<HttpMethod>),
}

impl From<&AnyOrHttpMethodArray> for AllowMethods {
    fn from(value: &AnyOrHttpMethodArray) -> Self {
        match value {
            AnyOrHttpMethodArray::Any => AllowMethods::any(),
            AnyOrHttpMethodArray::Explicit(methods) => {
                let methods = methods.iter().map(|method| http::Method::from(*method)).collect::<Vec<_>>();
                AllowMethods::list(methods)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
#[serde(expecting = "expecting string \"any\", or an array of ASCII strings")]
pub enum AnyOrAsciiStringArray {
    Any,
    #[serde(untagged)]
    Explicit(Vec<AsciiString>),
}

impl AnyOrAsciiStringArray {
    fn header_names(headers: &[AsciiString]) -> Result<Vec<HeaderName>, InvalidCorsValue> {
        headers
            .iter()
            .map(|header| {
                HeaderName::from_bytes(header.as_bytes()).map_err(|_| InvalidCorsValue::HeaderName(header.to_string()))
            })
            .collect()
    }
}

impl TryFrom<&AnyOrAsciiStringArray> for AllowHeaders {
    type Error = InvalidCorsValue;

    fn try_from(value: &AnyOrAsciiStringArray) -> Result<Self, Self::Error> {
        match value {
            AnyOrAsciiStringArray::Any => Ok(AllowHeaders::any()),
            AnyOrAsciiStringArray::Explicit(headers) => {
                AnyOrAsciiStringArray::header_names(headers).map(AllowHeaders::list)
            }
        }
    }
}

impl TryFrom<&AnyOrAsciiStringArray> for ExposeHeaders {
    type Error = InvalidCorsValue;

    fn try_from(value: &AnyOrAsciiStringArray) -> Result<Self, Self::Error> {
        match value {
            AnyOrAsciiStringArray::Any => Ok(ExposeHeaders::any()),
            AnyOrAsciiStringArray::Explicit(headers) => {
                AnyOrAsciiStringArray::header_names(headers).map(ExposeHeaders::list)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use indoc::indoc;

    use tower_http::cors::{AllowHeaders, AllowOrigin};

    use crate::{AnyOrAsciiStringArray, AnyOrHttpMethodArray, AnyOrUrlArray, Config, HttpMethod, InvalidCorsValue};

    #[test]
    fn explicit_cors() {
        let input = indoc! {r#"
            [cors]
            allow_credentials = true
            allow_origins = ["https://app.example.com"]
            max_age = "60s"
            allow_methods = ["GET", "POST"]
            allow_headers = ["content-type"]
            expose_headers = "any"
        "#};

        let config: Config = toml::from_str(input).unwrap();
        let cors = config.cors.unwrap();

        assert!(cors.allow_credentials);
        assert_eq!(
            Some(AnyOrUrlArray::Explicit(vec!["https://app.example.com".parse().unwrap()])),
            cors.allow_origins
        );
        assert_eq!(Some(Duration::from_secs(60)), cors.max_age);
        assert_eq!(
            Some(AnyOrHttpMethodArray::Explicit(vec![HttpMethod::Get, HttpMethod::Post])),
            cors.allow_methods
        );
        assert_eq!(
            Some(AnyOrAsciiStringArray::Explicit(vec!["content-type".parse().unwrap()])),
            cors.allow_headers
        );
        assert_eq!(Some(AnyOrAsciiStringArray::Any), cors.expose_headers);
    }

    #[test]
    fn any_origin() {
        let config: Config = toml::from_str("[cors]\nallow_origins = \"any\"").unwrap();

        assert_eq!(Some(AnyOrUrlArray::Any), config.cors.unwrap().allow_origins);
    }

    #[test]
    fn unsupported_method() {
        assert!(toml::from_str::<Config>("[cors]\nallow_methods = [\"DELETE\"]").is_err());
    }

    #[test]
    fn invalid_header_names_are_reported() {
        let config: Config = toml::from_str("[cors]\nallow_headers = [\"content-type\", \"bad header\"]").unwrap();
        let headers = config.cors.unwrap().allow_headers.unwrap();

        assert_eq!(
            Err(InvalidCorsValue::HeaderName(String::from("bad header"))),
            AllowHeaders::try_from(&headers).map(|_| ())
        );
        assert_eq!(
            "`bad header` is not a valid header name",
            AllowHeaders::try_from(&headers).map(|_| ()).unwrap_err().to_string()
        );
    }

    #[test]
    fn origins_must_not_carry_a_path() {
        let config: Config =
            toml::from_str("[cors]\nallow_origins = [\"https://app.example.com\", \"https://app.example.com/admin\"]")
                .unwrap();
        let origins = config.cors.unwrap().allow_origins.unwrap();

        assert_eq!(
            Err(InvalidCorsValue::Origin(String::from("https://app.example.com/admin"))),
            AllowOrigin::try_from(&origins).map(|_| ())
        );

        let config: Config = toml::from_str("[cors]\nallow_origins = [\"http://localhost:8080\"]").unwrap();
        assert!(AllowOrigin::try_from(&config.cors.unwrap().allow_origins.unwrap()).is_ok());
    }
}
