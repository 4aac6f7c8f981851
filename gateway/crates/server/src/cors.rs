use gateway_config::{AnyOrAsciiStringArray, AnyOrHttpMethodArray, AnyOrUrlArray, CorsConfig, InvalidCorsValue};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer, ExposeHeaders};

/// Builds the CORS layer. Browsers refuse credentials together with wildcards, and so does
/// `tower-http` by panicking, so such a configuration is an error here.
pub(crate) fn generate(config: &CorsConfig) -> crate::Result<CorsLayer> {
    if config.allow_credentials {
        let wildcard = matches!(config.allow_origins, Some(AnyOrUrlArray::Any))
            || matches!(config.allow_methods, Some(AnyOrHttpMethodArray::Any))
            || matches!(config.allow_headers, Some(AnyOrAsciiStringArray::Any))
            || matches!(config.expose_headers, Some(AnyOrAsciiStringArray::Any));

        if wildcard {
            return Err(crate::Error::InvalidCors(String::from(
                "credentials cannot be allowed together with \"any\"",
            )));
        }
    }

    let mut cors_layer = CorsLayer::new().allow_credentials(config.allow_credentials);

    if let Some(allow_origins) = &config.allow_origins {
        cors_layer = cors_layer.allow_origin(AllowOrigin::try_from(allow_origins).map_err(invalid)?);
    }

    if let Some(max_age) = config.max_age {
        cors_layer = cors_layer.max_age(max_age);
    }

    if let Some(allow_methods) = &config.allow_methods {
        cors_layer = cors_layer.allow_methods(allow_methods);
    }

    if let Some(allow_headers) = &config.allow_headers {
        cors_layer = cors_layer.allow_headers(AllowHeaders::try_from(allow_headers).map_err(invalid)?);
    }

    if let Some(expose_headers) = &config.expose_headers {
        cors_layer = cors_layer.expose_headers(ExposeHeaders::try_from(expose_headers).map_err(invalid)?);
    }

    Ok(cors_layer)
}

fn invalid(error: InvalidCorsValue) -> crate::Error {
    crate::Error::InvalidCors(error.to_string())
}

#[cfg(test)]
mod tests {
    use gateway_config::{AnyOrAsciiStringArray, AnyOrUrlArray, CorsConfig};

    use super::generate;

    #[test]
    fn credentials_with_any_origin() {
        let config = CorsConfig {
            allow_credentials: true,
            allow_origins: Some(AnyOrUrlArray::Any),
            ..Default::default()
        };

        assert!(matches!(generate(&config), Err(crate::Error::InvalidCors(_))));
    }

    #[test]
    fn credentials_with_explicit_origins() {
        let config = CorsConfig {
            allow_credentials: true,
            allow_origins: Some(AnyOrUrlArray::Explicit(vec!["https://app.example.com".parse().unwrap()])),
            ..Default::default()
        };

        assert!(generate(&config).is_ok());
    }

    #[test]
    fn invalid_header_names_are_rejected() {
        let config = CorsConfig {
            expose_headers: Some(AnyOrAsciiStringArray::Explicit(vec![
                "x-request-id".parse().unwrap(),
                "bad header".parse().unwrap(),
            ])),
            ..Default::default()
        };

        let error = generate(&config).unwrap_err();

        assert_eq!(
            "invalid CORS configuration: `bad header` is not a valid header name",
            error.to_string()
        );
    }
}
