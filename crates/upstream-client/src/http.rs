use cynic::QueryBuilder;
use cynic_introspection::IntrospectionQuery;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use schema_composition::SchemaDescriptor;
use serde::{Deserialize, Serialize};

use crate::{RemoteEndpoint, UpstreamClient, UpstreamError};

const USER_AGENT: &str = "random-item-gateway";

/// Talks to the upstream service with GraphQL over HTTP POST requests.
#[derive(Debug, Clone)]
pub struct HttpUpstreamClient {
    endpoint: RemoteEndpoint,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct Request<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<&'a serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Vec<ResponseError>,
}

#[derive(Debug, Deserialize)]
struct ResponseError {
    message: String,
}

impl HttpUpstreamClient {
    pub fn new(endpoint: RemoteEndpoint) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();

        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        for (name, value) in &endpoint.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| UpstreamError::Client(format!("header `{name}`: {err}")))?;

            let value = HeaderValue::from_str(value).map_err(|err| UpstreamError::Client(format!("header `{name}`: {err}")))?;

            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(endpoint.timeout)
            .build()
            .map_err(|err| UpstreamError::Client(err.to_string()))?;

        Ok(HttpUpstreamClient { endpoint, client })
    }

    pub fn endpoint(&self) -> &RemoteEndpoint {
        &self.endpoint
    }

    async fn post(&self, body: &impl Serialize) -> Result<Response, UpstreamError> {
        tracing::debug!(url = %self.endpoint.url, "sending upstream request");

        let timeout = self.endpoint.timeout;

        let response = self
            .client
            .post(self.endpoint.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| UpstreamError::from_reqwest(err, timeout))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| UpstreamError::from_reqwest(err, timeout))?;

        match serde_json::from_slice::<Response>(&bytes) {
            Ok(response) => {
                if !response.errors.is_empty() {
                    let messages: Vec<_> = response.errors.iter().map(|error| error.message.as_str()).collect();
                    tracing::warn!(%status, "upstream returned errors: {}", messages.join(", "));
                }

                Ok(response)
            }
            Err(_) if !status.is_success() => Err(UpstreamError::InvalidResponse(format!("HTTP status {status}"))),
            Err(err) => Err(UpstreamError::InvalidResponse(err.to_string())),
        }
    }
}

fn messages(errors: Vec<ResponseError>) -> Vec<String> {
    errors.into_iter().map(|error| error.message).collect()
}

#[async_trait::async_trait]
impl UpstreamClient for HttpUpstreamClient {
    async fn introspect(&self) -> Result<SchemaDescriptor, UpstreamError> {
        let operation = IntrospectionQuery::build(());
        let Response { data, errors } = self.post(&operation).await?;

        let has_schema = data
            .as_ref()
            .and_then(|data| data.get("__schema"))
            .is_some_and(|schema| !schema.is_null());

        let data = match data {
            Some(data) if has_schema => data,
            // Some servers answer with `"__schema": null` instead of an error.
            Some(_) => return Err(UpstreamError::IntrospectionDisabled(messages(errors))),
            None if !errors.is_empty() => return Err(UpstreamError::IntrospectionDisabled(messages(errors))),
            None => return Err(UpstreamError::InvalidResponse(String::from("the response has no data"))),
        };

        let schema = serde_json::from_value::<IntrospectionQuery>(data)
            .map_err(|err| UpstreamError::InvalidResponse(err.to_string()))?
            .into_schema()
            .map_err(|err| UpstreamError::InvalidResponse(err.to_string()))?;

        SchemaDescriptor::from_introspection(schema).map_err(|err| UpstreamError::InvalidResponse(err.to_string()))
    }

    async fn query(
        &self,
        document: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, UpstreamError> {
        let request = Request {
            query: document,
            variables: variables.as_ref(),
        };

        let Response { data, errors } = self.post(&request).await?;

        if !errors.is_empty() {
            return Err(UpstreamError::GraphQl {
                messages: messages(errors),
                data: data.filter(|data| !data.is_null()),
            });
        }

        data.ok_or_else(|| UpstreamError::InvalidResponse(String::from("the response has neither data nor errors")))
    }
}
