//! Generic network client for the Route4Me API.
//!
//! # Design
//! `NetworkClient` composes requests from a logical description (method,
//! path, subdomain, query map, JSON body) and decodes responses, but never
//! performs I/O itself. The host plugs in a [`Transport`] that executes an
//! `HttpRequest` and hands back an `HttpResponse`. `build_request` is public
//! so the composed request can be inspected or executed out of band.

use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes an HTTP round-trip on behalf of the client.
///
/// Implementations should return non-2xx responses as data rather than as
/// errors so the client can interpret the status.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

#[derive(Debug, Clone)]
pub struct NetworkClient<T> {
    config: ClientConfig,
    transport: T,
}

impl<T> NetworkClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Compose a request without sending it.
    ///
    /// The API key always leads the query string; an `api_key` entry in
    /// `query` is ignored. `null` query values are skipped.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        subdomain: &str,
        query: Option<&Map<String, Value>>,
        data: Option<&Value>,
    ) -> Result<HttpRequest, ApiError> {
        let mut url = url::Url::parse(&self.config.endpoint(subdomain, path))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api_key", &self.config.api_key);
            for (key, value) in query.into_iter().flatten() {
                if key == "api_key" || value.is_null() {
                    continue;
                }
                pairs.append_pair(key, &query_value(value));
            }
        }

        let mut headers = vec![("user-agent".to_string(), self.config.user_agent.clone())];
        let body = match data {
            Some(data) => {
                headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(serde_json::to_string(data).map_err(|e| ApiError::Serialization(e.to_string()))?)
            }
            None => None,
        };

        Ok(HttpRequest {
            method,
            url: url.into(),
            headers,
            body,
        })
    }
}

impl<T: Transport> NetworkClient<T> {
    pub fn get(&self, path: &str, subdomain: &str, query: Option<&Map<String, Value>>) -> Result<Value, ApiError> {
        let response = self.send(HttpMethod::Get, path, subdomain, query, None)?;
        decode_json(&response)
    }

    /// GET returning the raw body, for endpoints that answer in XML or CSV.
    pub fn get_text(
        &self,
        path: &str,
        subdomain: &str,
        query: Option<&Map<String, Value>>,
    ) -> Result<String, ApiError> {
        Ok(self.send(HttpMethod::Get, path, subdomain, query, None)?.body)
    }

    pub fn post(
        &self,
        path: &str,
        subdomain: &str,
        query: Option<&Map<String, Value>>,
        data: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let response = self.send(HttpMethod::Post, path, subdomain, query, data)?;
        decode_json(&response)
    }

    pub fn put(
        &self,
        path: &str,
        subdomain: &str,
        query: Option<&Map<String, Value>>,
        data: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let response = self.send(HttpMethod::Put, path, subdomain, query, data)?;
        decode_json(&response)
    }

    pub fn delete(&self, path: &str, subdomain: &str, query: Option<&Map<String, Value>>) -> Result<Value, ApiError> {
        let response = self.send(HttpMethod::Delete, path, subdomain, query, None)?;
        decode_json(&response)
    }

    fn send(
        &self,
        method: HttpMethod,
        path: &str,
        subdomain: &str,
        query: Option<&Map<String, Value>>,
        data: Option<&Value>,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.build_request(method, path, subdomain, query, data)?;
        log::debug!("{method} {}", self.config.endpoint(subdomain, path));
        let response = self.transport.execute(request)?;
        check_status(&response)?;
        Ok(response)
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
pub fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    log::warn!("request failed with HTTP {}", response.status);
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

/// Decode a JSON body. An empty body decodes to `null`.
pub fn decode_json(response: &HttpResponse) -> Result<Value, ApiError> {
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Array(items) => items.iter().map(query_value).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}
