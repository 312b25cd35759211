//! Datadog HTTP API client implementation.
//!
//! Transport concerns only: authentication headers, rate-limit and network
//! retries, and list-envelope unwrapping. The engine never retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, header};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{ConfigError, KennelError, RemoteError, Result};

use super::DatadogApi;
use super::types::ResourceType;

/// Datadog API base URL.
const DATADOG_API_URL: &str = "https://api.datadoghq.com";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for transient failures.
const MAX_RETRIES: u32 = 3;

/// Delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// API credentials and site settings, read from the environment.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    /// Datadog API key.
    pub api_key: String,
    /// Datadog application key.
    pub app_key: String,
    /// Optional account subdomain, used for absolute UI links.
    pub subdomain: Option<String>,
}

impl ApiCredentials {
    /// Reads credentials from `DATADOG_API_KEY`, `DATADOG_APP_KEY` and the
    /// optional `DATADOG_SUBDOMAIN`.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| {
            std::env::var(name).map_err(|_| {
                KennelError::Config(ConfigError::MissingEnvVar {
                    name: name.to_string(),
                })
            })
        };

        Ok(Self {
            api_key: var("DATADOG_API_KEY")?,
            app_key: var("DATADOG_APP_KEY")?,
            subdomain: std::env::var("DATADOG_SUBDOMAIN").ok(),
        })
    }
}

/// Datadog API client.
#[derive(Debug, Clone)]
pub struct DatadogClient {
    /// HTTP client.
    client: Client,
    /// API base URL.
    base_url: String,
    /// Credentials.
    credentials: ApiCredentials,
}

impl DatadogClient {
    /// Creates a new Datadog API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(credentials: ApiCredentials) -> Result<Self> {
        Self::with_base_url(credentials, DATADOG_API_URL)
    }

    /// Creates a client against a custom base URL (used in tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_base_url(credentials: ApiCredentials, base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| RemoteError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            credentials,
        })
    }

    /// Executes a request with transient-failure retries.
    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                debug!("Retry attempt {attempt} of {MAX_RETRIES}");
                tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt)))
                    .await;
            }

            match self.request_once(method.clone(), path, body).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if e.is_retryable() {
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            KennelError::Remote(RemoteError::NetworkError {
                message: String::from("Max retries exceeded"),
            })
        }))
    }

    /// Executes a single request.
    async fn request_once(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = format!("{}{path}", self.base_url);
        trace!("{method} {url}");

        let mut request = self
            .client
            .request(method, &url)
            .header(header::CONTENT_TYPE, "application/json")
            .header("DD-API-KEY", &self.credentials.api_key)
            .header("DD-APPLICATION-KEY", &self.credentials.app_key);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            KennelError::Remote(RemoteError::NetworkError {
                message: format!("Request failed: {e}"),
            })
        })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or_default();
            let retry_after = if retry_after == 0 { 60 } else { retry_after };

            return Err(KennelError::Remote(RemoteError::RateLimited {
                retry_after_secs: retry_after,
            }));
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(KennelError::Remote(RemoteError::AuthenticationFailed {
                message: String::from("Invalid API or application key"),
            }));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KennelError::Remote(RemoteError::api_error(
                status.as_u16(),
                body,
            )));
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        response.json().await.map_err(|e| {
            KennelError::Remote(RemoteError::invalid_response(format!(
                "Failed to parse response: {e}"
            )))
        })
    }

    /// Base path for a resource type.
    fn api_path(resource: ResourceType) -> String {
        format!("/api/v1/{}", resource.api_resource())
    }

    /// Unwraps a `{"data": ...}` detail envelope where the API uses one.
    fn unwrap_detail(resource: ResourceType, value: Value) -> Result<Value> {
        if resource != ResourceType::Slo {
            return Ok(value);
        }
        match value {
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(mut items)) if !items.is_empty() => Ok(items.remove(0)),
                Some(Value::Array(_)) | None => {
                    Err(KennelError::Remote(RemoteError::invalid_response(
                        "slo response carried no data",
                    )))
                }
                Some(detail) => Ok(detail),
            },
            other => Ok(other),
        }
    }
}

#[async_trait]
impl DatadogApi for DatadogClient {
    async fn list(&self, resource: ResourceType) -> Result<Vec<Value>> {
        let value = self
            .request(Method::GET, &Self::api_path(resource), None)
            .await?;

        let listed = match resource.list_envelope() {
            None => value,
            Some(key) => match value {
                Value::Object(mut map) => map.remove(key).ok_or_else(|| {
                    KennelError::Remote(RemoteError::invalid_response(format!(
                        "{resource} list response is missing the {key} envelope"
                    )))
                })?,
                other => other,
            },
        };

        match listed {
            Value::Array(items) => Ok(items),
            _ => Err(KennelError::Remote(RemoteError::invalid_response(format!(
                "{resource} list response is not an array"
            )))),
        }
    }

    async fn show(&self, resource: ResourceType, id: &str) -> Result<Value> {
        let path = format!("{}/{id}", Self::api_path(resource));
        let value = self.request(Method::GET, &path, None).await?;
        Self::unwrap_detail(resource, value)
    }

    async fn create(&self, resource: ResourceType, payload: &Value) -> Result<Value> {
        let value = self
            .request(Method::POST, &Self::api_path(resource), Some(payload))
            .await?;
        Self::unwrap_detail(resource, value)
    }

    async fn update(&self, resource: ResourceType, id: &str, payload: &Value) -> Result<Value> {
        let path = format!("{}/{id}", Self::api_path(resource));
        let value = self.request(Method::PUT, &path, Some(payload)).await?;
        Self::unwrap_detail(resource, value)
    }

    async fn delete(&self, resource: ResourceType, id: &str) -> Result<()> {
        let path = format!("{}/{id}", Self::api_path(resource));
        self.request(Method::DELETE, &path, None).await?;
        Ok(())
    }
}
