//! hrdesk HTTP client

pub mod auth;
pub mod error;
pub mod interceptor;
pub mod profile;
pub mod users;

use error::ClientError;
use interceptor::Interceptor;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// HR console API client.
///
/// Every request is passed through the registered interceptors, which is how
/// the session attaches bearer tokens and reacts to rejections.
#[derive(Clone)]
pub struct HrClient {
    client: Client,
    base_url: String,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl std::fmt::Debug for HrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HrClient")
            .field("base_url", &self.base_url)
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

impl HrClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> HrClientBuilder {
        HrClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a request builder for a path relative to the base URL
    pub fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    /// Execute a request and decode its JSON body; an empty body decodes as `null`
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let body = self.send(request).await?;
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        Ok(serde_json::from_str(body)?)
    }

    /// Execute a request whose response body is irrelevant
    pub async fn execute_empty(&self, request: RequestBuilder) -> Result<(), ClientError> {
        self.send(request).await.map(|_| ())
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, ClientError> {
        let mut request = request.build()?;
        for interceptor in &self.interceptors {
            interceptor.on_request(&mut request);
        }

        let url = request.url().clone();
        debug!(method = %request.method(), url = %url, "sending request");

        let response = self.client.execute(request).await?;
        let status = response.status();

        if !status.is_success() {
            for interceptor in &self.interceptors {
                interceptor.on_error_status(&url, status);
            }
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(ClientError::from_status(status, message));
        }

        let body = response.text().await?;
        for interceptor in &self.interceptors {
            interceptor.on_body(&url, &body)?;
        }
        Ok(body)
    }
}

/// Builder for HrClient
#[derive(Default)]
pub struct HrClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl HrClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Append an interceptor to the chain
    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<HrClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new();

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        client_builder = client_builder.user_agent(
            self.user_agent
                .unwrap_or_else(|| concat!("hrdesk/", env!("CARGO_PKG_VERSION")).to_string()),
        );

        let client = client_builder.build()?;

        Ok(HrClient {
            client,
            base_url,
            interceptors: self.interceptors,
        })
    }
}
