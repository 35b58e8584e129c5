//! Request/response hooks applied to every call made by [`HrClient`](super::HrClient)

use super::error::ClientError;
use reqwest::{Request, StatusCode, Url};
use std::sync::Arc;

/// Paths that authenticate the caller and must never carry a session token
pub const AUTH_ENDPOINTS: &[&str] = &[
    "/auth/login",
    "/auth/register",
    "/auth/activate",
    "/auth/validate-activation-token",
];

/// Whether `url` targets an authentication endpoint
pub fn is_auth_endpoint(url: &str) -> bool {
    AUTH_ENDPOINTS.iter().any(|endpoint| url.contains(endpoint))
}

/// Hook run around each request, in registration order
pub trait Interceptor: Send + Sync {
    /// Adjust the outgoing request
    fn on_request(&self, _request: &mut Request) {}

    /// Observe a non-success status before the error reaches the caller
    fn on_error_status(&self, _url: &Url, _status: StatusCode) {}

    /// Inspect a successful response body; an error fails the call
    fn on_body(&self, _url: &Url, _body: &str) -> Result<(), ClientError> {
        Ok(())
    }
}

/// Sink for user-facing notifications (toasts in a UI, log lines in the CLI)
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
    fn success(&self, message: &str);
}

/// Notifier that writes to the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn error(&self, message: &str) {
        tracing::warn!(target: "hrdesk::notify", "{message}");
    }

    fn success(&self, message: &str) {
        tracing::info!(target: "hrdesk::notify", "{message}");
    }
}

/// Fails `/api/` calls whose JSON envelope carries a non-zero `code`
#[derive(Clone)]
pub struct EnvelopeInterceptor {
    notifier: Arc<dyn Notifier>,
}

impl EnvelopeInterceptor {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

impl Interceptor for EnvelopeInterceptor {
    fn on_body(&self, url: &Url, body: &str) -> Result<(), ClientError> {
        if is_auth_endpoint(url.path()) || !url.path().contains("/api/") {
            return Ok(());
        }

        let Ok(serde_json::Value::Object(envelope)) = serde_json::from_str(body) else {
            return Ok(());
        };
        let Some(code) = envelope.get("code").and_then(serde_json::Value::as_i64) else {
            return Ok(());
        };
        if code == 0 {
            return Ok(());
        }

        let message = envelope
            .get("msg")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();
        if !message.is_empty() {
            self.notifier.error(&message);
        }
        Err(ClientError::Api { code, message })
    }
}
