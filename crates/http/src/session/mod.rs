//! Session context: storage, token lifecycle, client, and auth service wired
//! together once and passed around by reference.

pub mod auth;
pub mod interceptor;
pub mod token_service;

use crate::client::HrClient;
use crate::client::error::ClientError;
use crate::client::interceptor::{EnvelopeInterceptor, LogNotifier, Notifier};
use crate::config::SessionConfig;
use hrdesk_core::{FileStorage, Storage};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

pub use auth::AuthService;
pub use interceptor::{LOGIN_ROUTE, Navigator, TokenInterceptor};
pub use token_service::{TOKEN_KEY, TokenService};

/// Storage key of the cached signed-in user
pub const CURRENT_USER_KEY: &str = "current-user";

/// Route tracker standing in for a UI router
#[derive(Debug)]
pub struct Router {
    route: watch::Sender<String>,
}

impl Router {
    pub fn new(initial: impl Into<String>) -> Self {
        let (route, _) = watch::channel(initial.into());
        Self { route }
    }

    pub fn current(&self) -> String {
        self.route.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.route.subscribe()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for Router {
    fn navigate(&self, route: &str) {
        info!(route, "navigating");
        self.route.send_replace(route.to_string());
    }
}

/// Everything a front end needs to talk to the backend as one user
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    tokens: Arc<TokenService>,
    router: Arc<Router>,
    client: HrClient,
    auth: Arc<AuthService>,
}

impl Session {
    pub fn builder(config: SessionConfig) -> SessionBuilder {
        SessionBuilder {
            config,
            storage: None,
            notifier: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Client with the token and envelope interceptors installed
    pub fn client(&self) -> &HrClient {
        &self.client
    }

    pub fn auth(&self) -> &Arc<AuthService> {
        &self.auth
    }
}

/// Builder for [`Session`]
pub struct SessionBuilder {
    config: SessionConfig,
    storage: Option<Arc<dyn Storage>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl SessionBuilder {
    /// Persist into `storage` instead of the configured state directory
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Wire the session and restore any persisted state
    pub fn build(self) -> Result<Session, ClientError> {
        let config = self.config;
        let base_url = url::Url::parse(&config.base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid base_url: {e}")))?;

        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(FileStorage::new(&config.state_dir)));
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(LogNotifier));
        let router = Arc::new(Router::default());

        let tokens = Arc::new(TokenService::new(
            storage.clone(),
            config.refresh_lead_secs,
        ));

        let client = HrClient::builder()
            .base_url(&config.base_url)
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .interceptor(Arc::new(TokenInterceptor::new(
                tokens.clone(),
                router.clone(),
                Some(base_url),
            )))
            .interceptor(Arc::new(EnvelopeInterceptor::new(notifier.clone())))
            .build()?;

        let auth = Arc::new(AuthService::new(
            client.clone(),
            tokens.clone(),
            storage,
            router.clone(),
            notifier,
        ));
        auth.init();

        Ok(Session {
            config,
            tokens,
            router,
            client,
            auth,
        })
    }
}
