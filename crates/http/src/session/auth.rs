//! Login, logout, refresh, and the signed-in user

use super::CURRENT_USER_KEY;
use super::interceptor::{LOGIN_ROUTE, Navigator};
use super::token_service::TokenService;
use crate::client::HrClient;
use crate::client::error::ClientError;
use crate::client::interceptor::Notifier;
use hrdesk_core::{
    ActivationRequest, ActivationTokenStatus, LoginRequest, MenuItem, MessageResponse,
    ProfileUpdateRequest, RefreshRequest, RegisterRequest, RegistrationResponse, Storage,
    StorageExt, User,
};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Orchestrates the session against the backend.
///
/// The token lives in [`TokenService`]; this service owns the user resolved
/// for it and keeps both in step. [`AuthService::run`] drives scheduled
/// refreshes and re-resolves the user whenever the token changes.
pub struct AuthService {
    client: HrClient,
    tokens: Arc<TokenService>,
    storage: Arc<dyn Storage>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    user: watch::Sender<Option<User>>,
    /// Access token the published user was fetched with
    resolved_for: Mutex<Option<String>>,
}

impl AuthService {
    pub fn new(
        client: HrClient,
        tokens: Arc<TokenService>,
        storage: Arc<dyn Storage>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (user, _) = watch::channel(None);
        Self {
            client,
            tokens,
            storage,
            navigator,
            notifier,
            user,
            resolved_for: Mutex::new(None),
        }
    }

    /// Startup path: arm the refresh timer for a persisted token and publish
    /// the cached user, without touching the network.
    pub fn init(&self) {
        self.tokens.schedule_refresh();
        if self.check() {
            let cached = self.cached_user();
            debug!(cached = cached.is_some(), "session restored");
            self.user.send_replace(cached);
        }
    }

    /// Whether the session holds a usable token
    pub fn check(&self) -> bool {
        self.tokens.valid()
    }

    /// Receive every change of the signed-in user
    pub fn user(&self) -> watch::Receiver<Option<User>> {
        self.user.subscribe()
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    /// Exchange credentials for a token and resolve the user
    pub async fn login(&self, email: &str, password: &str) -> Result<bool, ClientError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.client.login(&request).await?;

        if let Some(user) = response.user {
            self.publish_user(Some(user), Some(response.token.access_token.clone()))?;
        }
        self.tokens.set(response.token)?;
        self.resolve_user().await;

        let authenticated = self.check();
        if authenticated {
            info!(email, "signed in");
        }
        Ok(authenticated)
    }

    /// Replace the token with a freshly minted one. Any failure clears it.
    pub async fn refresh(&self) -> Result<bool, ClientError> {
        let request = RefreshRequest {
            refresh_token: self.tokens.refresh_token(),
        };

        match self.client.refresh(&request).await {
            Ok(token) => {
                self.tokens.set(token)?;
                debug!("token refreshed");
                Ok(self.check())
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed");
                self.tokens.clear()?;
                Err(err)
            }
        }
    }

    /// Sign out remotely, then locally regardless of the remote outcome.
    ///
    /// Storage failures are logged; the in-memory session is dropped and the
    /// login route reached either way.
    pub async fn logout(&self) -> Result<bool, ClientError> {
        if let Err(err) = self.client.logout().await {
            warn!(error = %err, "logout request failed, clearing local session anyway");
        }

        if let Err(err) = self.tokens.clear() {
            warn!(error = %err, "failed to remove stored token");
        }
        if let Err(err) = self.storage.remove(CURRENT_USER_KEY) {
            warn!(error = %err, "failed to remove cached user");
        }
        self.set_user(None, None);
        self.navigator.navigate(LOGIN_ROUTE);
        info!("signed out");

        Ok(!self.check())
    }

    /// Resolve the user for the current token.
    ///
    /// Fetches `/api/auth/me` unless the published user was already resolved
    /// for this access token. A failed fetch falls back to the cached user
    /// while the token remains usable.
    pub async fn resolve_user(&self) -> Option<User> {
        let Some(access) = self
            .tokens
            .token()
            .filter(|_| self.check())
            .map(|token| token.access_token)
        else {
            self.set_user(None, None);
            return None;
        };

        if self.resolved_access().as_deref() == Some(access.as_str()) {
            if let Some(user) = self.current_user() {
                return Some(user);
            }
        }

        match self.client.me().await {
            Ok(user) => {
                debug!(user = %user.display_name(), "user resolved");
                if let Err(err) = self.storage.set(CURRENT_USER_KEY, &user) {
                    warn!(error = %err, "failed to cache current user");
                }
                self.set_user(Some(user.clone()), Some(access));
                Some(user)
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch current user");
                let fallback = if self.check() { self.cached_user() } else { None };
                self.set_user(fallback.clone(), None);
                fallback
            }
        }
    }

    /// Merge a profile edit into the signed-in user
    pub fn update_current_user(&self, update: &ProfileUpdateRequest) -> Result<(), ClientError> {
        let Some(mut user) = self.current_user() else {
            return Ok(());
        };
        user.apply_profile(update);
        let access = self.resolved_access();
        self.publish_user(Some(user), access)
    }

    /// Update a profile and mirror the change when it is the signed-in user's
    pub async fn update_profile(
        &self,
        user_id: i64,
        update: &ProfileUpdateRequest,
    ) -> Result<(), ClientError> {
        self.client.update_profile(user_id, update).await?;

        if self.current_user().and_then(|user| user.id) == Some(user_id) {
            self.update_current_user(update)?;
        }
        self.notifier.success("Profile updated");
        Ok(())
    }

    /// Navigation menu, empty when signed out
    pub async fn menu(&self) -> Result<Vec<MenuItem>, ClientError> {
        if !self.check() {
            return Ok(Vec::new());
        }
        self.client.menu().await
    }

    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<RegistrationResponse, ClientError> {
        self.client.register(request).await
    }

    pub async fn resend_activation_email(
        &self,
        email: &str,
    ) -> Result<MessageResponse, ClientError> {
        self.client.resend_activation_email(email).await
    }

    pub async fn validate_activation_token(
        &self,
        token: &str,
    ) -> Result<ActivationTokenStatus, ClientError> {
        self.client.validate_activation_token(token).await
    }

    pub async fn activate_account(
        &self,
        request: &ActivationRequest,
    ) -> Result<MessageResponse, ClientError> {
        self.client.activate_account(request).await
    }

    /// Refresh tokens when due and re-resolve the user on every token change,
    /// until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut changes = self.tokens.subscribe();
        let mut due = self.tokens.subscribe_refresh();
        // A timer armed before subscribing (an expired token at startup is due
        // at once) may already have fired unheard
        self.tokens.schedule_refresh();

        self.resolve_user().await;

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => break,

                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    changes.borrow_and_update();
                    self.resolve_user().await;
                }

                event = due.recv() => match event {
                    Ok(_) => {
                        if let Err(err) = self.refresh().await {
                            debug!(error = %err, "scheduled refresh did not complete");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "refresh events lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        debug!("session loop stopped");
    }

    fn cached_user(&self) -> Option<User> {
        self.storage
            .get::<User>(CURRENT_USER_KEY)
            .unwrap_or_else(|err| {
                warn!(error = %err, "ignoring unreadable cached user");
                None
            })
    }

    fn resolved_access(&self) -> Option<String> {
        self.resolved_for
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Persist and publish
    fn publish_user(&self, user: Option<User>, access: Option<String>) -> Result<(), ClientError> {
        if let Some(user) = &user {
            self.storage.set(CURRENT_USER_KEY, user)?;
        }
        self.set_user(user, access);
        Ok(())
    }

    fn set_user(&self, user: Option<User>, access: Option<String>) {
        *self
            .resolved_for
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = access;
        self.user.send_replace(user);
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("authenticated", &self.check())
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}
