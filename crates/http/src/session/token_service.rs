//! Persisted token with change notifications and a one-shot refresh timer

use hrdesk_core::{CoreResult, Storage, StorageExt, Token, TokenState, now_timestamp};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Storage key of the persisted token record
pub const TOKEN_KEY: &str = "hrdesk-token";

/// Owns the single token record of a session.
///
/// Every replacement is persisted, published on the change channel, and
/// re-arms the refresh timer. Writes are serialized and the pending timer is
/// swapped and aborted under one lock, so at most one refresh-due event is
/// pending at any time, even with concurrent writers.
pub struct TokenService {
    storage: Arc<dyn Storage>,
    refresh_lead: i64,
    changes: watch::Sender<Option<Token>>,
    refresh_due: broadcast::Sender<Token>,
    /// Serializes persist, publish and arm across `set`/`clear`
    writes: Mutex<()>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl TokenService {
    /// Load the persisted token, if any. A corrupt record is discarded.
    pub fn new(storage: Arc<dyn Storage>, refresh_lead: i64) -> Self {
        let token = match storage.get::<Token>(TOKEN_KEY) {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "discarding unreadable token record");
                if let Err(err) = storage.remove(TOKEN_KEY) {
                    warn!(error = %err, "failed to remove unreadable token record");
                }
                None
            }
        };

        let (changes, _) = watch::channel(token);
        let (refresh_due, _) = broadcast::channel(4);

        Self {
            storage,
            refresh_lead,
            changes,
            refresh_due,
            writes: Mutex::new(()),
            timer: Mutex::new(None),
        }
    }

    /// Receive every token replacement (`None` once cleared)
    pub fn subscribe(&self) -> watch::Receiver<Option<Token>> {
        self.changes.subscribe()
    }

    /// Receive refresh-due events; one per armed timer
    pub fn subscribe_refresh(&self) -> broadcast::Receiver<Token> {
        self.refresh_due.subscribe()
    }

    /// Current token record
    pub fn token(&self) -> Option<Token> {
        self.changes.borrow().clone()
    }

    /// Replace the token, stamping its absolute expiry
    pub fn set(&self, token: Token) -> CoreResult<()> {
        let token = token.stamped(now_timestamp());
        let _writing = self.lock_writes();

        self.storage.set(TOKEN_KEY, &token)?;
        debug!(exp = ?token.exp, "token stored");

        self.changes.send_replace(Some(token));
        self.arm_refresh();
        Ok(())
    }

    /// Forget the token locally and in storage.
    ///
    /// The in-memory token is dropped even when the storage removal fails.
    pub fn clear(&self) -> CoreResult<()> {
        let _writing = self.lock_writes();

        self.arm_refresh_with(None);
        let previous = self.changes.send_replace(None);
        if previous.is_some() {
            info!("token cleared");
        }
        self.storage.remove(TOKEN_KEY)
    }

    /// Whether a usable access token is present
    pub fn valid(&self) -> bool {
        self.changes
            .borrow()
            .as_ref()
            .is_some_and(|token| token.is_valid_at(now_timestamp()))
    }

    /// Lifecycle state of the current token
    pub fn state(&self) -> TokenState {
        TokenState::of(
            self.changes.borrow().as_ref(),
            now_timestamp(),
            self.refresh_lead,
        )
    }

    /// `Authorization` header value for the current token
    pub fn bearer_token(&self) -> Option<String> {
        self.changes.borrow().as_ref().and_then(Token::bearer)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.changes
            .borrow()
            .as_ref()
            .and_then(|token| token.refresh_token.clone())
    }

    /// Arm the refresh timer for the current token, replacing any pending one
    pub fn schedule_refresh(&self) {
        let _writing = self.lock_writes();
        self.arm_refresh();
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Caller holds the write lock
    fn arm_refresh(&self) {
        let token = self.token().filter(Token::needs_refresh);
        self.arm_refresh_with(token);
    }

    /// Swap the pending timer for one firing for `token`, aborting the old one
    fn arm_refresh_with(&self, token: Option<Token>) {
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = token.and_then(|token| self.spawn_timer(token));
        if let Some(previous) = std::mem::replace(&mut *timer, handle) {
            previous.abort();
        }
    }

    fn spawn_timer(&self, token: Token) -> Option<JoinHandle<()>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime, token refresh not scheduled");
            return None;
        };

        let delay = token.refresh_delay_at(now_timestamp(), self.refresh_lead);
        debug!(delay_secs = delay.as_secs(), "token refresh scheduled");

        let refresh_due = self.refresh_due.clone();
        Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            debug!("token refresh due");
            // No subscriber simply means nobody drives refreshes
            let _ = refresh_due.send(token);
        }))
    }
}

impl Drop for TokenService {
    fn drop(&mut self) {
        let timer = self.timer.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = timer.take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("state", &self.state())
            .field("refresh_lead", &self.refresh_lead)
            .finish_non_exhaustive()
    }
}
