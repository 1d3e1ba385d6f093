//! Authentication session
//!
//! `AuthSession` owns the process-wide credential state: the current bearer
//! token, the store it is persisted to, and the single-flight refresh queue.
//! One session is created at the application root and shared as
//! `Arc<AuthSession>` by every client that makes authenticated calls.

use crate::error::{EstateError, RefreshFailure, Result};
use log::{debug, info, warn};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::oneshot;

pub mod store;

pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

type RefreshOutcome = std::result::Result<String, RefreshFailure>;

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    queue: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// Credential state shared by all authenticated requests
pub struct AuthSession {
    token: RwLock<Option<String>>,
    store: Box<dyn TokenStore>,
    refresh: Mutex<RefreshState>,
}

enum Ticket<'a> {
    /// A refresh completed since the failing request was sent
    Current(String),
    Leader(RefreshGuard<'a>),
    Waiter(oneshot::Receiver<RefreshOutcome>),
}

impl AuthSession {
    pub fn new(store: Box<dyn TokenStore>) -> Self {
        Self {
            token: RwLock::new(None),
            store,
            refresh: Mutex::new(RefreshState::default()),
        }
    }

    /// Session whose token lives only in this process
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryTokenStore::new()))
    }

    /// Load a previously persisted token into the outgoing header state
    pub fn prime_from_store(&self) -> Result<Option<String>> {
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        let stored = self.store.load()?;
        *guard = stored.clone();
        if stored.is_some() {
            debug!("Primed access token from store");
        }
        Ok(stored)
    }

    /// Token attached to outgoing requests
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Persist a token. The store and the header state change under one write lock.
    pub fn set_token(&self, token: &str) -> Result<()> {
        // lock stays held across the store write so readers never see the
        // header and the persisted token disagree
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        self.store.save(token)?;
        *guard = Some(token.to_string());
        Ok(())
    }

    /// Drop all cached credentials
    pub fn clear(&self) -> Result<()> {
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
        self.store.clear()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh_state().refreshing
    }

    /// Obtain a fresh token after an authentication failure.
    ///
    /// `sent_with` is the token the failed request carried. If the session
    /// already holds a different token, a refresh finished in the meantime and
    /// that token is returned without calling `refresh`. Otherwise the first
    /// caller runs `refresh` and every caller arriving before it settles is
    /// queued and receives the same outcome.
    pub async fn refresh_after_failure<F, Fut>(
        &self,
        sent_with: Option<&str>,
        refresh: F,
    ) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        match self.ticket(sent_with) {
            Ticket::Current(token) => {
                debug!("Token changed while request was in flight; replaying without refresh");
                Ok(token)
            }
            Ticket::Waiter(rx) => {
                debug!("Refresh in progress; queued request");
                match rx.await {
                    Ok(Ok(token)) => Ok(token),
                    Ok(Err(failure)) => Err(EstateError::RefreshFailed(failure)),
                    Err(_) => Err(EstateError::RefreshFailed(RefreshFailure::cancelled())),
                }
            }
            Ticket::Leader(mut guard) => {
                info!("Access token rejected; refreshing");
                let outcome = match refresh().await {
                    Ok(token) => self.set_token(&token).map(|()| token),
                    Err(err) => Err(err),
                };
                let settled = match outcome {
                    Ok(token) => {
                        info!("Access token refreshed");
                        Ok(token)
                    }
                    Err(err) => {
                        warn!("Token refresh failed: {}", err);
                        if let Err(clear_err) = self.clear() {
                            warn!("Failed to clear credentials: {}", clear_err);
                        }
                        Err(RefreshFailure::from_error(&err))
                    }
                };
                guard.settle(settled.clone());
                settled.map_err(EstateError::RefreshFailed)
            }
        }
    }

    fn ticket(&self, sent_with: Option<&str>) -> Ticket<'_> {
        let mut state = self.refresh_state();
        if state.refreshing {
            let (tx, rx) = oneshot::channel();
            state.queue.push(tx);
            return Ticket::Waiter(rx);
        }
        if let Some(current) = self.token() {
            if sent_with != Some(current.as_str()) {
                return Ticket::Current(current);
            }
        }
        state.refreshing = true;
        Ticket::Leader(RefreshGuard {
            session: self,
            settled: false,
        })
    }

    fn refresh_state(&self) -> MutexGuard<'_, RefreshState> {
        self.refresh.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("has_token", &self.token().is_some())
            .field("store", &self.store)
            .field("refreshing", &self.is_refreshing())
            .finish()
    }
}

/// Held by the caller running the refresh. Clears the refreshing flag and
/// drains the queue exactly once, on settle or on drop.
struct RefreshGuard<'a> {
    session: &'a AuthSession,
    settled: bool,
}

impl RefreshGuard<'_> {
    fn settle(&mut self, outcome: RefreshOutcome) {
        self.settled = true;
        let waiters = {
            let mut state = self.session.refresh_state();
            state.refreshing = false;
            std::mem::take(&mut state.queue)
        };
        if !waiters.is_empty() {
            debug!("Settling {} queued request(s)", waiters.len());
        }
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Token refresh dropped before completion");
            self.settle(Err(RefreshFailure::cancelled()));
        }
    }
}
