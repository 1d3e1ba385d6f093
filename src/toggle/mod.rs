//! Optimistic toggles
//!
//! `OptimisticToggle` shows a binary relationship (favorite, collection
//! membership) as already changed while the backend call is in flight, and
//! rolls the value back if the call fails.
//!
//! ```text
//! Idle --initialize--> Initializing --> Idle
//! Idle --toggle------> Mutating -----> Idle   (failure restores the previous value)
//! ```

use crate::error::{EstateError, Result};
use log::{debug, warn};
use tokio::sync::watch;

pub mod membership;

pub use membership::{CollectionMembership, FavoriteMembership, Membership};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleStatus {
    Idle,
    /// Server state not known yet
    Initializing,
    /// At least one add/remove is in flight
    Mutating,
}

/// How a toggle issued while another is in flight is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// Each toggle reads the value current at call time; overlapping calls may race
    #[default]
    Allow,
    /// Refuse with `EstateError::Busy` until the in-flight call settles
    Reject,
}

/// Observable state of a toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleSnapshot {
    pub value: bool,
    pub status: ToggleStatus,
    pub in_flight: usize,
    pub error: Option<String>,
}

type SuccessFn<'a> = Box<dyn FnOnce(bool) + Send + 'a>;
type ErrorFn<'a> = Box<dyn FnOnce(bool, &EstateError) + Send + 'a>;

/// Callbacks invoked once a toggle settles
#[derive(Default)]
pub struct ToggleCallbacks<'a> {
    on_success: Option<SuccessFn<'a>>,
    on_error: Option<ErrorFn<'a>>,
}

impl<'a> ToggleCallbacks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the new value
    pub fn on_success(mut self, f: impl FnOnce(bool) + Send + 'a) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    /// Called with the restored value and the failure
    pub fn on_error(mut self, f: impl FnOnce(bool, &EstateError) + Send + 'a) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

pub struct OptimisticToggle<B> {
    backend: B,
    state: watch::Sender<ToggleSnapshot>,
    policy: OverlapPolicy,
}

impl<B: Membership> OptimisticToggle<B> {
    pub fn new(backend: B) -> Self {
        Self::with_initial(backend, false)
    }

    /// Start from a value already known, e.g. `isFavorite` on a listing
    pub fn with_initial(backend: B, value: bool) -> Self {
        let (state, _) = watch::channel(ToggleSnapshot {
            value,
            status: ToggleStatus::Idle,
            in_flight: 0,
            error: None,
        });
        Self {
            backend,
            state,
            policy: OverlapPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: OverlapPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn value(&self) -> bool {
        self.state.borrow().value
    }

    pub fn status(&self) -> ToggleStatus {
        self.state.borrow().status
    }

    /// True while initializing or mutating
    pub fn is_busy(&self) -> bool {
        self.status() != ToggleStatus::Idle
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn snapshot(&self) -> ToggleSnapshot {
        self.state.borrow().clone()
    }

    /// Receive every state change, including the optimistic value
    pub fn subscribe(&self) -> watch::Receiver<ToggleSnapshot> {
        self.state.subscribe()
    }

    /// Overwrite the displayed value without calling the backend
    pub fn set_value(&self, value: bool) {
        self.state.send_if_modified(|s| {
            let changed = s.value != value;
            s.value = value;
            changed
        });
    }

    /// Load the server value. Toggles are refused until this settles.
    pub async fn initialize(&self) -> Result<bool> {
        let mut refused = false;
        self.state.send_if_modified(|s| {
            if s.in_flight > 0 || s.status == ToggleStatus::Initializing {
                refused = true;
                return false;
            }
            s.status = ToggleStatus::Initializing;
            s.error = None;
            true
        });
        if refused {
            return Err(EstateError::Busy);
        }

        let mut guard = InitGuard {
            state: &self.state,
            done: false,
        };
        let result = self.backend.check().await;
        guard.finish(result.as_ref().ok().copied(), result.as_ref().err());
        result
    }

    /// Flip the value optimistically and confirm it with the backend.
    ///
    /// Returns whether the backend accepted the change. Nothing is sent while
    /// the toggle is initializing.
    pub async fn toggle(&self, callbacks: ToggleCallbacks<'_>) -> bool {
        let prev = match self.begin(true) {
            Ok(prev) => prev,
            Err(err) => {
                debug!("Toggle refused: {}", err);
                return false;
            }
        };
        match self.run(prev, !prev).await {
            Ok(()) => {
                if let Some(on_success) = callbacks.on_success {
                    on_success(!prev);
                }
                true
            }
            Err(err) => {
                if let Some(on_error) = callbacks.on_error {
                    on_error(prev, &err);
                }
                false
            }
        }
    }

    /// Like `toggle`, but returns the new value or the reason it was refused or failed
    pub async fn try_toggle(&self) -> Result<bool> {
        let prev = self.begin(true)?;
        self.run(prev, !prev).await?;
        Ok(!prev)
    }

    /// Set the relationship without an optimistic flip; the value changes only after success
    pub async fn set(&self, target: bool) -> Result<()> {
        let prev = self.begin(false)?;
        self.run(prev, target).await
    }

    /// Register a mutation and return the value it started from
    fn begin(&self, optimistic: bool) -> Result<bool> {
        let mut outcome = Err(EstateError::NotReady);
        let policy = self.policy;
        self.state.send_if_modified(|s| {
            if s.status == ToggleStatus::Initializing {
                outcome = Err(EstateError::NotReady);
                return false;
            }
            if policy == OverlapPolicy::Reject && s.in_flight > 0 {
                outcome = Err(EstateError::Busy);
                return false;
            }
            let prev = s.value;
            if optimistic {
                s.value = !prev;
            }
            s.in_flight += 1;
            s.status = ToggleStatus::Mutating;
            s.error = None;
            outcome = Ok(prev);
            true
        });
        outcome
    }

    async fn run(&self, prev: bool, target: bool) -> Result<()> {
        let mut guard = MutationGuard {
            state: &self.state,
            prev,
            done: false,
        };
        let result = if target {
            self.backend.add().await
        } else {
            self.backend.remove().await
        };

        match &result {
            Ok(()) => guard.finish(Some(target), None),
            Err(err) => {
                warn!("Update failed, restoring previous value: {}", err);
                guard.finish(Some(prev), Some(err));
            }
        }
        result
    }
}

/// Settles one in-flight mutation; a dropped mutation is rolled back
struct MutationGuard<'a> {
    state: &'a watch::Sender<ToggleSnapshot>,
    prev: bool,
    done: bool,
}

impl MutationGuard<'_> {
    fn finish(&mut self, value: Option<bool>, error: Option<&EstateError>) {
        self.done = true;
        let error = error.map(|e| e.to_string());
        self.state.send_modify(|s| {
            s.in_flight = s.in_flight.saturating_sub(1);
            if s.in_flight == 0 {
                s.status = ToggleStatus::Idle;
            }
            if let Some(value) = value {
                s.value = value;
            }
            if error.is_some() {
                s.error = error;
            }
        });
    }
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            let prev = self.prev;
            self.finish(Some(prev), None);
        }
    }
}

struct InitGuard<'a> {
    state: &'a watch::Sender<ToggleSnapshot>,
    done: bool,
}

impl InitGuard<'_> {
    fn finish(&mut self, value: Option<bool>, error: Option<&EstateError>) {
        self.done = true;
        let error = error.map(|e| e.to_string());
        self.state.send_modify(|s| {
            s.status = if s.in_flight > 0 {
                ToggleStatus::Mutating
            } else {
                ToggleStatus::Idle
            };
            if let Some(value) = value {
                s.value = value;
            }
            s.error = error;
        });
    }
}

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.finish(None, None);
        }
    }
}
