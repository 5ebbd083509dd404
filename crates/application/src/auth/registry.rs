//! In-flight refresh registry.
//!
//! Coalesces concurrent refreshes of the same refresh token onto a single
//! network call. The first caller spawns the refresh as a task; everyone
//! arriving before it settles awaits the same shared result. The entry is
//! dropped from the map by a guard owned by the task, so it disappears when
//! the refresh settles whatever the outcome, and the task keeps running even
//! if every caller stops waiting.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use drupal_auth_domain::{AuthError, RefreshOutcome};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, trace};

/// What every waiter of one refresh receives.
pub type RefreshResult = Result<RefreshOutcome, AuthError>;

/// Handle on a refresh that is in flight.
pub type PendingRefresh = Shared<BoxFuture<'static, RefreshResult>>;

type PendingMap = HashMap<String, PendingRefresh>;

/// Map from refresh token to the pending refresh for it.
#[derive(Default)]
pub struct RefreshRegistry {
    pending: Arc<Mutex<PendingMap>>,
}

impl fmt::Debug for RefreshRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshRegistry")
            .field("in_flight", &self.len())
            .finish()
    }
}

/// Removes a registry entry when the refresh task finishes or unwinds.
struct SettleGuard {
    pending: Arc<Mutex<PendingMap>>,
    key: String,
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        lock(&self.pending).remove(&self.key);
        trace!("refresh settled, registry entry removed");
    }
}

fn lock(pending: &Mutex<PendingMap>) -> MutexGuard<'_, PendingMap> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RefreshRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pending refresh for `key`, starting one with `start` if
    /// none is in flight.
    ///
    /// `start` is only called when a new refresh is needed. Must be called
    /// from within a tokio runtime.
    pub fn join_or_start<F, Fut>(&self, key: &str, start: F) -> PendingRefresh
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshResult> + Send + 'static,
    {
        let mut pending = lock(&self.pending);
        if let Some(existing) = pending.get(key) {
            debug!("joining refresh already in flight");
            return existing.clone();
        }

        let guard = SettleGuard {
            pending: Arc::clone(&self.pending),
            key: key.to_string(),
        };
        let work = start();
        // The guard is dropped inside the task; its lock waits for ours, so
        // the entry is always inserted before it can be removed.
        let handle = tokio::spawn(async move {
            let _guard = guard;
            work.await
        });
        let shared = async move {
            handle.await.unwrap_or_else(|e| {
                Err(AuthError::transport(format!("refresh task failed: {e}")))
            })
        }
        .boxed()
        .shared();

        pending.insert(key.to_string(), shared.clone());
        shared
    }

    /// Number of refreshes in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Whether no refresh is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
