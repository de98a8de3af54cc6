//! Bounded pool of authenticated sessions.
//!
//! Login is the expensive part of a subscription source, so established
//! sessions are parked and reused across searches. A semaphore caps how many
//! sessions can be in use at once; callers beyond the cap wait for a lease to
//! be returned rather than opening another session.

use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::SearchError;

/// A pool of at most `max_sessions` live sessions of type `S`.
pub struct SessionPool<S> {
    permits: Arc<Semaphore>,
    idle: Arc<Mutex<Vec<S>>>,
    max_sessions: usize,
}

impl<S> SessionPool<S> {
    /// Create a pool allowing `max_sessions` concurrent leases (minimum 1).
    pub fn new(max_sessions: usize) -> Self {
        let max_sessions = max_sessions.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_sessions)),
            idle: Arc::new(Mutex::new(Vec::new())),
            max_sessions,
        }
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Sessions parked and ready for reuse.
    pub fn idle_count(&self) -> usize {
        lock(&self.idle).len()
    }

    /// Leases that could be handed out right now without waiting.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Lease a session, reusing an idle one or calling `create` to log in.
    ///
    /// Waits while `max_sessions` leases are outstanding. If `create` fails
    /// the slot is released immediately and the error is returned.
    ///
    /// # Errors
    ///
    /// Propagates the error from `create`, or returns
    /// [`SearchError::InvalidState`] if the pool has been closed.
    pub async fn acquire<F, Fut>(&self, create: F) -> Result<SessionLease<S>, SearchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<S, SearchError>>,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| SearchError::InvalidState("session pool closed".into()))?;

        let reused = lock(&self.idle).pop();
        let session = match reused {
            Some(session) => {
                tracing::trace!("reusing idle session");
                session
            }
            None => {
                tracing::debug!("opening new session");
                create().await?
            }
        };

        Ok(SessionLease {
            session: Some(session),
            idle: Arc::clone(&self.idle),
            _permit: permit,
        })
    }

    /// Close the pool: pending and future `acquire` calls fail.
    pub fn close(&self) {
        self.permits.close();
        lock(&self.idle).clear();
    }
}

/// Exclusive use of one session. Returned to the pool on drop.
pub struct SessionLease<S> {
    session: Option<S>,
    idle: Arc<Mutex<Vec<S>>>,
    _permit: OwnedSemaphorePermit,
}

impl<S> SessionLease<S> {
    /// Swap in a freshly established session, dropping the old one.
    pub fn replace(&mut self, session: S) {
        self.session = Some(session);
    }

    /// Drop the session instead of returning it; the slot is still released.
    pub fn discard(mut self) {
        self.session = None;
    }
}

impl<S> Deref for SessionLease<S> {
    type Target = S;

    fn deref(&self) -> &S {
        match self.session {
            Some(ref s) => s,
            // Only `discard` clears the slot, and it consumes the lease.
            None => unreachable!("session lease used after discard"),
        }
    }
}

impl<S> DerefMut for SessionLease<S> {
    fn deref_mut(&mut self) -> &mut S {
        match self.session {
            Some(ref mut s) => s,
            None => unreachable!("session lease used after discard"),
        }
    }
}

impl<S> Drop for SessionLease<S> {
    fn drop(&mut self) {
        // Runs before `_permit` is released, so a waiter always sees the
        // returned session.
        if let Some(session) = self.session.take() {
            lock(&self.idle).push(session);
        }
    }
}

fn lock<S>(idle: &Mutex<Vec<S>>) -> MutexGuard<'_, Vec<S>> {
    idle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
