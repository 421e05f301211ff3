//! Cooperative cancellation for blocked cube operations.
//!
//! A [`CancelToken`] is the handle a caller keeps to interrupt a thread
//! that is blocked inside [`Cube::rotate`](crate::Cube::rotate) or
//! [`Cube::inspect`](crate::Cube::inspect). Cancellation is cooperative:
//! [`CancelToken::cancel`] raises a flag and then pokes every wait site
//! the owning thread is currently parked on, so the blocked thread wakes,
//! observes the flag, unwinds its protocol bookkeeping, and returns
//! [`CubeError::Cancelled`](crate::CubeError::Cancelled).
//!
//! # Wait sites
//!
//! A wait site is any mutex/condvar pair a cube operation can block on
//! (the access controller's admission queue, the layer-lock bank). While
//! blocked, the operation keeps a registration alive inside the token;
//! `cancel()` snapshots the registered sites and interrupts each one. A
//! site's `interrupt` takes the site's own mutex before broadcasting, so
//! a wake-up can never race past a waiter that has checked the flag but
//! not yet parked.
//!
//! # Example
//!
//! ```
//! use cubesync::CancelToken;
//!
//! let token = CancelToken::new();
//! let handle = token.clone();
//!
//! // Another thread can interrupt any operation blocked on `token`.
//! handle.cancel();
//! assert!(token.is_cancelled());
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;

/// A location a cancellable operation can block on.
///
/// `interrupt` must acquire the site's own state mutex before
/// broadcasting its condvar; this orders the wake-up after the waiter's
/// flag check and closes the check-then-park window.
pub(crate) trait WaitSite: Send + Sync {
    fn interrupt(&self);
}

#[derive(Default)]
struct SiteRegistry {
    entries: Vec<(u64, Arc<dyn WaitSite>)>,
    next_id: u64,
}

#[derive(Default)]
struct TokenInner {
    cancelled: AtomicBool,
    sites: Mutex<SiteRegistry>,
}

/// A clonable cancellation handle shared between a worker thread and
/// whoever may interrupt it.
///
/// All clones observe the same flag; cancelling any clone cancels them
/// all. A token cannot be reset.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

impl CancelToken {
    /// Creates a fresh, un-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once [`cancel`](Self::cancel) has been called on any
    /// clone of this token.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Raises the cancellation flag and wakes every wait site the owning
    /// thread is currently blocked on.
    ///
    /// Idempotent; later calls only re-broadcast.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);

        // Snapshot under the registry lock, interrupt outside it, so a
        // site's own mutex is never taken while the registry is held.
        let sites: SmallVec<[Arc<dyn WaitSite>; 2]> = {
            let registry = self.inner.sites.lock();
            registry
                .entries
                .iter()
                .map(|(_, site)| Arc::clone(site))
                .collect()
        };
        for site in sites {
            site.interrupt();
        }
    }

    /// Registers a wait site for the duration of a blocking section.
    ///
    /// The registration is removed when the returned guard drops.
    pub(crate) fn register(&self, site: Arc<dyn WaitSite>) -> SiteRegistration<'_> {
        let id = {
            let mut registry = self.inner.sites.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push((id, site));
            id
        };
        SiteRegistration { token: self, id }
    }

    fn unregister(&self, id: u64) {
        let mut registry = self.inner.sites.lock();
        if let Some(pos) = registry.entries.iter().position(|(entry_id, _)| *entry_id == id) {
            registry.entries.swap_remove(pos);
        }
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Guard tying a wait-site registration to a blocking section.
pub(crate) struct SiteRegistration<'a> {
    token: &'a CancelToken,
    id: u64,
}

impl Drop for SiteRegistration<'_> {
    fn drop(&mut self) {
        self.token.unregister(self.id);
    }
}
