//! Per-key de-duplication of concurrent cache misses
//!
//! The first miss for a key spawns the resolution and registers a shared
//! handle to it; concurrent misses for the same key await that handle instead
//! of issuing their own request. The spawned task runs to completion even if
//! every waiter goes away, so superseded lookups still fill the cache.

use crate::cache::lock;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::debug;

type Pending<V> = Shared<BoxFuture<'static, Option<V>>>;
type Registry<V> = Arc<Mutex<HashMap<String, Pending<V>>>>;

/// Registry of in-flight resolutions keyed by cache key
pub struct SingleFlight<V> {
    in_flight: Registry<V>,
}

/// Drops the registry entry once the owning task finishes, panics included
struct Deregister<V> {
    registry: Registry<V>,
    key: String,
}

impl<V> Drop for Deregister<V> {
    fn drop(&mut self) {
        lock(&self.registry).remove(&self.key);
    }
}

impl<V> SingleFlight<V>
where
    V: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `work` for `key` unless a resolution for it is already in flight
    ///
    /// Returns `None` only if the resolution task panicked.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> Option<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V> + Send + 'static,
    {
        let (pending, sender) = {
            let mut in_flight = lock(&self.in_flight);
            if let Some(pending) = in_flight.get(key) {
                debug!("Joining in-flight resolution for '{}'", key);
                (pending.clone(), None)
            } else {
                let (sender, receiver) = oneshot::channel();
                let pending = receiver.map(Result::ok).boxed().shared();
                in_flight.insert(key.to_string(), pending.clone());
                (pending, Some(sender))
            }
        };

        // Registered before spawning, so deregistration can never run ahead of it
        if let Some(sender) = sender {
            let guard = Deregister {
                registry: Arc::clone(&self.in_flight),
                key: key.to_string(),
            };
            let task = work();
            tokio::spawn(async move {
                let _guard = guard;
                let _ = sender.send(task.await);
            });
        }

        pending.await
    }

    /// Number of keys currently being resolved
    #[must_use]
    pub fn in_flight(&self) -> usize {
        lock(&self.in_flight).len()
    }
}

impl<V> Default for SingleFlight<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
