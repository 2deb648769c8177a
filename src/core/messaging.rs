use crate::errors::ProgressError;
use crate::pool::PoolSnapshot;
use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::join_all;
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

static NEXT_SUBSCRIBER_ID: AtomicUsize = AtomicUsize::new(1);

/// Hands out process-unique subscriber ids.
pub fn next_subscriber_id() -> usize {
    NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed)
}

/// A trait for objects that receive pool snapshots.
#[async_trait]
pub trait SnapshotSubscriber: Send + Sync {
    fn id(&self) -> usize;
    async fn notify(&self, snapshot: PoolSnapshot);
}

/// Subscribe/unsubscribe interface keyed by pool id.
///
/// A subscriber may only be registered once per pool; a second registration
/// without unsubscribing is rejected.
pub trait PoolEventBridge: Send + Sync {
    fn subscribe(
        &self,
        pool_id: &str,
        subscriber: Weak<dyn SnapshotSubscriber>,
    ) -> Result<(), ProgressError>;

    /// Returns whether a registration was removed.
    fn unsubscribe(&self, pool_id: &str, subscriber_id: usize) -> bool;
}

struct Registration {
    id: usize,
    subscriber: Weak<dyn SnapshotSubscriber>,
}

/// In-memory fan-out bridge. Subscribers are held weakly and pruned once dropped.
#[derive(Default)]
pub struct PoolEventHub {
    registry: DashMap<String, Vec<Registration>>,
}

impl PoolEventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `snapshot` to every live subscriber of its pool and returns how
    /// many were notified. Each subscriber sees snapshots in publish order as
    /// long as publishes for a pool are awaited one after another.
    pub async fn publish(&self, snapshot: PoolSnapshot) -> usize {
        let targets: Vec<Arc<dyn SnapshotSubscriber>> = match self.registry.get_mut(&snapshot.pool_id) {
            Some(mut entry) => {
                entry.retain(|r| r.subscriber.strong_count() > 0);
                entry.iter().filter_map(|r| r.subscriber.upgrade()).collect()
            }
            None => return 0,
        };

        tracing::trace!(
            pool_id = %snapshot.pool_id,
            subscribers = targets.len(),
            "Publishing pool snapshot"
        );

        let deliveries = targets.iter().map(|s| s.notify(snapshot.clone()));
        join_all(deliveries).await;
        targets.len()
    }

    pub fn subscriber_count(&self, pool_id: &str) -> usize {
        self.registry
            .get(pool_id)
            .map_or(0, |entry| entry.iter().filter(|r| r.subscriber.strong_count() > 0).count())
    }
}

impl PoolEventBridge for PoolEventHub {
    fn subscribe(
        &self,
        pool_id: &str,
        subscriber: Weak<dyn SnapshotSubscriber>,
    ) -> Result<(), ProgressError> {
        let Some(id) = subscriber.upgrade().map(|s| s.id()) else {
            return Ok(());
        };

        let mut entry = self.registry.entry(pool_id.to_string()).or_default();
        if entry.iter().any(|r| r.id == id) {
            return Err(ProgressError::AlreadySubscribed {
                pool_id: pool_id.to_string(),
                subscriber_id: id,
            });
        }
        entry.push(Registration { id, subscriber });
        tracing::debug!(pool_id, subscriber_id = id, "Subscriber registered");
        Ok(())
    }

    fn unsubscribe(&self, pool_id: &str, subscriber_id: usize) -> bool {
        let removed = match self.registry.get_mut(pool_id) {
            Some(mut entry) => {
                let before = entry.len();
                entry.retain(|r| r.id != subscriber_id);
                entry.len() != before
            }
            None => false,
        };
        self.registry.remove_if(pool_id, |_, regs| regs.is_empty());
        if removed {
            tracing::debug!(pool_id, subscriber_id, "Subscriber removed");
        }
        removed
    }
}

impl Debug for PoolEventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolEventHub")
            .field("pools", &self.registry.len())
            .finish()
    }
}

/// A live registration on a bridge, released exactly once: explicitly through
/// [`Subscription::release`] or implicitly on drop.
pub struct Subscription {
    bridge: Arc<dyn PoolEventBridge>,
    pool_id: String,
    subscriber_id: usize,
    released: bool,
}

impl Subscription {
    pub fn acquire(
        bridge: Arc<dyn PoolEventBridge>,
        pool_id: &str,
        subscriber: Weak<dyn SnapshotSubscriber>,
    ) -> Result<Self, ProgressError> {
        let subscriber_id = subscriber
            .upgrade()
            .map(|s| s.id())
            .ok_or_else(|| ProgressError::InvalidParameters("subscriber already dropped".to_string()))?;
        bridge.subscribe(pool_id, subscriber)?;
        Ok(Self {
            bridge,
            pool_id: pool_id.to_string(),
            subscriber_id,
            released: false,
        })
    }

    pub fn pool_id(&self) -> &str {
        &self.pool_id
    }

    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if !self.released {
            self.released = true;
            self.bridge.unsubscribe(&self.pool_id, self.subscriber_id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("pool_id", &self.pool_id)
            .field("subscriber_id", &self.subscriber_id)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}
