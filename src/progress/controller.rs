use crate::config::EngineConfig;
use crate::core::messaging::{next_subscriber_id, PoolEventBridge, SnapshotSubscriber, Subscription};
use crate::curve::oracle::curve_for;
use crate::curve::sampler::{locate_or_insert_current, sample};
use crate::curve::types::CurveParameters;
use crate::errors::ProgressError;
use crate::pool::{PoolSnapshot, SaleMetadata};
use crate::progress::calculator::compute_finish_rate;
use crate::progress::refresh::{DebouncedRefresh, RefreshAction};
use crate::progress::state::{ProgressState, StaleReason};
use async_trait::async_trait;
use std::fmt::{self, Debug};
use std::sync::{Arc, Weak};
use tokio::sync::{watch, Mutex};

/// Lifecycle phase of a [`ProgressController`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerPhase {
    Uninitialized,
    Active { pool_id: String },
    Disposed,
}

enum Phase {
    Uninitialized,
    Active(Subscription),
    Disposed,
}

struct ControllerInner {
    // Declared before `phase` so that on drop the timer is cancelled before
    // the subscription is released.
    refresh: DebouncedRefresh,
    phase: Phase,
    metadata: Option<SaleMetadata>,
    stale_reason: Option<StaleReason>,
}

impl ControllerInner {
    /// Replaces the metadata, keeping any stage timestamp already known.
    fn merge_metadata(&mut self, metadata: SaleMetadata) {
        let mut updated = metadata;
        if let Some(known) = &self.metadata {
            updated.stage_timestamps.merge(&known.stage_timestamps);
        }
        self.metadata = Some(updated);
    }
}

struct ControllerCore {
    id: usize,
    config: EngineConfig,
    bridge: Arc<dyn PoolEventBridge>,
    refresh_action: RefreshAction,
    state_tx: watch::Sender<Option<Arc<ProgressState>>>,
    inner: Mutex<ControllerInner>,
}

/// Keeps the progress of one sale in sync with its pool's snapshots and
/// requests a metadata refresh when the progress outruns the known stage timestamps.
pub struct ProgressController {
    core: Arc<ControllerCore>,
}

impl ProgressController {
    pub fn new(
        bridge: Arc<dyn PoolEventBridge>,
        config: EngineConfig,
        refresh_action: RefreshAction,
    ) -> Self {
        let (state_tx, _) = watch::channel(None);
        Self {
            core: Arc::new(ControllerCore {
                id: next_subscriber_id(),
                config,
                bridge,
                refresh_action,
                state_tx,
                inner: Mutex::new(ControllerInner {
                    refresh: DebouncedRefresh::new(),
                    phase: Phase::Uninitialized,
                    metadata: None,
                    stale_reason: None,
                }),
            }),
        }
    }

    /// Binds the controller to `metadata.pool_id`.
    ///
    /// Binding to the pool already bound behaves like [`Self::update_metadata`]. Binding to a new
    /// pool cancels the pending refresh, releases the old subscription, discards
    /// the old progress and subscribes to the new pool.
    pub async fn bind(&self, metadata: SaleMetadata) -> Result<(), ProgressError> {
        let core = &self.core;
        let mut inner = core.inner.lock().await;

        let rebinding = match &inner.phase {
            Phase::Disposed => return Err(ProgressError::ControllerDisposed),
            Phase::Active(sub) => sub.pool_id() != metadata.pool_id,
            Phase::Uninitialized => true,
        };

        if rebinding {
            inner.refresh.cancel();
            inner.stale_reason = None;
            if let Phase::Active(old) = std::mem::replace(&mut inner.phase, Phase::Uninitialized) {
                tracing::debug!(from = old.pool_id(), to = %metadata.pool_id, "Rebinding progress controller");
                old.release();
            }
            core.state_tx.send_replace(None);

            let subscriber: Weak<ControllerCore> = Arc::downgrade(&self.core);
            let subscriber: Weak<dyn SnapshotSubscriber> = subscriber;
            let subscription = Subscription::acquire(core.bridge.clone(), &metadata.pool_id, subscriber)?;
            inner.phase = Phase::Active(subscription);
            inner.metadata = Some(metadata);
        } else {
            inner.merge_metadata(metadata);
        }

        core.evaluate_staleness(&mut inner);
        Ok(())
    }

    /// Applies refreshed metadata for the pool already bound. Known stage
    /// timestamps are kept, and staleness is re-evaluated, which cancels the
    /// pending refresh once the missing timestamp has arrived.
    pub async fn update_metadata(&self, metadata: SaleMetadata) -> Result<(), ProgressError> {
        let core = &self.core;
        let mut inner = core.inner.lock().await;
        match &inner.phase {
            Phase::Disposed => return Err(ProgressError::ControllerDisposed),
            Phase::Active(sub) if sub.pool_id() == metadata.pool_id => {}
            Phase::Active(sub) => {
                return Err(ProgressError::InvalidParameters(format!(
                    "metadata for pool {} while bound to {}",
                    metadata.pool_id,
                    sub.pool_id()
                )));
            }
            Phase::Uninitialized => {
                return Err(ProgressError::InvalidParameters(format!(
                    "metadata for pool {} before bind",
                    metadata.pool_id
                )));
            }
        }

        inner.merge_metadata(metadata);
        core.evaluate_staleness(&mut inner);
        Ok(())
    }

    /// Recomputes from directly supplied pool parameters, bypassing the bridge.
    /// The curve kind of the bound metadata wins over `params.kind`.
    pub async fn apply_pool_info(&self, mut params: CurveParameters) -> Result<(), ProgressError> {
        let mut inner = self.core.inner.lock().await;
        match &inner.phase {
            Phase::Disposed => return Err(ProgressError::ControllerDisposed),
            Phase::Uninitialized => return Ok(()),
            Phase::Active(_) => {}
        }
        if let Some(metadata) = &inner.metadata {
            params.kind = metadata.curve_kind;
        }
        self.core.recompute(&mut inner, &params);
        Ok(())
    }

    /// Cancels the pending refresh, then releases the subscription. Terminal.
    pub async fn dispose(&self) {
        let mut inner = self.core.inner.lock().await;
        if inner.refresh.cancel() {
            tracing::debug!("Pending refresh cancelled on dispose");
        }
        if let Phase::Active(sub) = std::mem::replace(&mut inner.phase, Phase::Disposed) {
            sub.release();
        }
        inner.stale_reason = None;
        self.core.state_tx.send_replace(None);
    }

    /// Latest computed progress.
    pub fn state(&self) -> Option<Arc<ProgressState>> {
        self.core.state_tx.borrow().clone()
    }

    /// A receiver that observes every re-emitted progress state.
    pub fn watch(&self) -> watch::Receiver<Option<Arc<ProgressState>>> {
        self.core.state_tx.subscribe()
    }

    /// Computed finish rate, or the metadata's server-side rate before the first snapshot.
    pub async fn finish_rate(&self) -> f64 {
        let inner = self.core.inner.lock().await;
        self.core.current_finish_rate(&inner)
    }

    pub async fn phase(&self) -> ControllerPhase {
        match &self.core.inner.lock().await.phase {
            Phase::Uninitialized => ControllerPhase::Uninitialized,
            Phase::Active(sub) => ControllerPhase::Active {
                pool_id: sub.pool_id().to_string(),
            },
            Phase::Disposed => ControllerPhase::Disposed,
        }
    }

    pub async fn is_refresh_pending(&self) -> bool {
        self.core.inner.lock().await.refresh.is_pending()
    }
}

impl ControllerCore {
    fn current_finish_rate(&self, inner: &ControllerInner) -> f64 {
        match self.state_tx.borrow().as_ref() {
            Some(state) => state.finish_rate(),
            None => inner
                .metadata
                .as_ref()
                .and_then(|m| m.finishing_rate)
                .unwrap_or(0.0),
        }
    }

    fn compute(&self, params: &CurveParameters, metadata: &SaleMetadata) -> Result<ProgressState, ProgressError> {
        let curve = curve_for(params.kind);
        let current_price = curve.price(params)?;
        let end_price = curve.end_price(params)?;
        let init_price = match metadata.recorded_init_price() {
            Some(price) => price,
            None => curve.init_price(params)?,
        };
        let finish_rate = compute_finish_rate(current_price, init_price, end_price);

        let samples = sample(params, self.config.point_count)?;
        let points = locate_or_insert_current(&samples, current_price);
        Ok(ProgressState::new(finish_rate, points))
    }

    /// Replaces the published state, keeping the previous one if evaluation fails.
    fn recompute(&self, inner: &mut ControllerInner, params: &CurveParameters) {
        let Some(metadata) = inner.metadata.as_ref() else {
            return;
        };
        match self.compute(params, metadata) {
            Ok(state) => {
                tracing::debug!(
                    pool_id = %metadata.pool_id,
                    finish_rate = state.finish_rate(),
                    points = state.points().len(),
                    "Progress recomputed"
                );
                self.state_tx.send_replace(Some(Arc::new(state)));
            }
            Err(e) => {
                tracing::warn!(
                    pool_id = %metadata.pool_id,
                    error = %e,
                    "Curve evaluation failed, keeping last progress state"
                );
            }
        }
        self.evaluate_staleness(inner);
    }

    fn evaluate_staleness(&self, inner: &mut ControllerInner) {
        let Some(metadata) = inner.metadata.as_ref() else {
            return;
        };
        let finish_rate = self.current_finish_rate(inner);
        let reason = StaleReason::evaluate(finish_rate, &metadata.stage_timestamps, &self.config);

        match (inner.stale_reason, reason) {
            (previous, Some(next)) if previous != Some(next) => {
                tracing::debug!(
                    pool_id = %metadata.pool_id,
                    finish_rate,
                    reason = ?next,
                    delay_ms = self.config.refresh_delay_ms,
                    "Scheduling metadata refresh"
                );
                inner
                    .refresh
                    .schedule(self.config.refresh_delay(), self.refresh_action.clone());
            }
            (Some(_), None) => {
                if inner.refresh.cancel() {
                    tracing::debug!(pool_id = %metadata.pool_id, finish_rate, "Metadata refresh no longer needed");
                }
            }
            _ => {}
        }
        inner.stale_reason = reason;
    }
}

#[async_trait]
impl SnapshotSubscriber for ControllerCore {
    fn id(&self) -> usize {
        self.id
    }

    async fn notify(&self, snapshot: PoolSnapshot) {
        let mut inner = self.inner.lock().await;
        let bound = matches!(&inner.phase, Phase::Active(sub) if sub.pool_id() == snapshot.pool_id);
        if !bound {
            tracing::trace!(pool_id = %snapshot.pool_id, "Discarding snapshot for unbound pool");
            return;
        }

        let Some(metadata) = inner.metadata.as_mut() else {
            return;
        };
        metadata.stage_timestamps.merge(&snapshot.stage_timestamps);
        let params = snapshot.curve_parameters(metadata.curve_kind);
        self.recompute(&mut inner, &params);
    }
}

impl Debug for ProgressController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressController")
            .field("id", &self.core.id)
            .field("config", &self.core.config)
            .finish_non_exhaustive()
    }
}
