use std::fmt::{self, Debug};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Zero-argument callback asking the outside world to re-fetch mint metadata.
pub type RefreshAction = Arc<dyn Fn() + Send + Sync>;

struct PendingRefresh {
    // Cleared exactly once, either by the timer right before it runs the
    // action or by `cancel`. The action runs with the lock held.
    armed: Arc<Mutex<bool>>,
    handle: JoinHandle<()>,
}

impl PendingRefresh {
    fn is_armed(&self) -> bool {
        *self.armed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn disarm(&self) -> bool {
        let mut armed = self.armed.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *armed, false)
    }
}

/// A single pending delayed refresh. Scheduling replaces any pending one;
/// dropping the handle cancels it.
#[derive(Default)]
pub struct DebouncedRefresh {
    pending: Option<PendingRefresh>,
}

impl DebouncedRefresh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels whatever is pending, then arms a timer that runs `action` after `delay`.
    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, delay: Duration, action: RefreshAction) {
        self.cancel();
        let armed = Arc::new(Mutex::new(true));
        let flag = armed.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut armed = flag.lock().unwrap_or_else(PoisonError::into_inner);
            if std::mem::replace(&mut *armed, false) {
                action();
            }
        });
        self.pending = Some(PendingRefresh { armed, handle });
    }

    /// Returns `true` if the action had not run yet and now never will.
    ///
    /// If the timer is running the action concurrently, this waits for it to
    /// finish and returns `false`.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                let was_armed = pending.disarm();
                pending.handle.abort();
                was_armed
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(PendingRefresh::is_armed)
    }
}

impl Drop for DebouncedRefresh {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl Debug for DebouncedRefresh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebouncedRefresh")
            .field("pending", &self.is_pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn counting_action() -> (RefreshAction, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let action: RefreshAction = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (action, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let (action, calls) = counting_action();
        let mut refresh = DebouncedRefresh::new();
        refresh.schedule(Duration::from_millis(1500), action);

        tokio::time::sleep(Duration::from_millis(1499)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(refresh.is_pending());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!refresh.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_pending_timer() {
        let (action, calls) = counting_action();
        let mut refresh = DebouncedRefresh::new();
        refresh.schedule(Duration::from_millis(1500), action.clone());
        tokio::time::sleep(Duration::from_millis(1000)).await;
        refresh.schedule(Duration::from_millis(1500), action);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancel_waits_for_action_already_running() {
        let started = Arc::new(AtomicBool::new(false));
        let calls = Arc::new(AtomicUsize::new(0));
        let action: RefreshAction = {
            let started = started.clone();
            let calls = calls.clone();
            Arc::new(move || {
                started.store(true, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(100));
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };

        let mut refresh = DebouncedRefresh::new();
        refresh.schedule(Duration::from_millis(1), action);
        while !started.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        assert!(!refresh.cancel());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancelled_timer_never_runs_on_worker_threads() {
        let (action, calls) = counting_action();
        let mut refresh = DebouncedRefresh::new();
        refresh.schedule(Duration::from_millis(20), action);
        assert!(refresh.cancel());
        assert!(!refresh.is_pending());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels() {
        let (action, calls) = counting_action();
        {
            let mut refresh = DebouncedRefresh::new();
            refresh.schedule(Duration::from_millis(10), action);
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
