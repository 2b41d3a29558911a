use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::Instant;

/// Owned countdown for one attempt. One background task sleeps until the
/// deadline and runs the expiry callback at most once; `cancel` is idempotent
/// and a no-op once the callback has fired.
pub struct AttemptClock {
    deadline: Instant,
    fired: Arc<AtomicBool>,
    cancelled: Arc<AtomicBool>,
    abort: AbortHandle,
}

impl AttemptClock {
    pub fn start<F, Fut>(duration_seconds: i64, on_expire: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let deadline = Instant::now() + Duration::from_secs(duration_seconds.max(0) as u64);
        let fired = Arc::new(AtomicBool::new(false));
        let cancelled = Arc::new(AtomicBool::new(false));

        let task_fired = fired.clone();
        let task_cancelled = cancelled.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if task_cancelled.load(Ordering::SeqCst) {
                return;
            }
            // One-shot latch: only the first arrival past the deadline may
            // run the callback, no matter how the task is raced.
            if task_fired
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                on_expire().await;
            }
        });

        Self {
            deadline,
            fired,
            cancelled,
            abort: handle.abort_handle(),
        }
    }

    /// Floors at 0 once the deadline has passed; never negative.
    pub fn remaining_seconds(&self) -> i64 {
        self.deadline
            .saturating_duration_since(Instant::now())
            .as_secs() as i64
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Safe to call repeatedly and after the callback has fired. The expiry
    /// callback itself calls this; once `fired` is set the abort is skipped
    /// so an in-flight expiry submission is never cut down mid-await.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if !self.fired.load(Ordering::SeqCst) {
            self.abort.abort();
        }
    }
}

impl Drop for AttemptClock {
    fn drop(&mut self) {
        if !self.fired.load(Ordering::SeqCst) {
            self.abort.abort();
        }
    }
}
