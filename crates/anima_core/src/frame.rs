//! Per-subsystem frame scheduling.
//!
//! Every continuously-animating subsystem implements [`FrameTask`] and is
//! driven by its own [`FrameLoop`] — a fixed-rate tokio task, the same
//! heartbeat shape the rest of the workspace uses. Subsystems are mutually
//! independent at the scheduling level: nothing here guarantees ordering
//! between loops, and no tick blocks on another subsystem.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// A synchronous per-frame unit of work. Ticks are expected to be short,
/// non-blocking, pure computation. (`Sync` because the loop shares the
/// task behind an `Arc<RwLock<_>>` with its spawned driver.)
pub trait FrameTask: Send + Sync + 'static {
    fn tick(&mut self, now: Instant);

    /// Drop retained state (chains, history, observers). Called by
    /// [`FrameLoop::destroy`]; must be safe to call repeatedly.
    fn reset(&mut self) {}
}

/// Owns a [`FrameTask`] and optionally drives it at a fixed interval.
///
/// `start` and `stop` are idempotent; `destroy` stops the loop and resets
/// the task, and may be called any number of times. The task remains
/// externally pumpable through [`FrameLoop::with_mut`] whether or not the
/// internal loop is running (tests pump it with a synthetic clock).
pub struct FrameLoop<T: FrameTask> {
    inner: Arc<RwLock<T>>,
    interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl<T: FrameTask> FrameLoop<T> {
    pub fn new(task: T, interval: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(task)),
            interval,
            handle: None,
        }
    }

    /// Shared handle to the underlying task state.
    pub fn shared(&self) -> Arc<RwLock<T>> {
        Arc::clone(&self.inner)
    }

    /// Spawn the frame task. No-op if already running.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        let inner = Arc::clone(&self.inner);
        let interval = self.interval;
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                inner.write().await.tick(Instant::now());
            }
        }));
        tracing::debug!("frame loop started ({:?} interval)", interval);
    }

    /// Stop the frame task. No-op if not running.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("frame loop stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the loop and drop the task's retained state.
    pub async fn destroy(&mut self) {
        self.stop();
        self.inner.write().await.reset();
    }

    pub async fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.inner.read().await)
    }

    pub async fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut *self.inner.write().await)
    }
}

impl<T: FrameTask> Drop for FrameLoop<T> {
    fn drop(&mut self) {
        self.stop();
    }
}
