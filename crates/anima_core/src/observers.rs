//! Fault-isolated observer lists.
//!
//! Every "on-change" API in the workspace goes through an `ObserverSet`: an
//! ordered list of subscriber callbacks where each invocation runs inside its
//! own panic boundary. One misbehaving subscriber must never prevent the
//! remaining subscribers from firing — a frozen avatar is a worse failure
//! than a lost callback.

use std::panic::{catch_unwind, AssertUnwindSafe};

/// Handle returned by [`ObserverSet::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Callback<T> = Box<dyn Fn(&T) + Send + Sync>;

pub struct ObserverSet<T> {
    next_id: u64,
    subscribers: Vec<(ObserverId, Callback<T>)>,
}

impl<T> Default for ObserverSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ObserverSet<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, callback: impl Fn(&T) + Send + Sync + 'static) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns true if the subscriber existed.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn clear(&mut self) {
        self.subscribers.clear();
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Invoke every subscriber in order, isolating panics per callback.
    pub fn emit(&self, event: &T) {
        for (id, callback) in &self.subscribers {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                tracing::warn!("observer {:?} panicked; remaining observers still run", id);
            }
        }
    }
}

impl<T> std::fmt::Debug for ObserverSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverSet")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_emit_in_order() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut set = ObserverSet::new();
        for _ in 0..3 {
            let hits = Arc::clone(&hits);
            set.subscribe(move |_: &u32| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }
        set.emit(&7);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_panicking_observer_does_not_block_others() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut set = ObserverSet::new();
        set.subscribe(|_: &u32| panic!("bad subscriber"));
        {
            let hits = Arc::clone(&hits);
            set.subscribe(move |_: &u32| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }
        set.emit(&1);
        assert_eq!(
            hits.load(Ordering::SeqCst),
            1,
            "second observer must still fire"
        );
    }

    #[test]
    fn test_unsubscribe() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut set = ObserverSet::new();
        let id = {
            let hits = Arc::clone(&hits);
            set.subscribe(move |_: &u32| {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };
        assert!(set.unsubscribe(id));
        assert!(!set.unsubscribe(id), "double unsubscribe returns false");
        set.emit(&1);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_clear() {
        let mut set = ObserverSet::new();
        set.subscribe(|_: &u32| {});
        set.subscribe(|_: &u32| {});
        assert_eq!(set.len(), 2);
        set.clear();
        assert!(set.is_empty());
    }
}
