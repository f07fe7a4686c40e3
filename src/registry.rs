//! Thread-safe handler registries for sinks and observers
//!
//! Frame sinks, capture observers and content-share observers all share the
//! same registration semantics: membership by handler identity, concurrent
//! add/remove from any thread, and snapshot iteration that never holds the
//! lock while a handler runs.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::dispatch::EventDispatcher;

/// A concurrent set of handlers keyed by `Arc` identity.
///
/// Adding a handler that is already present is a no-op, as is removing one
/// that is absent. Iteration order is unspecified.
///
/// Mutation is safe while a delivery pass is in flight on another thread:
/// deliveries iterate over a snapshot taken under the lock, so a removal
/// takes effect no later than the next delivery pass, and a handler is never
/// invoked twice within one pass.
pub struct ObserverSet<T: ?Sized> {
    entries: RwLock<Vec<Entry<T>>>,
}

struct Entry<T: ?Sized> {
    key: usize,
    handler: Arc<T>,
}

fn identity<T: ?Sized>(handler: &Arc<T>) -> usize {
    Arc::as_ptr(handler) as *const () as usize
}

impl<T: ?Sized> ObserverSet<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Add a handler; no-op if the same handler is already registered.
    pub fn add(&self, handler: Arc<T>) {
        let key = identity(&handler);
        let mut entries = self.entries.write();
        if entries.iter().any(|e| e.key == key) {
            return;
        }
        entries.push(Entry { key, handler });
    }

    /// Remove a handler; no-op if it was never registered.
    pub fn remove(&self, handler: &Arc<T>) {
        let key = identity(handler);
        self.entries.write().retain(|e| e.key != key);
    }

    /// Snapshot the current handlers for iteration outside the lock.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.entries
            .read()
            .iter()
            .map(|e| Arc::clone(&e.handler))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl<T: ?Sized> Default for ObserverSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + Send + Sync + 'static> ObserverSet<T> {
    /// Invoke `f` on every registered handler, marshalled onto the
    /// dispatcher's execution context.
    ///
    /// The snapshot is taken when the dispatched job runs, so a handler
    /// removed before the job executes is not notified.
    pub fn notify<F>(self: &Arc<Self>, dispatcher: &EventDispatcher, f: F)
    where
        F: Fn(&T) + Send + 'static,
    {
        let set = Arc::clone(self);
        dispatcher.dispatch(move || {
            for handler in set.snapshot() {
                f(&handler);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Counter: Send + Sync {
        fn bump(&self);
    }

    struct TestCounter(AtomicUsize);

    impl Counter for TestCounter {
        fn bump(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_add_is_idempotent_by_identity() {
        let set: ObserverSet<dyn Counter> = ObserverSet::new();
        let a: Arc<dyn Counter> = Arc::new(TestCounter(AtomicUsize::new(0)));
        set.add(Arc::clone(&a));
        set.add(Arc::clone(&a));
        assert_eq!(set.len(), 1);

        // A distinct allocation is a distinct member.
        let b: Arc<dyn Counter> = Arc::new(TestCounter(AtomicUsize::new(0)));
        set.add(b);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let set: ObserverSet<dyn Counter> = ObserverSet::new();
        let a: Arc<dyn Counter> = Arc::new(TestCounter(AtomicUsize::new(0)));
        set.remove(&a);
        assert!(set.is_empty());

        set.add(Arc::clone(&a));
        set.remove(&a);
        set.remove(&a);
        assert!(set.is_empty());
    }

    #[test]
    fn test_snapshot_isolated_from_mutation() {
        let set: ObserverSet<dyn Counter> = ObserverSet::new();
        let a: Arc<dyn Counter> = Arc::new(TestCounter(AtomicUsize::new(0)));
        set.add(Arc::clone(&a));

        let snap = set.snapshot();
        set.remove(&a);
        assert_eq!(snap.len(), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_concurrent_add_remove() {
        let set: Arc<ObserverSet<dyn Counter>> = Arc::new(ObserverSet::new());
        let handlers: Vec<Arc<dyn Counter>> = (0..64)
            .map(|_| Arc::new(TestCounter(AtomicUsize::new(0))) as Arc<dyn Counter>)
            .collect();

        let mut threads = Vec::new();
        for chunk in handlers.chunks(16) {
            let set = Arc::clone(&set);
            let chunk: Vec<_> = chunk.to_vec();
            threads.push(std::thread::spawn(move || {
                for h in &chunk {
                    set.add(Arc::clone(h));
                }
                for h in &chunk {
                    set.remove(h);
                }
            }));
        }
        // Iterate while the other threads mutate.
        for _ in 0..100 {
            for h in set.snapshot() {
                h.bump();
            }
        }
        for t in threads {
            t.join().unwrap();
        }
        assert!(set.is_empty());
    }
}
