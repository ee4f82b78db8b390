//! Debounced and periodic background saves.

use std::{
    collections::HashMap,
    future::Future,
    hash::Hash,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::debug;

/// Runs at most one save per key after `delay` of quiet.
///
/// Scheduling again for the same key aborts the save still waiting for that
/// key. A save that already started is never interrupted: it runs on its
/// own task.
pub struct Debouncer<K> {
    delay: Duration,
    waiting: Arc<Mutex<HashMap<K, (u64, JoinHandle<()>)>>>,
    generation: AtomicU64,
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Send + std::fmt::Debug + 'static,
{
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            waiting: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule<F, Fut>(&self, key: K, save: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Ok(mut waiting) = self.waiting.lock() else {
            return;
        };
        if let Some((_, previous)) = waiting.remove(&key) {
            previous.abort();
        }
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let delay = self.delay;
        let registry = Arc::clone(&self.waiting);
        let slot = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Only the current owner of the slot may start its save.
            let started = match registry.lock() {
                Ok(mut waiting) if waiting.get(&slot).is_some_and(|(g, _)| *g == generation) => {
                    waiting.remove(&slot);
                    Some(save())
                }
                _ => None,
            };
            match started {
                Some(save) => {
                    debug!(key = ?slot, "debounced save fired");
                    tokio::spawn(save);
                }
                None => debug!(key = ?slot, "superseded save dropped"),
            }
        });
        waiting.insert(key, (generation, handle));
    }

    /// Drops the waiting save for `key`, if any.
    pub fn cancel(&self, key: &K) -> bool {
        let Ok(mut waiting) = self.waiting.lock() else {
            return false;
        };
        match waiting.remove(key) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_waiting(&self, key: &K) -> bool {
        self.waiting
            .lock()
            .map(|waiting| waiting.contains_key(key))
            .unwrap_or(false)
    }
}

impl<K> Drop for Debouncer<K> {
    fn drop(&mut self) {
        if let Ok(mut waiting) = self.waiting.lock() {
            for (_, (_, handle)) in waiting.drain() {
                handle.abort();
            }
        }
    }
}

/// Background task repeating `tick` every `period`, first run one period
/// after start. Stops when dropped.
pub struct Periodic {
    handle: JoinHandle<()>,
}

impl Periodic {
    pub fn spawn<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval.tick().await;
            loop {
                interval.tick().await;
                tick().await;
            }
        });
        Self { handle }
    }
}

impl Drop for Periodic {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
