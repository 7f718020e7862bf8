//! Debounced field edits.
//!
//! One cancellable delayed task per `(entity id, field)`. Scheduling again
//! for the same key cancels the waiting task and restarts the delay, so only
//! the last edit after a quiet period is written.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

type Key = (String, String);

#[derive(Clone)]
pub struct FieldDebouncer {
    delay: Duration,
    tasks: Arc<Mutex<HashMap<Key, (u64, CancellationToken)>>>,
    generation: Arc<std::sync::atomic::AtomicU64>,
}

impl FieldDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            generation: Arc::new(std::sync::atomic::AtomicU64::new(0)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `task` after the quiet period unless another edit for the same
    /// key arrives first.
    pub fn schedule<F>(&self, id: &str, field: &str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key: Key = (id.to_string(), field.to_string());
        let generation = self
            .generation
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let token = CancellationToken::new();

        if let Ok(mut tasks) = self.tasks.lock()
            && let Some((_, previous)) = tasks.insert(key.clone(), (generation, token.clone()))
        {
            debug!("Restarting debounce for {}:{}", key.0, key.1);
            previous.cancel();
        }

        let delay = self.delay;
        let tasks = Arc::clone(&self.tasks);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            task.await;
            if let Ok(mut tasks) = tasks.lock()
                && tasks.get(&key).is_some_and(|(g, _)| *g == generation)
            {
                tasks.remove(&key);
            }
        });
    }

    /// Number of edits waiting out their delay or still being written
    pub fn pending(&self) -> usize {
        self.tasks.lock().map(|t| t.len()).unwrap_or(0)
    }

    /// Cancel every waiting edit
    pub fn cancel_all(&self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for (_, (_, token)) in tasks.drain() {
                token.cancel();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_only_last_edit_fires() {
        let debouncer = FieldDebouncer::new(Duration::from_millis(50));
        let written = Arc::new(Mutex::new(Vec::new()));

        for value in ["P", "Pa", "Parent"] {
            let written = written.clone();
            debouncer.schedule("p1", "name", async move {
                written.lock().unwrap().push(value);
            });
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(debouncer.pending(), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(*written.lock().unwrap(), vec!["Parent"]);
        assert_eq!(debouncer.pending(), 0);
    }

    #[tokio::test]
    async fn test_fields_are_independent() {
        let debouncer = FieldDebouncer::new(Duration::from_millis(30));
        let count = Arc::new(AtomicUsize::new(0));
        for field in ["name", "north_star"] {
            let count = count.clone();
            debouncer.schedule("p1", field, async move {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let debouncer = FieldDebouncer::new(Duration::from_millis(30));
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        debouncer.schedule("p1", "name", async move {
            c.fetch_add(1, Ordering::SeqCst);
        });
        debouncer.cancel_all();
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
