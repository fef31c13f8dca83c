//! Background worker for status updates

use std::future::Future;
use std::sync::Mutex;

use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Runs status updates off the event path
///
/// Submitted tasks run to completion; there is no cancellation.
#[derive(Default)]
pub struct StatusScheduler {
    tasks: Mutex<JoinSet<()>>,
}

impl StatusScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a task
    pub fn spawn<F>(&self, name: &str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());

        // Reap finished tasks
        while let Some(result) = tasks.try_join_next() {
            if let Err(e) = result {
                error!("Status update task failed: {}", e);
            }
        }

        debug!("Scheduling task: {}", name);
        tasks.spawn(task);
    }

    /// Number of tasks not yet reaped
    pub fn pending(&self) -> usize {
        let tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.len()
    }

    /// Wait for all submitted tasks, including ones submitted while waiting
    pub async fn drain(&self) {
        loop {
            let mut tasks = {
                let mut guard = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
                std::mem::take(&mut *guard)
            };
            if tasks.is_empty() {
                return;
            }
            info!("Waiting for {} status update task(s)...", tasks.len());
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    error!("Status update task failed: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_drain_waits_for_tasks() {
        let scheduler = StatusScheduler::new();
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let done = done.clone();
            scheduler.spawn("test", async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        scheduler.drain().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn test_panicking_task_is_contained() {
        let scheduler = StatusScheduler::new();
        scheduler.spawn("boom", async { panic!("boom") });
        scheduler.drain().await;
    }
}
