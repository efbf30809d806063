use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::info;

/// A periodic task that can be cancelled. Dropping the handle also stops it.
pub struct RefreshHandle {
    cancel_tx: broadcast::Sender<()>,
    join: JoinHandle<()>,
}

impl RefreshHandle {
    /// Runs `tick` every `period`, first after one full period has elapsed.
    pub fn spawn<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (cancel_tx, mut cancel_rx) = broadcast::channel(1);
        let join = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel_rx.recv() => {
                        info!("auto-refresh stopped");
                        break;
                    }
                    _ = ticker.tick() => tick().await,
                }
            }
        });

        Self { cancel_tx, join }
    }

    /// Signals the task to stop. A tick already running finishes first.
    pub fn stop(self) {
        let _ = self.cancel_tx.send(());
    }

    /// Stops the task and waits for it to exit.
    pub async fn shutdown(self) -> Result<(), tokio::task::JoinError> {
        let _ = self.cancel_tx.send(());
        self.join.await
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const PERIOD: Duration = Duration::from_secs(30 * 60);

    fn counting_handle(counter: Arc<AtomicUsize>) -> RefreshHandle {
        RefreshHandle::spawn(PERIOD, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_does_not_fire_immediately() {
        let counter = Arc::new(AtomicUsize::new(0));
        let _handle = counting_handle(counter.clone());

        tokio::time::sleep(PERIOD - Duration::from_secs(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_every_period() {
        let counter = Arc::new(AtomicUsize::new(0));
        let _handle = counting_handle(counter.clone());

        tokio::time::sleep(PERIOD * 3 + Duration::from_secs(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_ticks() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = counting_handle(counter.clone());

        tokio::time::sleep(PERIOD + Duration::from_secs(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        handle.shutdown().await.unwrap();
        tokio::time::sleep(PERIOD * 2).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_without_waiting() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = counting_handle(counter.clone());

        handle.stop();
        tokio::time::sleep(PERIOD * 2).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        drop(counting_handle(counter.clone()));

        tokio::time::sleep(PERIOD * 2).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
