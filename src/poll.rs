//! Periodic polling owned by the caller.
//!
//! The client only knows about single requests. Views that refresh on a
//! timer spawn a [`PollHandle`] and keep it for as long as they are alive;
//! stopping or dropping the handle tears the loop down and abandons any
//! request in flight, whose result is then never delivered.

use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Refresh interval used by the dashboard views.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(4000);

/// A running poll loop.
///
/// # Examples
///
/// ```no_run
/// use nids_client::{poll::{PollHandle, DEFAULT_POLL_INTERVAL}, Client, DashboardApi};
///
/// # async fn example() -> Result<(), nids_client::Error> {
/// let api = DashboardApi::new(Client::from_env()?);
///
/// let poller = PollHandle::spawn(
///     DEFAULT_POLL_INTERVAL,
///     move || {
///         let api = api.clone();
///         async move { api.system_stats().await }
///     },
///     |result| match result {
///         Ok(stats) => println!("cpu {:.1}%", stats.cpu),
///         Err(_) => {} // already reported by the client
///     },
/// );
///
/// // ... when the view goes away:
/// poller.stop().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PollHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Runs `task` now and then every `interval`, passing each output to
    /// `on_result`.
    ///
    /// Ticks are never stacked: if a run overlaps the next tick, the next
    /// run starts one full `interval` after the late tick.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<T, Task, Fut, OnResult>(
        interval: Duration,
        mut task: Task,
        mut on_result: OnResult,
    ) -> Self
    where
        T: Send + 'static,
        Task: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        OnResult: FnMut(T) + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::debug!(interval_ms = interval.as_millis(), "Poll loop starting");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = &mut stop_rx => break,
                }

                tokio::select! {
                    output = task() => on_result(output),
                    _ = &mut stop_rx => break,
                }
            }

            tracing::debug!("Poll loop stopped");
        });

        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Returns `true` once the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stops the loop and waits until it has exited.
    ///
    /// Once this returns, `on_result` will not run again.
    pub async fn stop(mut self) {
        self.signal_stop();
        if let Some(handle) = self.handle.take() {
            handle.abort();
            // Cancellation is the expected outcome here.
            let _ = handle.await;
        }
    }

    fn signal_stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.signal_stop();
        if let Some(handle) = self.handle.take() {
            // We can't await in Drop.
            handle.abort();
        }
    }
}
