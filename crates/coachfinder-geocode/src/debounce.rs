//! Cancellable delayed task.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Runs the most recently scheduled job once `delay` has passed without
/// another call to [`Debouncer::schedule`].
///
/// Only the waiting period can be cancelled. Once the timer fires, the job is
/// spawned on its own task and runs to completion even if a newer job is
/// scheduled afterwards; the caller is expected to discard stale output.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    /// Timer task; resolves to the handle of the job it spawned.
    pending: Option<JoinHandle<JoinHandle<()>>>,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Replaces any waiting job with `job`. Must be called inside a tokio
    /// runtime.
    pub fn schedule<F>(&mut self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(job)
        }));
    }

    /// Waits for the scheduled job, if any, to fire and run to completion.
    pub async fn flush(&mut self) {
        let Some(timer) = self.pending.take() else {
            return;
        };
        // The timer cannot be aborted once taken, so only a panic ends up here.
        match timer.await {
            Ok(job) => {
                if let Err(error) = job.await {
                    tracing::warn!(%error, "debounced job failed");
                }
            }
            Err(error) => tracing::warn!(%error, "debounce timer failed"),
        }
    }

    /// Drops the waiting job, if any. A job that already started is not
    /// affected.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// `true` while a job is waiting for its timer.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn push(log: &Log, label: &'static str) -> impl Future<Output = ()> + Send + 'static {
        let log = Arc::clone(log);
        async move {
            log.lock().unwrap().push(label);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn only_last_job_in_burst_runs() {
        let log = Log::default();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        debouncer.schedule(push(&log, "a"));
        tokio::time::sleep(Duration::from_millis(200)).await;
        debouncer.schedule(push(&log, "ab"));
        tokio::time::sleep(Duration::from_millis(200)).await;
        debouncer.schedule(push(&log, "abc"));
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(*log.lock().unwrap(), ["abc"]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn job_does_not_run_before_delay() {
        let log = Log::default();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        debouncer.schedule(push(&log, "x"));
        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(log.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(*log.lock().unwrap(), ["x"]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_and_drop_stop_waiting_jobs() {
        let log = Log::default();

        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        debouncer.schedule(push(&log, "cancelled"));
        debouncer.cancel();
        assert!(!debouncer.is_pending());

        let mut dropped = Debouncer::new(Duration::from_millis(100));
        dropped.schedule(push(&log, "dropped"));
        drop(dropped);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn flush_waits_for_the_job_to_finish() {
        let log = Log::default();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        let sink = Arc::clone(&log);
        debouncer.schedule(async move {
            tokio::time::sleep(Duration::from_millis(1_000)).await;
            sink.lock().unwrap().push("done");
        });
        debouncer.flush().await;

        assert_eq!(*log.lock().unwrap(), ["done"]);
        assert!(!debouncer.is_pending());
        debouncer.flush().await;
    }

    #[tokio::test(start_paused = true)]
    async fn started_job_survives_a_new_schedule() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = Debouncer::new(Duration::from_millis(100));

        let sink = Arc::clone(&log);
        debouncer.schedule(async move {
            tokio::time::sleep(Duration::from_millis(1_000)).await;
            sink.lock().unwrap().push("slow");
        });
        tokio::time::sleep(Duration::from_millis(150)).await;

        let sink = Arc::clone(&log);
        debouncer.schedule(async move {
            sink.lock().unwrap().push("fast");
        });
        tokio::time::sleep(Duration::from_millis(2_000)).await;

        assert_eq!(*log.lock().unwrap(), ["fast", "slow"]);
    }
}
