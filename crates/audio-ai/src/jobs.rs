//! Debounce-and-replace background jobs.
//!
//! Noise reduction and transcription are re-run whenever the user changes
//! their settings. Only the latest request matters: starting a new job
//! cancels the previous one cooperatively and lets it wind down on its own.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use reframe_common::error::{ReframeError, ReframeResult};

/// Handle a running job uses to observe cancellation and report progress.
#[derive(Debug, Clone)]
pub struct JobContext {
    cancel: Arc<AtomicBool>,
    progress: Arc<watch::Sender<f64>>,
}

impl JobContext {
    /// A context that is never cancelled and whose progress goes nowhere.
    pub fn detached() -> Self {
        let (tx, _rx) = watch::channel(0.0);
        Self {
            cancel: Arc::new(AtomicBool::new(false)),
            progress: Arc::new(tx),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once the job has been superseded or cancelled.
    pub fn check_cancelled(&self) -> ReframeResult<()> {
        if self.is_cancelled() {
            Err(ReframeError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Publish progress in `[0, 1]`.
    pub fn report(&self, fraction: f64) {
        let _ = self.progress.send(fraction.clamp(0.0, 1.0));
    }

    /// The cancellation flag, for code that needs to poll it directly.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }
}

/// Cloneable view of whether a slot has work in flight.
#[derive(Debug, Clone, Default)]
pub struct BusyProbe {
    in_flight: Arc<AtomicUsize>,
}

impl BusyProbe {
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }
}

/// Decrements the in-flight counter when the worker exits, however it exits.
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct RunningJob<T> {
    generation: u64,
    cancel: Arc<AtomicBool>,
    progress: watch::Receiver<f64>,
    handle: JoinHandle<ReframeResult<T>>,
}

/// Holds at most one current job of a given kind.
pub struct JobSlot<T> {
    name: &'static str,
    generation: u64,
    current: Option<RunningJob<T>>,
    in_flight: Arc<AtomicUsize>,
}

impl<T: Send + 'static> JobSlot<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            generation: 0,
            current: None,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Cancel the current job (if any) and start `work` on a blocking task.
    ///
    /// Must be called from within a Tokio runtime. Returns the job's
    /// generation number.
    pub fn replace<F>(&mut self, work: F) -> u64
    where
        F: FnOnce(&JobContext) -> ReframeResult<T> + Send + 'static,
    {
        self.cancel();

        self.generation += 1;
        let cancel = Arc::new(AtomicBool::new(false));
        let (progress_tx, progress_rx) = watch::channel(0.0);
        let ctx = JobContext {
            cancel: cancel.clone(),
            progress: Arc::new(progress_tx),
        };

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard(self.in_flight.clone());
        let name = self.name;
        let generation = self.generation;

        let handle = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            tracing::debug!(job = name, generation, "Background job started");
            let result = work(&ctx);
            match &result {
                Ok(_) => tracing::debug!(job = name, generation, "Background job finished"),
                Err(e) if e.is_cancelled() => {
                    tracing::debug!(job = name, generation, "Background job cancelled")
                }
                Err(e) => tracing::warn!(job = name, generation, error = %e, "Background job failed"),
            }
            result
        });

        self.current = Some(RunningJob {
            generation,
            cancel,
            progress: progress_rx,
            handle,
        });
        generation
    }

    /// Signal the current job to stop. It keeps counting as busy until its
    /// worker actually returns.
    pub fn cancel(&mut self) {
        if let Some(job) = self.current.take() {
            job.cancel.store(true, Ordering::Relaxed);
            tracing::debug!(job = self.name, generation = job.generation, "Superseding background job");
        }
    }

    /// Whether any worker from this slot is still running, including
    /// superseded ones that have not yet noticed cancellation.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn busy_probe(&self) -> BusyProbe {
        BusyProbe {
            in_flight: self.in_flight.clone(),
        }
    }

    /// Latest progress of the current job.
    pub fn progress(&self) -> Option<f64> {
        self.current.as_ref().map(|job| *job.progress.borrow())
    }

    /// Wait for the current job and take its result.
    pub async fn wait(&mut self) -> Option<ReframeResult<T>> {
        let job = self.current.take()?;
        Some(match job.handle.await {
            Ok(result) => result,
            Err(e) => Err(ReframeError::processing(format!(
                "{} worker panicked: {e}",
                self.name
            ))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn wait_for_cancel(ctx: &JobContext) -> ReframeResult<u32> {
        for _ in 0..500 {
            ctx.check_cancelled()?;
            std::thread::sleep(Duration::from_millis(2));
        }
        Ok(0)
    }

    #[tokio::test]
    async fn test_job_runs_and_reports_result() {
        let mut slot: JobSlot<u32> = JobSlot::new("test");
        slot.replace(|ctx| {
            ctx.report(0.5);
            Ok(7)
        });
        assert_eq!(slot.wait().await.unwrap().unwrap(), 7);
        assert!(slot.wait().await.is_none());
    }

    #[tokio::test]
    async fn test_replace_cancels_previous_job() {
        let mut slot: JobSlot<u32> = JobSlot::new("test");
        let probe = slot.busy_probe();

        let first_cancelled = Arc::new(AtomicBool::new(false));
        let seen = first_cancelled.clone();
        slot.replace(move |ctx| {
            let result = wait_for_cancel(ctx);
            seen.store(result.is_err(), Ordering::SeqCst);
            result
        });
        assert!(probe.is_busy());

        let generation = slot.replace(|_| Ok(42));
        assert_eq!(generation, 2);
        assert_eq!(slot.wait().await.unwrap().unwrap(), 42);

        for _ in 0..200 {
            if !probe.is_busy() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(!probe.is_busy());
        assert!(first_cancelled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancel_yields_cancelled_error() {
        let mut slot: JobSlot<u32> = JobSlot::new("test");
        slot.replace(wait_for_cancel);
        let ctx_cancel = slot.current.as_ref().unwrap().cancel.clone();
        ctx_cancel.store(true, Ordering::Relaxed);
        let result = slot.wait().await.unwrap();
        assert!(result.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_progress_is_observable() {
        let mut slot: JobSlot<()> = JobSlot::new("test");
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        slot.replace(move |ctx| {
            ctx.report(0.25);
            let _ = rx.recv_timeout(Duration::from_secs(2));
            Ok(())
        });
        for _ in 0..200 {
            if slot.progress() == Some(0.25) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(slot.progress(), Some(0.25));
        tx.send(()).unwrap();
        slot.wait().await.unwrap().unwrap();
    }

    #[test]
    fn test_detached_context_is_never_cancelled() {
        let ctx = JobContext::detached();
        ctx.report(2.0);
        assert!(ctx.check_cancelled().is_ok());
    }
}
