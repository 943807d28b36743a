//! Daily rotation scheduler
//!
//! Each file-backed logger runs one background thread that sleeps until the
//! next local midnight, runs the rotation cycle, and repeats until shut down.
//! The thread drives a current-thread tokio runtime so the wait can select
//! between the timer and the shutdown signal.

use std::future::Future;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::retention::local_midnight;

const THREAD_NAME: &str = "daylog-rotation";

/// Time from `now` until the next local midnight
pub fn until_next_midnight(now: DateTime<Local>) -> Duration {
    let next = match now.date_naive().succ_opt() {
        Some(tomorrow) => local_midnight(tomorrow),
        None => return Duration::MAX,
    };
    (next - now).to_std().unwrap_or(Duration::ZERO)
}

/// Wait `next_delay()`, run `cycle`, repeat until `shutdown` resolves
///
/// Shutdown wins over a timer that is ready at the same moment. A dropped
/// sender counts as shutdown.
pub(crate) async fn run_schedule<D, C>(
    mut next_delay: D,
    mut cycle: C,
    mut shutdown: oneshot::Receiver<()>,
) where
    D: FnMut() -> Duration,
    C: FnMut(),
{
    loop {
        let delay = next_delay();
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(delay) => {}
        }
        cycle();
    }
}

/// Handle to a running rotation thread
pub(crate) struct RotationScheduler {
    shutdown_tx: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl RotationScheduler {
    /// Start a thread that runs `cycle` each time `next_delay()` elapses
    ///
    /// Loggers pass the time until the next local midnight.
    pub(crate) fn spawn_with<D, C>(next_delay: D, cycle: C) -> Result<Self>
    where
        D: FnMut() -> Duration + Send + 'static,
        C: FnMut() + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let schedule = run_schedule(next_delay, cycle, shutdown_rx);
        let thread = spawn_runtime_thread(schedule)?;

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    /// Signal the thread to stop and wait for it; safe to call repeatedly
    pub(crate) fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            // Ignore error if the thread has already exited
            let _ = tx.send(());
        }

        if let Some(handle) = self.thread.take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                error!("Rotation scheduler thread panicked");
            }
        }
    }
}

impl Drop for RotationScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_runtime_thread<F>(future: F) -> Result<JoinHandle<()>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(Error::SpawnScheduler)?;

    thread::Builder::new()
        .name(THREAD_NAME.to_string())
        .spawn(move || {
            debug!("Rotation scheduler started");
            runtime.block_on(future);
            debug!("Rotation scheduler stopped");
        })
        .map_err(Error::SpawnScheduler)
}
