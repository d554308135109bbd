//! A dedicated thread that owns the automation host.
//!
//! Automation bindings are single-threaded (COM apartments, AppleScript
//! sessions), so the host is created on one OS thread and every call runs
//! there. Async handlers submit jobs over a channel and await the reply,
//! which keeps host calls off the runtime's worker threads.
//!
//! Jobs run one at a time in submission order. A sequence of jobs from one
//! request can still interleave with jobs from another request.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;

use tokio::sync::{mpsc, oneshot};

use crate::adapter::ExcelHost;
use crate::error::{HostError, HostResult};

type Job = Box<dyn FnOnce(&mut dyn ExcelHost) + Send>;

/// Cheap, cloneable handle to the automation thread.
#[derive(Clone)]
pub struct Automation {
    jobs: mpsc::UnboundedSender<Job>,
}

impl Automation {
    /// Spawn the automation thread and build the host on it.
    ///
    /// Blocks until `factory` has returned; its error is returned here.
    pub fn start<H, F>(factory: F) -> HostResult<Self>
    where
        H: ExcelHost,
        F: FnOnce() -> HostResult<H> + Send + 'static,
    {
        let (jobs, mut queue) = mpsc::unbounded_channel::<Job>();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<HostResult<()>>();

        thread::Builder::new()
            .name("excel-automation".to_string())
            .spawn(move || {
                let mut host = match factory() {
                    Ok(host) => {
                        let _ = ready_tx.send(Ok(()));
                        host
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                tracing::debug!("Automation thread started");
                while let Some(job) = queue.blocking_recv() {
                    job(&mut host);
                }
                tracing::debug!("Automation thread stopped");
            })?;

        ready_rx.recv().map_err(|_| {
            HostError::Connection("automation thread exited during startup".to_string())
        })??;

        Ok(Self { jobs })
    }

    /// Run `job` against the host and wait for its result.
    pub async fn run<T, F>(&self, job: F) -> HostResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn ExcelHost) -> HostResult<T> + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |host: &mut dyn ExcelHost| {
            let result = catch_unwind(AssertUnwindSafe(|| job(host))).unwrap_or_else(|panic| {
                let reason = panic_message(panic.as_ref());
                tracing::error!("Automation call panicked: {reason}");
                Err(HostError::Other(anyhow::anyhow!(
                    "automation call panicked: {reason}"
                )))
            });
            let _ = reply_tx.send(result);
        });

        self.jobs.send(job).map_err(|_| {
            HostError::Connection("automation thread is not running".to_string())
        })?;

        reply_rx.await.map_err(|_| {
            HostError::Connection("automation thread stopped before replying".to_string())
        })?
    }

    pub fn is_running(&self) -> bool {
        !self.jobs.is_closed()
    }
}

impl std::fmt::Debug for Automation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Automation")
            .field("running", &self.is_running())
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
