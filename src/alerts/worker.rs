//! Per-destination delivery worker
//!
//! Each worker owns one notifier, a private unbounded queue and a task that
//! drains the queue until the shared shutdown signal fires.

use super::notifier::Notifier;
use super::types::Alert;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Lifecycle of a delivery worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    /// Constructed, task not yet polled
    Created = 0,
    /// Accepting and delivering alerts
    Running = 1,
    /// Shutdown observed, no longer accepting alerts
    Draining = 2,
    /// Task exited
    Stopped = 3,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Running,
            2 => Self::Draining,
            _ => Self::Stopped,
        }
    }

    /// Whether the worker still accepts alerts
    pub fn accepts_alerts(&self) -> bool {
        matches!(self, Self::Created | Self::Running)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Draining => write!(f, "draining"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

#[derive(Debug)]
struct SharedState(AtomicU8);

impl SharedState {
    fn get(&self) -> WorkerState {
        WorkerState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: WorkerState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// Handle to a running delivery worker
pub struct DeliveryWorker {
    name: String,
    kind: &'static str,
    queue: mpsc::UnboundedSender<Arc<Alert>>,
    state: Arc<SharedState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DeliveryWorker {
    /// Spawn the worker task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(notifier: Box<dyn Notifier>, shutdown: watch::Receiver<bool>) -> Self {
        let name = notifier.name().to_string();
        let kind = notifier.kind();
        let (queue, rx) = mpsc::unbounded_channel();
        let state = Arc::new(SharedState(AtomicU8::new(WorkerState::Created as u8)));

        let task = tokio::spawn(run_worker(notifier, rx, shutdown, Arc::clone(&state)));
        log::debug!("[reporter] {}({}) created", kind, name);

        Self {
            name,
            kind,
            queue,
            state,
            task: Mutex::new(Some(task)),
        }
    }

    /// Enqueue an alert without waiting for delivery
    ///
    /// Returns `false` when the worker is draining or stopped and the alert
    /// was dropped.
    pub fn report(&self, alert: Arc<Alert>) -> bool {
        if !self.state().accepts_alerts() {
            log::debug!(
                "[reporter] {}({}) is {}, dropping {}",
                self.kind,
                self.name,
                self.state(),
                alert.summary()
            );
            return false;
        }

        match self.queue.send(alert) {
            Ok(()) => true,
            Err(mpsc::error::SendError(alert)) => {
                log::debug!(
                    "[reporter] {}({}) has exited, dropping {}",
                    self.kind,
                    self.name,
                    alert.summary()
                );
                false
            }
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> WorkerState {
        self.state.get()
    }

    /// Reporter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reporter kind
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Wait for the worker task to exit
    ///
    /// The task only exits after the shutdown signal fires. A second call
    /// returns immediately.
    pub async fn join(&self) {
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                log::error!("[reporter] {}({}) task failed: {}", self.kind, self.name, e);
                self.state.set(WorkerState::Stopped);
            }
        }
    }
}

async fn run_worker(
    notifier: Box<dyn Notifier>,
    mut queue: mpsc::UnboundedReceiver<Arc<Alert>>,
    mut shutdown: watch::Receiver<bool>,
    state: Arc<SharedState>,
) {
    state.set(WorkerState::Running);

    loop {
        tokio::select! {
            biased;
            // The borrow guard must not live into the delivery arm
            _ = async { let _ = shutdown.wait_for(|stop| *stop).await; } => break,
            next = queue.recv() => match next {
                Some(alert) => {
                    if let Err(e) = notifier.notify(&alert).await {
                        log::error!(
                            "[reporter] {}({}) failed to deliver {}: {}",
                            notifier.kind(),
                            notifier.name(),
                            alert.summary(),
                            e
                        );
                    }
                }
                None => break,
            },
        }
    }

    state.set(WorkerState::Draining);
    queue.close();
    let mut dropped = 0usize;
    while queue.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        log::debug!(
            "[reporter] {}({}) dropped {} queued alerts on shutdown",
            notifier.kind(),
            notifier.name(),
            dropped
        );
    }

    state.set(WorkerState::Stopped);
    log::debug!("[reporter] {}({}) stopped", notifier.kind(), notifier.name());
}
