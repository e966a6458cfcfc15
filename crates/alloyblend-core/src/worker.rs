//! Background solves for callers that must stay responsive.
//!
//! A worker owns its problem and backend for the whole solve and talks to the
//! caller only through a channel of [`WorkerEvent`]s. Cancelling raises the
//! solver interrupt; whatever the solve produced afterwards is dropped.

use alloyblend_solver::Interrupt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::model::BlendingProblem;
use crate::pipeline::{Optimizer, Progress};
use crate::result::OptimizationResult;

const EVENT_CAPACITY: usize = 16;

#[derive(Debug)]
pub enum WorkerEvent {
    Progress(Progress),
    Finished(Box<OptimizationResult>),
    /// Invalid input or malformed model, already formatted for display
    Failed(String),
}

pub struct SolveWorker;

impl SolveWorker {
    /// Start solving on the blocking thread pool.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(optimizer: Optimizer, problem: BlendingProblem) -> SolveHandle {
        let (tx, rx) = mpsc::channel(EVENT_CAPACITY);
        let interrupt = Interrupt::new();
        let optimizer = optimizer.with_interrupt(interrupt.clone());
        let cancelled = interrupt.clone();

        let task = tokio::task::spawn_blocking(move || {
            let progress_tx = tx.clone();
            let outcome = optimizer.optimize_with_progress(&problem, |progress| {
                // Progress is best effort; a slow reader never stalls the solve
                let _ = progress_tx.try_send(WorkerEvent::Progress(progress));
            });

            if cancelled.is_triggered() {
                debug!(problem = %problem.name, "solve cancelled, result dropped");
                return;
            }
            let event = match outcome {
                Ok(result) => WorkerEvent::Finished(Box::new(result)),
                Err(e) => WorkerEvent::Failed(e.to_string()),
            };
            if tx.blocking_send(event).is_err() {
                debug!(problem = %problem.name, "solve handle dropped before completion");
            }
        });

        SolveHandle {
            interrupt,
            events: rx,
            task: Some(task),
        }
    }
}

/// Caller side of a running solve
pub struct SolveHandle {
    interrupt: Interrupt,
    events: mpsc::Receiver<WorkerEvent>,
    task: Option<JoinHandle<()>>,
}

impl SolveHandle {
    /// Request cooperative cancellation. No further events are delivered.
    pub fn cancel(&self) {
        self.interrupt.trigger();
    }

    pub fn is_cancelled(&self) -> bool {
        self.interrupt.is_triggered()
    }

    /// Next event, or `None` once the solve is over or cancelled
    pub async fn next_event(&mut self) -> Option<WorkerEvent> {
        if self.is_cancelled() {
            return None;
        }
        let event = self.events.recv().await?;
        if self.is_cancelled() { None } else { Some(event) }
    }

    /// Skip progress and wait for the outcome; `None` if cancelled
    pub async fn wait(mut self) -> Option<Result<OptimizationResult, String>> {
        while let Some(event) = self.next_event().await {
            match event {
                WorkerEvent::Progress(_) => {}
                WorkerEvent::Finished(result) => return Some(Ok(*result)),
                WorkerEvent::Failed(message) => return Some(Err(message)),
            }
        }
        if self.is_cancelled() {
            return None;
        }
        // Channel closed without an outcome: the task itself failed
        match self.task.take()?.await {
            Ok(()) => None,
            Err(e) => Some(Err(format!("solve task failed: {}", e))),
        }
    }
}
