//! BatchRunner - drives a `BatchPipeline` on a background task.
//!
//! Progress is published as a stream of `BatchEvent`s. Decisions travel
//! back on a separate channel, so a suspended batch can wait indefinitely
//! without holding anything but the pipeline itself.

use futures::stream::{self, Stream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::batch::{BatchError, BatchItemResult, BatchReport, Decision, DecisionRequest};
use crate::domain::foundation::BatchItemId;

use super::pipeline::{AbortHandle, BatchPipeline, StepOutcome};

/// Progress published by a running batch.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    ItemFinished(BatchItemResult),
    /// The batch is suspended until a decision for this request is sent.
    DecisionRequired(DecisionRequest),
    /// A decision was refused; the batch is still waiting.
    DecisionRejected { item_id: BatchItemId, error: BatchError },
    /// A store failed and the batch stopped.
    Halted { error: BatchError, report: BatchReport },
    Finished { report: BatchReport },
}

/// The decision channel closed because the batch is no longer running.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("batch is no longer running")]
pub struct BatchClosed;

/// Sends duplicate-resolution decisions to a running batch.
#[derive(Debug, Clone)]
pub struct DecisionSender {
    tx: mpsc::UnboundedSender<(BatchItemId, Decision)>,
}

impl DecisionSender {
    pub fn send(&self, item_id: BatchItemId, decision: Decision) -> Result<(), BatchClosed> {
        self.tx.send((item_id, decision)).map_err(|_| BatchClosed)
    }
}

/// Handle to a batch running in the background.
pub struct BatchHandle {
    events: mpsc::UnboundedReceiver<BatchEvent>,
    decisions: DecisionSender,
    abort: AbortHandle,
    task: JoinHandle<BatchReport>,
}

impl BatchHandle {
    pub fn decisions(&self) -> DecisionSender {
        self.decisions.clone()
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Next event, or `None` once the batch has finished and every event was read.
    pub async fn next_event(&mut self) -> Option<BatchEvent> {
        self.events.recv().await
    }

    /// Consumes the handle, yielding the remaining events as a stream.
    ///
    /// Take `decisions()` and `abort_handle()` first if they are needed.
    pub fn events(self) -> impl Stream<Item = BatchEvent> {
        let Self { events, task, .. } = self;
        stream::unfold((events, task), |(mut events, task)| async move {
            events.recv().await.map(|event| (event, (events, task)))
        })
    }

    /// Waits for the batch to end and returns its report.
    pub async fn join(self) -> BatchReport {
        let Self { events, task, .. } = self;
        drop(events);
        match task.await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "Batch task failed");
                BatchReport::default()
            }
        }
    }
}

pub struct BatchRunner;

impl BatchRunner {
    /// Starts `pipeline` on a tokio task.
    ///
    /// Dropping every `DecisionSender` while a decision is pending aborts
    /// the batch.
    pub fn spawn(pipeline: BatchPipeline) -> BatchHandle {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (decision_tx, decision_rx) = mpsc::unbounded_channel();
        let abort = pipeline.abort_handle();

        let task = tokio::spawn(drive(pipeline, event_tx, decision_rx));

        BatchHandle {
            events: event_rx,
            decisions: DecisionSender { tx: decision_tx },
            abort,
            task,
        }
    }
}

async fn drive(
    mut pipeline: BatchPipeline,
    events: mpsc::UnboundedSender<BatchEvent>,
    mut decisions: mpsc::UnboundedReceiver<(BatchItemId, Decision)>,
) -> BatchReport {
    let abort = pipeline.abort_handle();
    // Send failures mean nobody is listening; the batch still runs to the end.
    let publish = |event: BatchEvent| {
        let _ = events.send(event);
    };

    loop {
        let request = match pipeline.step().await {
            Ok(StepOutcome::ItemFinished(result)) => {
                publish(BatchEvent::ItemFinished(result));
                continue;
            }
            Ok(StepOutcome::AwaitingDecision(request)) | Ok(StepOutcome::Suspended(request)) => request,
            Ok(StepOutcome::Completed) | Ok(StepOutcome::Aborted) => break,
            Err(error) => {
                let report = pipeline.report();
                publish(BatchEvent::Halted {
                    error,
                    report: report.clone(),
                });
                return report;
            }
        };

        publish(BatchEvent::DecisionRequired(request));

        let received = tokio::select! {
            received = decisions.recv() => received,
            _ = abort.aborted() => continue,
        };
        let Some((item_id, decision)) = received else {
            tracing::warn!("Decision channel closed; aborting batch");
            abort.abort();
            continue;
        };

        match pipeline.submit_decision(item_id, decision).await {
            Ok(result) => publish(BatchEvent::ItemFinished(result)),
            Err(error) if error.is_fatal() => {
                let report = pipeline.report();
                publish(BatchEvent::Halted {
                    error,
                    report: report.clone(),
                });
                return report;
            }
            Err(error) => {
                tracing::warn!(item_id = %item_id, error = %error, "Decision rejected");
                publish(BatchEvent::DecisionRejected { item_id, error });
            }
        }
    }

    let report = pipeline.report();
    tracing::info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        skipped = report.skipped(),
        aborted = report.aborted,
        "Batch finished"
    );
    publish(BatchEvent::Finished { report: report.clone() });
    report
}
