use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use tracing::debug;

use crate::dataset::EmbeddingRecord;

use super::request::{RequestToken, RequestTracker};
use super::{PipelineConfig, PipelineError, ProcessOutput, ProcessingPipeline};

type Completion = (RequestToken, Result<ProcessOutput, PipelineError>);

/// Runs pipeline requests on background threads and hands back only the
/// result of the most recent one.
pub struct PipelineWorker {
    pipeline: ProcessingPipeline,
    tracker: RequestTracker,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    in_flight: usize,
}

impl PipelineWorker {
    pub fn new(pipeline: ProcessingPipeline) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            pipeline,
            tracker: RequestTracker::default(),
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn pipeline(&self) -> &ProcessingPipeline {
        &self.pipeline
    }

    pub fn submit(
        &mut self,
        records: Arc<Vec<EmbeddingRecord>>,
        config: PipelineConfig,
    ) -> RequestToken {
        let token = self.tracker.issue();
        let pipeline = self.pipeline.clone();
        let tx = self.tx.clone();
        self.in_flight += 1;

        thread::spawn(move || {
            let result = pipeline.process(&records, &config);
            let _ = tx.send((token, result));
        });

        debug!("submitted processing request {token:?}");
        token
    }

    pub fn poll(&mut self) -> Option<Completion> {
        let mut committed = None;
        loop {
            match self.rx.try_recv() {
                Ok((token, result)) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    if self.tracker.accept(token) {
                        committed = Some((token, result));
                    } else {
                        debug!("discarding stale processing result {token:?}");
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        committed
    }

    /// Makes every outstanding request stale; their results are dropped on arrival.
    pub fn discard_pending(&mut self) {
        self.tracker.invalidate();
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    pub fn awaiting_latest(&self) -> bool {
        self.tracker.awaiting()
    }
}
