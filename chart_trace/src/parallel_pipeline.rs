// THEORY:
// The `parallel_pipeline` module runs many independent extractions at once.
// Each extraction is pure CPU work on its own buffer, so there is no shared
// mutable state to coordinate: the pool only has to fan jobs out and route
// every result back to the caller that submitted it.
//
// Key architectural principles:
// 1.  **Single Dispatcher**: One task owns the job queue and hands jobs to the
//     workers round-robin over per-worker channels.
// 2.  **Blocking Work Off the Reactor**: Workers are async tasks, but the
//     extraction itself runs under `spawn_blocking` so long scans never stall the
//     runtime's event loop.
// 3.  **One Reply Channel per Job**: Every job carries a `oneshot` sender, so
//     results come back to the right caller regardless of completion order, and
//     `process_batch` returns results in input order.

use crate::core_modules::pixel::pixel::PixelBuffer;
use crate::error::{ExtractionError, Result};
use crate::pipeline::{ExtractionPipeline, ExtractionResult};
use futures::future::join_all;
use log::{debug, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

pub struct ExtractionTask {
    pub job_id: u64,
    pub buffer: PixelBuffer,
    pub result_sender: oneshot::Sender<Result<ExtractionResult>>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<ExtractionTask>,
    dispatcher: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
    next_job_id: AtomicU64,
}

impl WorkerPool {
    /// A pool with one worker per logical CPU.
    pub fn new(pipeline: ExtractionPipeline) -> Self {
        Self::with_workers(pipeline, num_cpus::get())
    }

    /// Must be called from within a Tokio runtime.
    pub fn with_workers(pipeline: ExtractionPipeline, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let pipeline = Arc::new(pipeline);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<ExtractionTask>();

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<ExtractionTask>())
            .unzip();

        // Spawn dispatcher
        let dispatcher = tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if worker_senders[worker_idx].send(task).is_err() {
                    warn!("worker {worker_idx} is gone; dropping job");
                }
                worker_idx = (worker_idx + 1) % worker_count;
            }
        });

        // Spawn workers
        let workers = worker_receivers
            .into_iter()
            .enumerate()
            .map(|(worker_idx, mut worker_receiver)| {
                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(async move {
                    while let Some(task) = worker_receiver.recv().await {
                        let ExtractionTask {
                            job_id,
                            buffer,
                            result_sender,
                        } = task;
                        let pipeline = Arc::clone(&pipeline);
                        let job = move || pipeline.extract(&buffer);
                        let result = match tokio::task::spawn_blocking(job).await {
                            Ok(result) => result,
                            Err(e) => Err(ExtractionError::WorkerUnavailable(e.to_string())),
                        };
                        debug!("worker {worker_idx} finished job {job_id}");
                        // The caller may have stopped waiting.
                        let _ = result_sender.send(result);
                    }
                })
            })
            .collect();

        Self {
            task_sender,
            dispatcher,
            workers,
            next_job_id: AtomicU64::new(0),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Submits one buffer and waits for its result.
    pub async fn process(&self, buffer: PixelBuffer) -> Result<ExtractionResult> {
        let receiver = self.submit(buffer)?;
        receiver
            .await
            .map_err(|_| {
                ExtractionError::WorkerUnavailable("worker dropped the job".to_string())
            })?
    }

    /// Extracts every buffer concurrently; results are in input order.
    pub async fn process_batch(&self, buffers: Vec<PixelBuffer>) -> Vec<Result<ExtractionResult>> {
        join_all(buffers.into_iter().map(|buffer| self.process(buffer))).await
    }

    fn submit(&self, buffer: PixelBuffer) -> Result<oneshot::Receiver<Result<ExtractionResult>>> {
        let job_id = self.next_job_id.fetch_add(1, Ordering::Relaxed);
        let (result_sender, result_receiver) = oneshot::channel();
        self.task_sender
            .send(ExtractionTask {
                job_id,
                buffer,
                result_sender,
            })
            .map_err(|_| {
                ExtractionError::WorkerUnavailable("failed to send job to worker pool".to_string())
            })?;
        Ok(result_receiver)
    }

    /// Stops accepting jobs and waits for queued ones to finish.
    pub async fn shutdown(self) {
        drop(self.task_sender);
        if let Err(e) = self.dispatcher.await {
            warn!("dispatcher ended abnormally: {e}");
        }
        for worker in self.workers {
            if let Err(e) = worker.await {
                warn!("worker ended abnormally: {e}");
            }
        }
    }
}
