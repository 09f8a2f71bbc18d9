//! Background annotation queue.
//!
//! Annotation is decoupled from the request that produced the boxes: the
//! handler enqueues a job and returns immediately, and a bounded pool of
//! workers draws and persists the artifact, then publishes its path to the
//! store. A full channel applies backpressure to submitters instead of
//! spawning unbounded detached tasks.

use std::path::PathBuf;
use std::sync::Arc;

use image::DynamicImage;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::detection::annotate;
use crate::models::BoundingBox;
use crate::store::InferenceStore;

/// One queued annotation request.
pub struct AnnotationJob {
    pub id: String,
    pub image: DynamicImage,
    pub boxes: Vec<BoundingBox>,
    pub path: PathBuf,
    /// Optional completion signal carrying the artifact path. Used by tests
    /// and shutdown; regular requests fire and forget.
    pub done: Option<oneshot::Sender<Result<PathBuf, String>>>,
}

pub struct AnnotationQueue {
    tx: mpsc::Sender<AnnotationJob>,
    workers: Vec<JoinHandle<()>>,
}

impl AnnotationQueue {
    pub fn start(store: Arc<InferenceStore>, workers: usize, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        let rx = Arc::new(Mutex::new(rx));
        let workers = (0..workers.max(1))
            .map(|worker| {
                let rx = Arc::clone(&rx);
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    loop {
                        let job = rx.lock().await.recv().await;
                        let Some(job) = job else { break };
                        run_job(&store, job).await;
                    }
                    debug!(worker, "annotation worker stopped");
                })
            })
            .collect();
        Self { tx, workers }
    }

    /// A cheap handle for submitting jobs from request handlers.
    pub fn sender(&self) -> mpsc::Sender<AnnotationJob> {
        self.tx.clone()
    }

    /// Stop accepting jobs, drain the queue and join all workers.
    ///
    /// Workers exit when the job channel closes, which happens only after
    /// every handle obtained from [`AnnotationQueue::sender`] has been
    /// dropped. A caller still holding one blocks this call indefinitely,
    /// so release all senders before closing.
    pub async fn close(self) {
        drop(self.tx);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

async fn run_job(store: &InferenceStore, job: AnnotationJob) {
    let AnnotationJob {
        id,
        image,
        boxes,
        path,
        done,
    } = job;

    let blocking = tokio::task::spawn_blocking(move || {
        annotate::annotate_to_file(&image, &boxes, &path).map(|_| path)
    })
    .await;

    let result = match blocking {
        Ok(Ok(path)) => {
            store.set(&id, path.clone());
            info!(id = %id, path = %path.display(), "annotated image written");
            Ok(path)
        }
        Ok(Err(err)) => {
            // The box list already went out; the artifact just stays
            // unavailable in the index.
            error!(id = %id, error = %err, "annotation failed, artifact not available");
            Err(err.to_string())
        }
        Err(err) => {
            error!(id = %id, error = %err, "annotation task panicked");
            Err(err.to_string())
        }
    };

    if let Some(done) = done {
        let _ = done.send(result);
    }
}
