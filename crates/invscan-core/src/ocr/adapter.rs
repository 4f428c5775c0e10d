//! Lifecycle owner for the recognizer worker.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use image::DynamicImage;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

use crate::error::OcrError;

use super::{Recognition, RecognizerFactory, TextRecognizer};

const QUEUE_DEPTH: usize = 16;

struct Job {
    image: DynamicImage,
    reply: oneshot::Sender<Result<Recognition, OcrError>>,
}

struct Worker {
    jobs: mpsc::Sender<Job>,
    handle: JoinHandle<()>,
}

/// Owns exactly one recognizer, created lazily on a dedicated thread.
///
/// All recognition calls are queued to that thread, so concurrent callers are
/// served one at a time. Independent adapters share nothing.
pub struct RecognizerAdapter<F: RecognizerFactory> {
    factory: Arc<F>,
    worker: Mutex<Option<Worker>>,
}

impl<F: RecognizerFactory> RecognizerAdapter<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory: Arc::new(factory),
            worker: Mutex::new(None),
        }
    }

    /// Start the worker if it is not running. Idempotent.
    pub async fn initialize(&self) -> Result<(), OcrError> {
        let mut worker = self.worker.lock().await;
        if worker.is_none() {
            *worker = Some(self.spawn_worker().await?);
            info!("Text recognizer initialized");
        }
        Ok(())
    }

    pub async fn is_initialized(&self) -> bool {
        self.worker.lock().await.is_some()
    }

    /// Recognize text in `image`, starting the worker on first use.
    pub async fn recognize(&self, image: DynamicImage) -> Result<Recognition, OcrError> {
        let jobs = {
            let mut worker = self.worker.lock().await;
            if worker.is_none() {
                *worker = Some(self.spawn_worker().await?);
                info!("Text recognizer initialized on first use");
            }
            match worker.as_ref() {
                Some(w) => w.jobs.clone(),
                None => return Err(OcrError::Unavailable("worker not running".to_string())),
            }
        };

        let (reply, response) = oneshot::channel();
        jobs.send(Job { image, reply })
            .await
            .map_err(|_| OcrError::Unavailable("recognizer worker stopped".to_string()))?;

        response
            .await
            .map_err(|_| OcrError::Unavailable("recognizer worker dropped the request".to_string()))?
            .map_err(unavailable)
    }

    /// Stop the worker and release the recognizer. Idempotent.
    ///
    /// Queued requests are still served before the worker exits. A later
    /// `recognize` starts a fresh worker.
    pub async fn shutdown(&self) {
        let Some(Worker { jobs, handle }) = self.worker.lock().await.take() else {
            return;
        };
        drop(jobs);

        match tokio::task::spawn_blocking(move || handle.join()).await {
            Ok(Ok(())) => info!("Text recognizer shut down"),
            Ok(Err(_)) => warn!("Recognizer worker panicked"),
            Err(e) => warn!("Failed to join recognizer worker: {}", e),
        }
    }

    async fn spawn_worker(&self) -> Result<Worker, OcrError> {
        let factory = Arc::clone(&self.factory);
        let (ready_tx, ready_rx) = oneshot::channel();
        let (jobs, mut queue) = mpsc::channel::<Job>(QUEUE_DEPTH);

        let handle = thread::Builder::new()
            .name("invscan-ocr".to_string())
            .spawn(move || {
                let mut recognizer = match factory.create() {
                    Ok(r) => {
                        let _ = ready_tx.send(Ok(()));
                        r
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                while let Some(job) = queue.blocking_recv() {
                    let result = recognizer.recognize(&job.image);
                    let _ = job.reply.send(result);
                }
                debug!("Recognizer worker drained its queue");
            })
            .map_err(|e| OcrError::Unavailable(format!("failed to spawn worker: {}", e)))?;

        match ready_rx.await {
            Ok(Ok(())) => Ok(Worker { jobs, handle }),
            Ok(Err(e)) => {
                warn!("Text recognizer failed to initialize: {}", e);
                Err(unavailable(e))
            }
            Err(_) => Err(OcrError::Unavailable(
                "recognizer worker exited during start-up".to_string(),
            )),
        }
    }
}

fn unavailable(e: OcrError) -> OcrError {
    match e {
        OcrError::Unavailable(_) => e,
        other => OcrError::Unavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingFactory {
        created: Arc<AtomicUsize>,
        fail: bool,
    }

    struct EchoRecognizer {
        calls: usize,
    }

    impl TextRecognizer for EchoRecognizer {
        fn recognize(&mut self, image: &DynamicImage) -> Result<Recognition, OcrError> {
            self.calls += 1;
            if image.width() == 0 {
                return Err(OcrError::Recognition("empty image".to_string()));
            }
            Ok(Recognition {
                text: format!("call {} {}x{}", self.calls, image.width(), image.height()),
                confidence: 0.9,
                processing_time_ms: 1,
            })
        }
    }

    impl RecognizerFactory for CountingFactory {
        type Recognizer = EchoRecognizer;

        fn create(&self) -> Result<EchoRecognizer, OcrError> {
            self.created.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(OcrError::ModelLoad("det.onnx not found".to_string()));
            }
            Ok(EchoRecognizer { calls: 0 })
        }
    }

    fn image() -> DynamicImage {
        DynamicImage::new_luma8(4, 2)
    }

    #[tokio::test]
    async fn test_lazy_single_initialization() {
        let factory = CountingFactory::default();
        let created = Arc::clone(&factory.created);
        let adapter = RecognizerAdapter::new(factory);

        assert!(!adapter.is_initialized().await);
        assert_eq!(created.load(Ordering::SeqCst), 0);

        adapter.initialize().await.unwrap();
        adapter.initialize().await.unwrap();
        let result = adapter.recognize(image()).await.unwrap();

        assert_eq!(result.text, "call 1 4x2");
        assert_eq!(created.load(Ordering::SeqCst), 1);
        adapter.shutdown().await;
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_worker() {
        let factory = CountingFactory::default();
        let created = Arc::clone(&factory.created);
        let adapter = Arc::new(RecognizerAdapter::new(factory));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let adapter = Arc::clone(&adapter);
            tasks.spawn(async move { adapter.recognize(image()).await });
        }

        let mut texts = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            texts.push(joined.unwrap().unwrap().text);
        }
        texts.sort();

        let expected: Vec<String> = {
            let mut v: Vec<String> = (1..=8).map(|n| format!("call {} 4x2", n)).collect();
            v.sort();
            v
        };
        assert_eq!(texts, expected);
        assert_eq!(created.load(Ordering::SeqCst), 1);
        adapter.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_releases_and_reinitializes() {
        let factory = CountingFactory::default();
        let created = Arc::clone(&factory.created);
        let adapter = RecognizerAdapter::new(factory);

        adapter.recognize(image()).await.unwrap();
        adapter.shutdown().await;
        adapter.shutdown().await;
        assert!(!adapter.is_initialized().await);

        let result = adapter.recognize(image()).await.unwrap();
        assert_eq!(result.text, "call 1 4x2");
        assert_eq!(created.load(Ordering::SeqCst), 2);
        adapter.shutdown().await;
    }

    #[tokio::test]
    async fn test_failures_surface_as_unavailable() {
        let adapter = RecognizerAdapter::new(CountingFactory {
            fail: true,
            ..Default::default()
        });

        let err = adapter.recognize(image()).await.unwrap_err();
        assert!(matches!(err, OcrError::Unavailable(msg) if msg.contains("det.onnx")));
        assert!(!adapter.is_initialized().await);

        let adapter = RecognizerAdapter::new(CountingFactory::default());
        let err = adapter.recognize(DynamicImage::new_luma8(0, 0)).await.unwrap_err();
        assert!(matches!(err, OcrError::Unavailable(_)));
        adapter.shutdown().await;
    }
}
