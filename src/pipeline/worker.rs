use std::sync::Arc;
use std::thread;

use image::DynamicImage;
use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, Result};

/// One model's inference step. Implementors stay on the worker thread that built them.
pub trait Stage {
    type Output: Send + 'static;

    fn infer(&mut self, image: &DynamicImage) -> Result<Self::Output>;
}

type Reply<O> = oneshot::Sender<Result<O>>;
type Job<O> = (Arc<DynamicImage>, Reply<O>);

/// Runs a [`Stage`] on a dedicated thread and serves requests from async code.
/// The thread exits once the worker is dropped.
pub struct ModelWorker<O> {
    name: &'static str,
    job_tx: mpsc::Sender<Job<O>>,
}

impl<O: Send + 'static> ModelWorker<O> {
    const MAX_QUEUED_JOBS: usize = 4;

    /// Builds the stage on the new thread and waits until it is ready.
    pub async fn spawn<S, F>(name: &'static str, build: F) -> Result<Self>
    where
        S: Stage<Output = O>,
        F: FnOnce() -> Result<S> + Send + 'static,
    {
        let (job_tx, mut job_rx) = mpsc::channel::<Job<O>>(Self::MAX_QUEUED_JOBS);
        let (ready_tx, ready_rx) = oneshot::channel::<Result<()>>();

        thread::Builder::new().name(name.to_string()).spawn(move || {
            let mut stage = match build() {
                Ok(stage) => {
                    let _ = ready_tx.send(Ok(()));
                    stage
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                    return;
                }
            };
            tracing::debug!(name, "model worker ready");
            while let Some((image, reply)) = job_rx.blocking_recv() {
                let _ = reply.send(stage.infer(&image));
            }
            tracing::debug!(name, "model worker stopped");
        })?;

        ready_rx
            .await
            .map_err(|_| Error::Worker(format!("{name} worker exited during startup")))??;
        Ok(Self { name, job_tx })
    }

    pub async fn infer(&self, image: Arc<DynamicImage>) -> Result<O> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.job_tx
            .send((image, reply_tx))
            .await
            .map_err(|_| Error::Worker(format!("{} worker is gone", self.name)))?;
        reply_rx
            .await
            .map_err(|_| Error::Worker(format!("{} worker dropped the request", self.name)))?
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}
