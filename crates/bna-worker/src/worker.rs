//! The worker run loop.
//!
//! A worker owns the two registered hooks. On `run` it prewarms exactly
//! once, dispatches a job per served room, and then waits for SIGINT or
//! SIGTERM. A failing job terminates only that job; a failing prewarm
//! terminates the worker, since no job can run without the prewarmed
//! resources.

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::job::{JobContext, PrewarmedResources};
use bna_voice::{LiveKitConfig, LiveKitRoom, RoomTransport};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// The prewarm hook: runs once per process, before any job is accepted.
pub type PrewarmFn = Arc<dyn Fn() -> Result<PrewarmedResources, WorkerError> + Send + Sync>;

/// The per-job entrypoint hook.
pub type EntrypointFn = Arc<
    dyn Fn(JobContext) -> Pin<Box<dyn Future<Output = Result<(), WorkerError>> + Send>>
        + Send
        + Sync,
>;

/// The two hooks an application registers with the worker runtime.
#[derive(Clone)]
pub struct WorkerOptions {
    pub entrypoint_fnc: EntrypointFn,
    pub prewarm_fnc: PrewarmFn,
}

impl WorkerOptions {
    pub fn new<E, Fut, P>(entrypoint: E, prewarm: P) -> Self
    where
        E: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), WorkerError>> + Send + 'static,
        P: Fn() -> Result<PrewarmedResources, WorkerError> + Send + Sync + 'static,
    {
        Self {
            entrypoint_fnc: Arc::new(move |ctx| Box::pin(entrypoint(ctx))),
            prewarm_fnc: Arc::new(prewarm),
        }
    }
}

/// Drives prewarm, job dispatch, and shutdown for one worker process.
pub struct Worker {
    config: WorkerConfig,
    livekit: LiveKitConfig,
    options: WorkerOptions,
}

impl Worker {
    pub fn new(config: WorkerConfig, livekit: LiveKitConfig, options: WorkerOptions) -> Self {
        Self {
            config,
            livekit,
            options,
        }
    }

    /// Spawns the entrypoint for one job. Job failures are logged and end
    /// the job; they never take the worker down.
    pub fn dispatch(
        &self,
        room: Arc<dyn RoomTransport>,
        resources: Arc<PrewarmedResources>,
    ) -> JoinHandle<()> {
        let entrypoint = self.options.entrypoint_fnc.clone();
        let room_name = room.room_name().to_string();
        let ctx = JobContext::new(room, resources);

        tokio::spawn(async move {
            tracing::info!(room = %room_name, "job dispatched");
            match entrypoint(ctx).await {
                Ok(()) => tracing::info!(room = %room_name, "job finished"),
                Err(e) => tracing::error!(room = %room_name, error = %e, "job failed"),
            }
        })
    }

    /// Runs the worker until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns the prewarm error when the prewarm hook fails; no jobs are
    /// dispatched in that case.
    pub async fn run(&self) -> Result<(), WorkerError> {
        tracing::info!(room = %self.config.worker.room, "worker starting");

        // Prewarm strictly precedes job dispatch.
        let resources = Arc::new((self.options.prewarm_fnc)()?);
        tracing::info!("prewarm complete");

        let room: Arc<dyn RoomTransport> = Arc::new(LiveKitRoom::new(
            self.livekit.clone(),
            &self.config.worker.room,
        ));
        let job = self.dispatch(room, resources);

        shutdown_signal().await;

        job.abort();
        tracing::info!("worker shut down");
        Ok(())
    }
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
