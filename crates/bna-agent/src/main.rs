//! BNA voice agent binary. Registers the entrypoint and prewarm hooks
//! with the worker runtime and hands control to its CLI entry point.

use bna_agent::{entrypoint, prewarm};
use bna_worker::{run_app, WorkerOptions};

#[tokio::main]
async fn main() {
    run_app(WorkerOptions::new(entrypoint, prewarm))
        .await
        .expect("worker exited with an error; check configuration and credentials");
}
