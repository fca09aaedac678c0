//! Worker runtime for the BNA voice agent.
//!
//! Registers the two application hooks (a prewarm function that loads
//! process-wide resources before any job is accepted, and an async
//! entrypoint run once per job) and drives the job lifecycle: prewarm,
//! dispatch, and graceful shutdown on SIGINT/SIGTERM. The CLI entry
//! (`run_app`) resolves configuration, loads the local env file, and
//! initialises tracing before handing control to the worker.

pub mod cli;
pub mod config;
pub mod error;
pub mod job;
pub mod worker;

pub use cli::run_app;
pub use config::{load_config, ConfigError, JobDispatchConfig, LoggingConfig, WorkerConfig};
pub use error::WorkerError;
pub use job::{JobContext, PrewarmedResources};
pub use worker::{Worker, WorkerOptions};
