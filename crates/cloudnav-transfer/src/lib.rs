//! # cloudnav – transfers
//!
//! Concurrent, cancellable uploads with live progress:
//!
//! - **Progress** — throughput / ETA estimation and human formatting
//! - **Types** — task and batch ids, the task state machine, snapshots, events
//! - **Registry** — owner of every task and batch, broadcast of changes
//! - **Orchestrator** — one tokio task per file, cancellation, post-upload refresh

pub mod progress;
pub mod types;
pub mod registry;
pub mod orchestrator;

pub use orchestrator::{RefreshScheduler, UploadOrchestrator};
pub use registry::TaskRegistry;
pub use types::{
    BatchHandle, BatchId, BatchSnapshot, LocalFile, ProgressOutcome, TaskId, TaskState,
    TransferEvent, TransferTask,
};
