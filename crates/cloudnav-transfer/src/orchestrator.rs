//! Upload Orchestrator: one tokio task per selected file, each racing the
//! transport upload against its progress channel and its cancellation token.
//!
//! Uploads of a batch run concurrently without a cap. Progress resolves tasks
//! by `TaskId`. Success schedules a refresh of the target directory; failure
//! settles the task as `Error` and is never retried.

use bytes::Bytes;
use cloudnav_dav::paths::{canonical_path, join_path, sanitize_file_name};
use cloudnav_dav::{progress_channel, DavError, DavResult, DavTransport};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::registry::TaskRegistry;
use crate::types::*;

/// Re-fetches a directory after a successful upload. Fire-and-forget:
/// implementations spawn their own work and report failures elsewhere.
pub trait RefreshScheduler: Send + Sync {
    fn schedule_refresh(&self, directory: &str);
}

type TokenMap = Arc<Mutex<HashMap<TaskId, CancellationToken>>>;

/// Held by each driver of a batch; dropping it counts the driver as done,
/// including when the driver panics or is aborted.
struct RunningDriver(Arc<watch::Sender<usize>>);

impl Drop for RunningDriver {
    fn drop(&mut self) {
        self.0.send_modify(|running| *running = running.saturating_sub(1));
    }
}

/// Drives uploads against a transport and records them in a registry.
pub struct UploadOrchestrator {
    transport: Arc<dyn DavTransport>,
    registry: Arc<TaskRegistry>,
    refresher: Option<Arc<dyn RefreshScheduler>>,
    tokens: TokenMap,
    /// Number of drivers still running, per batch.
    drivers: Mutex<HashMap<BatchId, watch::Receiver<usize>>>,
}

impl UploadOrchestrator {
    pub fn new(transport: Arc<dyn DavTransport>, registry: Arc<TaskRegistry>) -> Self {
        Self {
            transport,
            registry,
            refresher: None,
            tokens: Arc::new(Mutex::new(HashMap::new())),
            drivers: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn RefreshScheduler>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    /// Accept `files` for upload into `target_directory` and start every
    /// transfer. Fails without registering anything when called outside a
    /// tokio runtime.
    pub fn submit(&self, files: Vec<LocalFile>, target_directory: &str) -> DavResult<BatchHandle> {
        if files.is_empty() {
            return Err(DavError::invalid_request("no files selected for upload"));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| DavError::internal("no tokio runtime"))?;
        let target = canonical_path(target_directory);

        let specs: Vec<NewTask> = files
            .iter()
            .map(|f| {
                let file_name = sanitize_file_name(&f.name);
                NewTask {
                    source_name: f.name.clone(),
                    destination_path: join_path(&target, &file_name),
                    file_name,
                    total_bytes: f.size(),
                }
            })
            .collect();
        let destinations: Vec<String> = specs.iter().map(|s| s.destination_path.clone()).collect();

        let handle = self.registry.create_batch(&target, specs);
        info!(
            "upload batch {}: {} file(s) → {}",
            handle.batch_id,
            handle.task_ids.len(),
            target
        );

        let (running, watcher) = watch::channel(files.len());
        let running = Arc::new(running);
        for ((task_id, file), destination) in handle.task_ids.iter().zip(files).zip(destinations) {
            let token = CancellationToken::new();
            lock(&self.tokens).insert(*task_id, token.clone());

            let driver = Driver {
                task_id: *task_id,
                destination,
                target: target.clone(),
                transport: self.transport.clone(),
                registry: self.registry.clone(),
                refresher: self.refresher.clone(),
                tokens: self.tokens.clone(),
                _running: RunningDriver(running.clone()),
            };
            runtime.spawn(driver.run(file.content, token));
        }
        lock(&self.drivers).insert(handle.batch_id, watcher);

        Ok(handle)
    }

    /// Abort one transfer. `InvalidState` when it already settled.
    pub fn cancel(&self, task_id: TaskId) -> DavResult<TransferTask> {
        let task = self.registry.cancel(task_id)?;
        if let Some(token) = lock(&self.tokens).remove(&task_id) {
            token.cancel();
        }
        info!("transfer {} ({}) cancelled", task_id, task.file_name);
        Ok(task)
    }

    /// Abort every unsettled transfer of a batch; returns the cancelled ids.
    pub fn cancel_batch(&self, batch_id: BatchId) -> DavResult<Vec<TaskId>> {
        let tasks = self.registry.batch_tasks(batch_id)?;
        let mut cancelled = Vec::new();
        for task in tasks.iter().filter(|t| !t.is_terminal()) {
            match self.cancel(task.id) {
                Ok(_) => cancelled.push(task.id),
                // Settled between the snapshot and the cancel.
                Err(e) => debug!("cancel_batch {}: {}", batch_id, e),
            }
        }
        Ok(cancelled)
    }

    /// Wait until every transfer of the batch has settled and its driver has
    /// exited. Any number of callers may wait on the same batch.
    pub async fn wait_for_batch(&self, batch_id: BatchId) -> DavResult<BatchSnapshot> {
        let watcher = lock(&self.drivers).get(&batch_id).cloned();
        if let Some(mut watcher) = watcher {
            if let Err(e) = watcher.wait_for(|running| *running == 0).await {
                debug!("driver count for batch {} closed: {}", batch_id, e);
            }
        }
        self.registry
            .batch(batch_id)
            .ok_or_else(|| DavError::not_found(format!("batch {} not found", batch_id)))
    }

    /// Forget a settled batch.
    pub fn dismiss_batch(&self, batch_id: BatchId) -> DavResult<Vec<TransferTask>> {
        let removed = self.registry.dismiss_batch(batch_id)?;
        lock(&self.drivers).remove(&batch_id);
        Ok(removed)
    }
}

/// Everything one upload task needs, moved into its tokio task.
struct Driver {
    task_id: TaskId,
    destination: String,
    target: String,
    transport: Arc<dyn DavTransport>,
    registry: Arc<TaskRegistry>,
    refresher: Option<Arc<dyn RefreshScheduler>>,
    tokens: TokenMap,
    _running: RunningDriver,
}

impl Driver {
    async fn run(self, content: Bytes, token: CancellationToken) {
        let outcome = self.transfer(content, &token).await;
        lock(&self.tokens).remove(&self.task_id);

        let Some(result) = outcome else {
            debug!("transfer {} aborted: {}", self.task_id, self.destination);
            return;
        };

        match result {
            Ok(()) => {
                if let Ok(ProgressOutcome::Applied) = self.registry.complete(self.task_id) {
                    info!("uploaded {}", self.destination);
                    if let Some(refresher) = &self.refresher {
                        refresher.schedule_refresh(&self.target);
                    }
                }
            }
            Err(e) => {
                warn!("upload of {} failed: {}", self.destination, e);
                if let Err(err) = self.registry.fail(self.task_id, e.to_string()) {
                    debug!("failure of {} not recorded: {}", self.task_id, err);
                }
            }
        }
    }

    /// `None` when cancelled; the upload future is dropped, which aborts it.
    async fn transfer(&self, content: Bytes, token: &CancellationToken) -> Option<DavResult<()>> {
        let (tx, mut rx) = progress_channel();
        let upload = self.transport.upload(&self.destination, content, tx);
        tokio::pin!(upload);

        let mut progress_open = true;
        let result = loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => return None,
                sample = rx.recv(), if progress_open => match sample {
                    Some(sent) => self.apply(sent),
                    None => progress_open = false,
                },
                res = &mut upload => break res,
            }
        };

        // Samples queued before the upload resolved, still in order.
        while let Ok(sent) = rx.try_recv() {
            self.apply(sent);
        }
        if token.is_cancelled() {
            return None;
        }
        Some(result)
    }

    fn apply(&self, sent: u64) {
        if let Err(e) = self.registry.record_progress(self.task_id, sent) {
            debug!("progress for {}: {}", self.task_id, e);
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
