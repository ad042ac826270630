//! `FileBrowser`: the surface a UI or service layer talks to. Navigation,
//! uploads with a live read model, and single-entry operations.

use bytes::Bytes;
use cloudnav_dav::paths::{canonical_path, join_path, parent_path, sanitize_file_name};
use cloudnav_dav::{DavClient, DavConfig, DavError, DavResult, DavTransport, Listing};
use cloudnav_transfer::{
    BatchHandle, BatchId, BatchSnapshot, LocalFile, RefreshScheduler, TaskId, TaskRegistry,
    TransferEvent, TransferTask, UploadOrchestrator,
};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::navigator::{BrowserEvent, Navigator};

pub struct FileBrowser {
    transport: Arc<dyn DavTransport>,
    navigator: Navigator,
    orchestrator: UploadOrchestrator,
}

impl FileBrowser {
    /// Browse through any transport whose identifiers start with `storage_root`.
    pub fn new(transport: Arc<dyn DavTransport>, storage_root: &str) -> Self {
        let navigator = Navigator::new(transport.clone(), storage_root);
        let orchestrator = UploadOrchestrator::new(transport.clone(), Arc::new(TaskRegistry::new()))
            .with_refresher(Arc::new(navigator.clone()));
        Self {
            transport,
            navigator,
            orchestrator,
        }
    }

    /// Browse a WebDAV server with the reqwest client.
    pub fn connect(config: &DavConfig) -> DavResult<Self> {
        let client = DavClient::new(config)?;
        info!(
            "connecting to {} as {} ({})",
            client.base_url(),
            config.username,
            config.masked_credential()
        );
        let root = client.storage_root().to_string();
        Ok(Self::new(Arc::new(client), &root))
    }

    pub fn from_app_config(config: &AppConfig) -> DavResult<Self> {
        Self::connect(&config.dav)
    }

    // ── Navigation ───────────────────────────────────────────────────────

    /// Listing of `path`; failures are also published as `ListingFailed`.
    pub async fn list_directory(&self, path: &str) -> DavResult<Listing> {
        self.navigator.list(path).await
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<BrowserEvent> {
        self.navigator.subscribe()
    }

    // ── Uploads ──────────────────────────────────────────────────────────

    pub fn submit_upload_batch(&self, files: Vec<LocalFile>, target_directory: &str) -> DavResult<BatchHandle> {
        self.orchestrator.submit(files, target_directory)
    }

    /// Read local files from disk and submit them as one batch.
    pub async fn upload_paths(&self, paths: &[PathBuf], target_directory: &str) -> DavResult<BatchHandle> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            files.push(LocalFile::from_path(path).await?);
        }
        self.submit_upload_batch(files, target_directory)
    }

    pub fn cancel_upload(&self, task_id: TaskId) -> DavResult<TransferTask> {
        self.orchestrator.cancel(task_id)
    }

    pub fn cancel_batch(&self, batch_id: BatchId) -> DavResult<Vec<TaskId>> {
        self.orchestrator.cancel_batch(batch_id)
    }

    pub fn dismiss_batch(&self, batch_id: BatchId) -> DavResult<Vec<TransferTask>> {
        self.orchestrator.dismiss_batch(batch_id)
    }

    pub async fn wait_for_batch(&self, batch_id: BatchId) -> DavResult<BatchSnapshot> {
        self.orchestrator.wait_for_batch(batch_id).await
    }

    pub fn transfers(&self) -> Vec<TransferTask> {
        self.orchestrator.registry().tasks()
    }

    pub fn transfer(&self, task_id: TaskId) -> Option<TransferTask> {
        self.orchestrator.registry().task(task_id)
    }

    pub fn batch(&self, batch_id: BatchId) -> Option<BatchSnapshot> {
        self.orchestrator.registry().batch(batch_id)
    }

    pub fn batches(&self) -> Vec<BatchSnapshot> {
        self.orchestrator.registry().batches()
    }

    pub fn subscribe_transfers(&self) -> broadcast::Receiver<TransferEvent> {
        self.orchestrator.registry().subscribe()
    }

    // ── Single-entry operations ──────────────────────────────────────────

    /// Create `name` (sanitized) under `parent`; returns the new path.
    pub async fn create_directory(&self, parent: &str, name: &str) -> DavResult<String> {
        if name.trim().is_empty() {
            return Err(DavError::invalid_request("folder name is required"));
        }
        let parent = canonical_path(parent);
        let path = join_path(&parent, &sanitize_file_name(name.trim()));
        self.transport.create_directory(&path).await?;
        info!("created folder {}", path);
        self.navigator.schedule_refresh(&parent);
        Ok(path)
    }

    pub async fn delete_entry(&self, path: &str) -> DavResult<()> {
        let path = require_entry_path(path)?;
        self.transport.delete_entry(&path).await?;
        info!("deleted {}", path);
        self.navigator.schedule_refresh(&parent_path(&path));
        Ok(())
    }

    pub async fn download(&self, path: &str) -> DavResult<Bytes> {
        let path = require_entry_path(path)?;
        self.transport.download(&path).await
    }

    /// Number of entries at the root when the store is reachable.
    pub async fn test_connection(&self) -> DavResult<usize> {
        self.transport.probe().await
    }
}

/// Canonical path of an entry; the root itself is never a valid target.
fn require_entry_path(path: &str) -> DavResult<String> {
    let path = canonical_path(path);
    if path == "/" {
        return Err(DavError::invalid_request("a file or folder path is required"));
    }
    Ok(path)
}
