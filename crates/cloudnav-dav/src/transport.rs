// ──────────────────────────────────────────────────────────────────────────────
// cloudnav-dav · transport
// ──────────────────────────────────────────────────────────────────────────────
// The boundary between cloudnav and the remote store. `DavClient` is the
// reqwest implementation; tests plug in scripted in-memory ones.
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::DavResult;
use crate::types::RawListing;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

/// Cumulative bytes-sent samples of one upload, delivered in order.
pub type ProgressSender = mpsc::UnboundedSender<u64>;
pub type ProgressReceiver = mpsc::UnboundedReceiver<u64>;

/// Fresh progress channel for one upload.
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

/// Operations cloudnav needs from a remote store. Paths are relative to the
/// browsing root.
#[async_trait]
pub trait DavTransport: Send + Sync {
    /// Depth-1 listing of a directory.
    async fn fetch_directory(&self, path: &str) -> DavResult<RawListing>;

    /// Upload `content` to `destination`, pushing cumulative byte counts into
    /// `progress`. Dropping the returned future aborts the transfer.
    async fn upload(&self, destination: &str, content: Bytes, progress: ProgressSender)
        -> DavResult<()>;

    /// Create a collection. An already existing one counts as success.
    async fn create_directory(&self, path: &str) -> DavResult<()>;

    async fn delete_entry(&self, path: &str) -> DavResult<()>;

    async fn download(&self, path: &str) -> DavResult<Bytes>;

    /// Connectivity check; returns the number of records at the root.
    async fn probe(&self) -> DavResult<usize>;
}
