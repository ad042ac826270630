//! Navigator: fetches a directory through the transport, normalizes it and
//! reports the outcome on the browser event channel. Also the refresh target
//! of the upload orchestrator.

use cloudnav_dav::paths::canonical_path;
use cloudnav_dav::{DavError, DavResult, DavTransport, Entry, Listing, ListingNormalizer};
use cloudnav_transfer::RefreshScheduler;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

pub const EVENT_CAPACITY: usize = 64;

/// Outcome of a listing fetch, whether user-driven or a refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BrowserEvent {
    ListingLoaded { path: String, entries: Vec<Entry> },
    ListingFailed { path: String, error: DavError },
}

#[derive(Clone)]
pub struct Navigator {
    transport: Arc<dyn DavTransport>,
    normalizer: ListingNormalizer,
    events: broadcast::Sender<BrowserEvent>,
}

impl Navigator {
    pub fn new(transport: Arc<dyn DavTransport>, storage_root: &str) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            transport,
            normalizer: ListingNormalizer::new(storage_root),
            events,
        }
    }

    pub fn normalizer(&self) -> &ListingNormalizer {
        &self.normalizer
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BrowserEvent> {
        self.events.subscribe()
    }

    /// Fetch and normalize `path` (relative to the browsing root).
    pub async fn list(&self, path: &str) -> DavResult<Listing> {
        let path = canonical_path(path);
        let result = match self.transport.fetch_directory(&path).await {
            Ok(raw) => self.normalizer.normalize(&raw, &path),
            Err(e) => Err(e),
        };

        match result {
            Ok(entries) => {
                debug!("listed {} ({} entries)", path, entries.len());
                let _ = self.events.send(BrowserEvent::ListingLoaded {
                    path: path.clone(),
                    entries: entries.clone(),
                });
                Ok(Listing { path, entries })
            }
            Err(error) => {
                warn!("listing {} failed: {}", path, error);
                let _ = self.events.send(BrowserEvent::ListingFailed {
                    path,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }
}

impl RefreshScheduler for Navigator {
    fn schedule_refresh(&self, directory: &str) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no runtime to refresh {}", directory);
            return;
        };
        let nav = self.clone();
        let directory = directory.to_string();
        // Errors are already published as ListingFailed.
        runtime.spawn(async move {
            let _ = nav.list(&directory).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use cloudnav_dav::{DavErrorKind, ProgressSender, RawListing};

    struct Fixed(DavResult<RawListing>);

    #[async_trait]
    impl DavTransport for Fixed {
        async fn fetch_directory(&self, _path: &str) -> DavResult<RawListing> {
            self.0.clone()
        }
        async fn upload(&self, _d: &str, _c: Bytes, _p: ProgressSender) -> DavResult<()> {
            Ok(())
        }
        async fn create_directory(&self, _path: &str) -> DavResult<()> {
            Ok(())
        }
        async fn delete_entry(&self, _path: &str) -> DavResult<()> {
            Ok(())
        }
        async fn download(&self, _path: &str) -> DavResult<Bytes> {
            Ok(Bytes::new())
        }
        async fn probe(&self) -> DavResult<usize> {
            Ok(0)
        }
    }

    const LISTING: &str = r#"[
        {"filename":"/root/docs","type":"directory"},
        {"filename":"/root/docs/a.txt","type":"file","size":3}
    ]"#;

    #[tokio::test]
    async fn list_publishes_loaded_event() {
        let nav = Navigator::new(
            Arc::new(Fixed(Ok(RawListing::Structured(LISTING.into())))),
            "/root",
        );
        let mut rx = nav.subscribe();
        let listing = nav.list("docs/").await.unwrap();
        assert_eq!(listing.path, "/docs");
        assert_eq!(listing.entries.len(), 1);

        match rx.recv().await.unwrap() {
            BrowserEvent::ListingLoaded { path, entries } => {
                assert_eq!(path, "/docs");
                assert_eq!(entries[0].path, "/docs/a.txt");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn failures_publish_failed_event() {
        let nav = Navigator::new(Arc::new(Fixed(Err(DavError::unreachable("down")))), "/root");
        let mut rx = nav.subscribe();
        let err = nav.list("/").await.unwrap_err();
        assert!(err.is(DavErrorKind::TransportUnreachable));
        assert!(matches!(rx.recv().await.unwrap(), BrowserEvent::ListingFailed { .. }));

        let bad = Navigator::new(Arc::new(Fixed(Ok(RawListing::Multistatus("<x/>".into())))), "/root");
        assert!(bad.list("/").await.unwrap_err().is(DavErrorKind::MalformedResponse));
    }

    #[tokio::test]
    async fn scheduled_refresh_reports_on_event_channel() {
        let nav = Navigator::new(
            Arc::new(Fixed(Ok(RawListing::Structured(LISTING.into())))),
            "/root",
        );
        let mut rx = nav.subscribe();
        nav.schedule_refresh("/docs");
        let ev = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(ev, BrowserEvent::ListingLoaded { ref path, .. } if path == "/docs"));
    }
}
