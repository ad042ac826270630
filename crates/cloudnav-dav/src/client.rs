// ──────────────────────────────────────────────────────────────────────────────
// cloudnav-dav · client
// ──────────────────────────────────────────────────────────────────────────────
// reqwest-backed `DavTransport`:
//  • PROPFIND (depth 1) listings
//  • Streamed PUT uploads with progress
//  • MKCOL, DELETE, GET
//  • Status → error-kind mapping (no automatic retries)
// ──────────────────────────────────────────────────────────────────────────────

use crate::config::DavConfig;
use crate::error::{DavError, DavResult};
use crate::listing::{guess_mime, ListingNormalizer};
use crate::paths::{encode_dav_path, last_segment};
use crate::transport::{DavTransport, ProgressSender};
use crate::types::RawListing;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use log::debug;
use reqwest::{header, Body, Client, Method, RequestBuilder, Response, StatusCode};
use std::time::Duration;

/// Size of the slices an upload body is streamed in.
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// PROPFIND body requesting the properties the normalizer reads.
pub const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:propfind xmlns:d="DAV:">
  <d:prop>
    <d:displayname/>
    <d:getcontentlength/>
    <d:getcontenttype/>
    <d:getetag/>
    <d:getlastmodified/>
    <d:resourcetype/>
  </d:prop>
</d:propfind>"#;

/// WebDAV client for one account.
#[derive(Debug, Clone)]
pub struct DavClient {
    http: Client,
    /// Server root without trailing slash.
    base_url: String,
    username: String,
    password: String,
    bearer_token: Option<String>,
    /// Canonical storage root, e.g. `/remote.php/dav/files/alice`.
    storage_root: String,
    timeout: Option<Duration>,
}

impl DavClient {
    // ── Constructors ─────────────────────────────────────────────────────

    pub fn new(config: &DavConfig) -> DavResult<Self> {
        config.validate()?;
        let timeout = (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs));
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.connect_timeout(t);
        }
        let http = builder
            .build()
            .map_err(|e| DavError::internal(format!("build HTTP client: {}", e)))?;
        Ok(Self::with_http(config, http))
    }

    /// Use a caller-supplied reqwest client (shared pools, custom TLS).
    pub fn with_http(config: &DavConfig, http: Client) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.app_password.clone(),
            bearer_token: config.bearer_token.clone().filter(|t| !t.is_empty()),
            storage_root: config.storage_root(),
            timeout: (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn storage_root(&self) -> &str {
        &self.storage_root
    }

    /// Normalizer bound to this client's storage root.
    pub fn normalizer(&self) -> ListingNormalizer {
        ListingNormalizer::new(&self.storage_root)
    }

    // ── URL builders ─────────────────────────────────────────────────────

    /// Full URL of a path relative to the browsing root.
    pub fn dav_url(&self, path: &str) -> String {
        let mut url = format!("{}/{}", self.base_url, encode_dav_path(&self.storage_root));
        let rel = encode_dav_path(path);
        if !rel.is_empty() {
            url.push('/');
            url.push_str(&rel);
        }
        url
    }

    // ── Request plumbing ─────────────────────────────────────────────────

    fn apply_auth(&self, req: RequestBuilder) -> RequestBuilder {
        if let Some(ref tok) = self.bearer_token {
            req.bearer_auth(tok)
        } else {
            req.basic_auth(&self.username, Some(&self.password))
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.dav_url(path);
        debug!("{} {}", method, url);
        self.apply_auth(self.http.request(method, &url))
    }

    /// Request bounded by the configured timeout. Uploads are not, since
    /// their duration scales with the body.
    fn timed_request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.request(method, path);
        match self.timeout {
            Some(t) => req.timeout(t),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> DavResult<Response> {
        Ok(req.send().await?)
    }

    // ── WebDAV methods ───────────────────────────────────────────────────

    /// PROPFIND depth 1, returning the raw multistatus body.
    pub async fn propfind(&self, path: &str) -> DavResult<String> {
        let req = self
            .timed_request(dav_method(b"PROPFIND")?, path)
            .header("Depth", "1")
            .header(header::CONTENT_TYPE, "application/xml; charset=utf-8")
            .body(PROPFIND_BODY);
        let resp = self.send(req).await?;
        let status = resp.status();
        if status == StatusCode::MULTI_STATUS || status.is_success() {
            Ok(resp.text().await?)
        } else {
            Err(DavError::from_status(status.as_u16(), &format!("PROPFIND {}", path)))
        }
    }

    /// Streamed PUT. Each 64 KiB slice handed to the connection pushes the
    /// cumulative byte count into `progress`.
    pub async fn put(&self, destination: &str, content: Bytes, progress: ProgressSender) -> DavResult<()> {
        let total = content.len();
        let chunks: Vec<Bytes> = (0..total)
            .step_by(UPLOAD_CHUNK_SIZE)
            .map(|start| content.slice(start..(start + UPLOAD_CHUNK_SIZE).min(total)))
            .collect();

        let mut sent = 0u64;
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            // A closed receiver means nobody is watching; the upload goes on.
            let _ = progress.send(sent);
            Ok::<Bytes, std::io::Error>(chunk)
        });

        let req = self
            .request(Method::PUT, destination)
            .header(header::CONTENT_TYPE, guess_mime(last_segment(destination)))
            .header(header::CONTENT_LENGTH, total)
            .body(Body::wrap_stream(stream));

        let resp = self.send(req).await?;
        let status = resp.status();
        match status.as_u16() {
            200 | 201 | 204 => Ok(()),
            401 | 403 => Err(DavError::from_status(status.as_u16(), &format!("PUT {}", destination))),
            code => {
                let text = resp.text().await.unwrap_or_default();
                Err(DavError::transfer_failed(format!(
                    "PUT {} → HTTP {}{}",
                    destination,
                    code,
                    snippet(&text)
                ))
                .with_status(code))
            }
        }
    }

    /// MKCOL. `405 Method Not Allowed` means the collection already exists.
    pub async fn mkcol(&self, path: &str) -> DavResult<()> {
        let resp = self.send(self.timed_request(dav_method(b"MKCOL")?, path)).await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else if status == StatusCode::METHOD_NOT_ALLOWED {
            debug!("MKCOL {}: already exists", path);
            Ok(())
        } else {
            Err(DavError::from_status(status.as_u16(), &format!("MKCOL {}", path)))
        }
    }

    pub async fn delete(&self, path: &str) -> DavResult<()> {
        let resp = self.send(self.timed_request(Method::DELETE, path)).await?;
        check_success(resp, &format!("DELETE {}", path)).await.map(|_| ())
    }

    pub async fn get(&self, path: &str) -> DavResult<Bytes> {
        let resp = self.send(self.timed_request(Method::GET, path)).await?;
        let resp = check_success(resp, &format!("GET {}", path)).await?;
        Ok(resp.bytes().await?)
    }
}

#[async_trait]
impl DavTransport for DavClient {
    async fn fetch_directory(&self, path: &str) -> DavResult<RawListing> {
        self.propfind(path).await.map(RawListing::Multistatus)
    }

    async fn upload(&self, destination: &str, content: Bytes, progress: ProgressSender) -> DavResult<()> {
        self.put(destination, content, progress).await
    }

    async fn create_directory(&self, path: &str) -> DavResult<()> {
        self.mkcol(path).await
    }

    async fn delete_entry(&self, path: &str) -> DavResult<()> {
        self.delete(path).await
    }

    async fn download(&self, path: &str) -> DavResult<Bytes> {
        self.get(path).await
    }

    async fn probe(&self) -> DavResult<usize> {
        let raw = self.fetch_directory("/").await?;
        Ok(self.normalizer().normalize(&raw, "/")?.len())
    }
}

// ── Free-standing helpers ────────────────────────────────────────────────────

fn dav_method(name: &[u8]) -> DavResult<Method> {
    Method::from_bytes(name).map_err(|e| DavError::internal(format!("HTTP method: {}", e)))
}

async fn check_success(resp: Response, context: &str) -> DavResult<Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(DavError::from_status(status.as_u16(), context))
    }
}

/// First part of an error body, for messages.
fn snippet(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let cut: String = trimmed.chars().take(200).collect();
    format!(": {}", cut)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DavErrorKind;
    use crate::transport::progress_channel;

    fn config(base: &str) -> DavConfig {
        DavConfig::new(base, "alice", "app-password")
    }

    #[test]
    fn dav_url_encodes_segments() {
        let client = DavClient::new(&config("https://cloud.test/")).unwrap();
        assert_eq!(client.dav_url("/"), "https://cloud.test/remote.php/dav/files/alice");
        assert_eq!(
            client.dav_url("/My Docs/a#1.txt"),
            "https://cloud.test/remote.php/dav/files/alice/My%20Docs/a%231.txt"
        );
    }

    #[test]
    fn custom_webdav_path_is_used() {
        let mut cfg = config("https://cloud.test");
        cfg.webdav_path = "/dav/files/team/".into();
        let client = DavClient::new(&cfg).unwrap();
        assert_eq!(client.storage_root(), "/dav/files/team");
        assert_eq!(client.dav_url("x"), "https://cloud.test/dav/files/team/x");
        assert_eq!(client.normalizer().storage_root(), "/dav/files/team");
    }

    #[test]
    fn new_rejects_invalid_config() {
        let err = DavClient::new(&config("")).unwrap_err();
        assert!(err.is(DavErrorKind::InvalidConfig));
    }

    #[test]
    fn propfind_body_requests_listing_properties() {
        for prop in ["resourcetype", "getcontentlength", "getcontenttype", "getlastmodified", "displayname"] {
            assert!(PROPFIND_BODY.contains(prop), "missing {}", prop);
        }
    }

    #[test]
    fn snippet_truncates() {
        assert_eq!(snippet("   "), "");
        assert_eq!(snippet("boom"), ": boom");
        assert_eq!(snippet(&"x".repeat(500)).len(), 202);
    }

    #[test]
    fn refused_connection_is_unreachable() {
        // Bind then drop to obtain a port nobody listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = DavClient::new(&config(&format!("http://127.0.0.1:{}", port))).unwrap();

        let err = tokio_test::block_on(client.fetch_directory("/")).unwrap_err();
        assert!(err.is(DavErrorKind::TransportUnreachable), "{}", err);

        let (tx, _rx) = progress_channel();
        let err = tokio_test::block_on(client.upload("/a.txt", Bytes::from_static(b"abc"), tx)).unwrap_err();
        assert!(err.is(DavErrorKind::TransportUnreachable), "{}", err);
    }
}
