//! Error type shared by every cloudnav crate.
//!
//! All public API surfaces return `DavResult<T>`. Errors are values: nothing in
//! the core retries on its own, and every error stays local to the operation
//! that produced it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Convenience alias.
pub type DavResult<T> = Result<T, DavError>;

/// Categorised failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DavErrorKind {
    /// A directory listing could not be decoded into entries.
    MalformedResponse,
    /// Network / connection fault (DNS, refused, timeout).
    TransportUnreachable,
    /// A single upload ended in failure.
    TransferFailed,
    /// Operation requested on a task or batch not eligible for it.
    InvalidState,
    /// Remote resource, task or batch does not exist.
    NotFound,
    /// Credentials rejected (HTTP 401 / 403).
    Unauthorized,
    /// Resource already exists (MKCOL 405).
    AlreadyExists,
    /// Parent missing or name collision (HTTP 409).
    Conflict,
    /// Caller supplied an unusable argument.
    InvalidRequest,
    /// Configuration missing or invalid.
    InvalidConfig,
    /// Any other non-success HTTP status.
    Http,
    /// Local I/O failure.
    Io,
    /// Catch-all.
    Internal,
}

impl fmt::Display for DavErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Structured error returned by every fallible public function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DavError {
    pub kind: DavErrorKind,
    pub message: String,
    /// HTTP status that triggered the error, if any.
    pub status: Option<u16>,
}

impl DavError {
    pub fn new(kind: DavErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is(&self, kind: DavErrorKind) -> bool {
        self.kind == kind
    }

    // ── Convenience constructors ─────────────────────────────────

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::new(DavErrorKind::MalformedResponse, msg)
    }

    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::new(DavErrorKind::TransportUnreachable, msg)
    }

    pub fn transfer_failed(msg: impl Into<String>) -> Self {
        Self::new(DavErrorKind::TransferFailed, msg)
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::new(DavErrorKind::InvalidState, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(DavErrorKind::NotFound, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(DavErrorKind::Unauthorized, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(DavErrorKind::Conflict, msg)
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(DavErrorKind::InvalidRequest, msg)
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(DavErrorKind::InvalidConfig, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(DavErrorKind::Internal, msg)
    }

    /// Classify an HTTP status into the most appropriate error kind.
    ///
    /// Method-specific meanings (405 on MKCOL, failed PUT) are decided by the
    /// caller; this covers the statuses that mean the same thing everywhere.
    pub fn from_status(status: u16, context: &str) -> Self {
        let kind = match status {
            401 | 403 => DavErrorKind::Unauthorized,
            404 => DavErrorKind::NotFound,
            409 => DavErrorKind::Conflict,
            _ => DavErrorKind::Http,
        };
        Self::new(kind, format!("{} → HTTP {}", context, status)).with_status(status)
    }
}

impl fmt::Display for DavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(code) => write!(f, "[{:?} {}] {}", self.kind, code, self.message),
            None => write!(f, "[{:?}] {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for DavError {}

impl From<reqwest::Error> for DavError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            return Self::unreachable(e.to_string());
        }
        if let Some(status) = e.status() {
            return Self::from_status(status.as_u16(), &e.to_string());
        }
        if e.is_request() {
            return Self::unreachable(e.to_string());
        }
        Self::new(DavErrorKind::Http, e.to_string())
    }
}

impl From<std::io::Error> for DavError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(e.to_string()),
            _ => Self::new(DavErrorKind::Io, e.to_string()),
        }
    }
}

impl From<quick_xml::Error> for DavError {
    fn from(e: quick_xml::Error) -> Self {
        Self::malformed(format!("XML parse error: {}", e))
    }
}

impl From<serde_json::Error> for DavError {
    fn from(e: serde_json::Error) -> Self {
        Self::malformed(format!("JSON decode error: {}", e))
    }
}

impl From<DavError> for String {
    fn from(e: DavError) -> String {
        e.to_string()
    }
}
