//! # cloudnav – WebDAV side
//!
//! Everything that talks to, or interprets answers from, the remote store:
//!
//! - **Error** — categorised `DavError` shared by every cloudnav crate
//! - **Types** — raw listings, provider records, canonical entries, categories
//! - **Paths** — canonical paths, href decoding, URL encoding, name sanitization
//! - **Listing** — strict multistatus / structured decode and the Listing Normalizer
//! - **Config** — connection settings from JSON or `NEXTCLOUD_*` variables
//! - **Transport** — the `DavTransport` boundary and progress channel
//! - **Client** — reqwest implementation (PROPFIND, PUT, MKCOL, DELETE, GET)

pub mod error;
pub mod types;
pub mod paths;
pub mod listing;
pub mod config;
pub mod transport;
pub mod client;

pub use client::DavClient;
pub use config::DavConfig;
pub use error::{DavError, DavErrorKind, DavResult};
pub use listing::{filter_by_name, ListingNormalizer};
pub use transport::{progress_channel, DavTransport, ProgressReceiver, ProgressSender};
pub use types::{DavResource, Entry, FileCategory, Listing, RawListing, DIRECTORY_MEDIA_TYPE};
