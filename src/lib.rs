//! # cloudnav
//!
//! WebDAV file browser core: directory navigation over a Nextcloud-style
//! store, concurrent cancellable uploads with live progress, and the
//! single-entry operations around them.
//!
//! - **Config** — JSON file plus `NEXTCLOUD_*` environment overlay
//! - **Logging** — `tracing-subscriber` setup bridging the `log` facade
//! - **Navigator** — listing fetch, normalization, browser events, refresh
//! - **Service** — the `FileBrowser` facade

pub mod config;
pub mod logging;
pub mod navigator;
pub mod service;

pub use cloudnav_dav as dav;
pub use cloudnav_transfer as transfer;

pub use config::AppConfig;
pub use navigator::{BrowserEvent, Navigator};
pub use service::FileBrowser;

use cloudnav_dav::DavResult;
use std::path::Path;

/// Resolve configuration, install logging and connect a [`FileBrowser`].
///
/// `config_path` overrides the platform config location.
pub fn run(config_path: Option<&Path>) -> DavResult<FileBrowser> {
    let config = match config_path {
        Some(path) => AppConfig::resolve(Some(path))?,
        None => AppConfig::resolve_default()?,
    };
    logging::init(&config.log_filter);
    log::info!("cloudnav {} starting", env!("CARGO_PKG_VERSION"));
    FileBrowser::from_app_config(&config)
}
