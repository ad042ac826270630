// ──────────────────────────────────────────────────────────────────────────────
// cloudnav-dav · types
// ──────────────────────────────────────────────────────────────────────────────
// Data model for the WebDAV side:
//  • Raw provider listings (multistatus XML, structured JSON)
//  • Decoded provider records
//  • Canonical entries and listings
//  • File categories
// ──────────────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

/// Media type reported for directories.
pub const DIRECTORY_MEDIA_TYPE: &str = "inode/directory";

// ── Raw listings ─────────────────────────────────────────────────────────────

/// A directory listing exactly as the provider returned it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawListing {
    /// WebDAV `207 Multi-Status` body from a depth-1 PROPFIND.
    Multistatus(String),
    /// JSON array of [`StructuredRecord`]s.
    Structured(String),
}

impl RawListing {
    pub fn body(&self) -> &str {
        match self {
            Self::Multistatus(body) | Self::Structured(body) => body,
        }
    }
}

/// One record of a structured (JSON) listing.
///
/// `filename` is the absolute identifier on the provider, `type` the
/// collection marker. Both are mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRecord {
    pub filename: String,
    #[serde(default)]
    pub basename: Option<String>,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub lastmod: Option<String>,
    #[serde(default)]
    pub etag: Option<String>,
}

/// Collection marker of a structured record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Directory,
    File,
}

// ── Decoded provider records ─────────────────────────────────────────────────

/// A provider record after decoding, before path canonicalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DavResource {
    /// Absolute identifier as sent by the provider (percent-encoded).
    pub href: String,
    pub display_name: Option<String>,
    pub is_collection: bool,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub last_modified: Option<String>,
    pub etag: Option<String>,
}

impl From<StructuredRecord> for DavResource {
    fn from(r: StructuredRecord) -> Self {
        Self {
            href: r.filename,
            display_name: r.basename,
            is_collection: r.kind == RecordKind::Directory,
            content_length: r.size,
            content_type: r.mime,
            last_modified: r.lastmod,
            etag: r.etag.map(|e| e.trim_matches('"').to_string()),
        }
    }
}

// ── Canonical model ──────────────────────────────────────────────────────────

/// One normalized file-or-directory record of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub name: String,
    /// Canonical path relative to the browsing root: leading slash, no
    /// trailing slash.
    pub path: String,
    pub is_directory: bool,
    /// Always 0 for directories.
    pub size_bytes: u64,
    pub media_type: String,
    pub last_modified: Option<String>,
    pub etag: Option<String>,
}

impl Entry {
    pub fn category(&self) -> FileCategory {
        FileCategory::of(self)
    }
}

/// A normalized directory listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Canonical path of the listed directory.
    pub path: String,
    pub entries: Vec<Entry>,
}

impl Listing {
    /// `(files, directories)` counts.
    pub fn counts(&self) -> (usize, usize) {
        let dirs = self.entries.iter().filter(|e| e.is_directory).count();
        (self.entries.len() - dirs, dirs)
    }

    /// Sum of file sizes directly inside this directory.
    pub fn total_file_bytes(&self) -> u64 {
        self.entries
            .iter()
            .filter(|e| !e.is_directory)
            .map(|e| e.size_bytes)
            .sum()
    }
}

// ── Categories ───────────────────────────────────────────────────────────────

/// Coarse kind of an entry, from its media type and extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Folder,
    Video,
    Image,
    Audio,
    Pdf,
    Archive,
    Other,
}

impl FileCategory {
    pub fn of(entry: &Entry) -> Self {
        if entry.is_directory {
            return Self::Folder;
        }
        let mime = entry.media_type.to_ascii_lowercase();
        let ext = entry
            .name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if mime.contains("video") || matches!(ext.as_str(), "mp4" | "avi" | "mov" | "mkv") {
            Self::Video
        } else if mime.contains("image")
            || matches!(ext.as_str(), "jpg" | "jpeg" | "png" | "gif" | "webp")
        {
            Self::Image
        } else if mime.contains("audio") || matches!(ext.as_str(), "mp3" | "wav" | "ogg") {
            Self::Audio
        } else if mime.contains("pdf") {
            Self::Pdf
        } else if matches!(ext.as_str(), "zip" | "rar" | "7z" | "tar" | "gz") {
            Self::Archive
        } else {
            Self::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: &str, size: u64) -> Entry {
        Entry {
            name: name.into(),
            path: format!("/{}", name),
            is_directory: false,
            size_bytes: size,
            media_type: mime.into(),
            last_modified: None,
            etag: None,
        }
    }

    #[test]
    fn structured_record_requires_filename_and_type() {
        let ok: Result<StructuredRecord, _> =
            serde_json::from_str(r#"{"filename":"/a","type":"file"}"#);
        assert!(ok.is_ok());
        let missing_type: Result<StructuredRecord, _> =
            serde_json::from_str(r#"{"filename":"/a"}"#);
        assert!(missing_type.is_err());
        let bad_type: Result<StructuredRecord, _> =
            serde_json::from_str(r#"{"filename":"/a","type":"link"}"#);
        assert!(bad_type.is_err());
    }

    #[test]
    fn structured_record_into_resource() {
        let rec: StructuredRecord = serde_json::from_str(
            r#"{"filename":"/base/Docs","basename":"Docs","type":"directory","etag":"\"e1\""}"#,
        )
        .unwrap();
        let res = DavResource::from(rec);
        assert!(res.is_collection);
        assert_eq!(res.display_name.as_deref(), Some("Docs"));
        assert_eq!(res.etag.as_deref(), Some("e1"));
    }

    #[test]
    fn entry_serializes_camel_case() {
        let json = serde_json::to_string(&file("a.txt", "text/plain", 3)).unwrap();
        assert!(json.contains("\"isDirectory\""));
        assert!(json.contains("\"sizeBytes\""));
        assert!(json.contains("\"mediaType\""));
    }

    #[test]
    fn categories_from_mime_and_extension() {
        assert_eq!(file("clip.MKV", "", 0).category(), FileCategory::Video);
        assert_eq!(file("x", "image/png", 0).category(), FileCategory::Image);
        assert_eq!(file("song.ogg", "", 0).category(), FileCategory::Audio);
        assert_eq!(file("r.pdf", "application/pdf", 0).category(), FileCategory::Pdf);
        assert_eq!(file("b.tar", "application/x-tar", 0).category(), FileCategory::Archive);
        assert_eq!(file("notes.txt", "text/plain", 0).category(), FileCategory::Other);

        let mut dir = file("Photos", DIRECTORY_MEDIA_TYPE, 0);
        dir.is_directory = true;
        assert_eq!(dir.category(), FileCategory::Folder);
    }

    #[test]
    fn listing_counts_and_sizes() {
        let mut dir = file("Dir", DIRECTORY_MEDIA_TYPE, 0);
        dir.is_directory = true;
        let listing = Listing {
            path: "/".into(),
            entries: vec![dir, file("a", "", 10), file("b", "", 32)],
        };
        assert_eq!(listing.counts(), (2, 1));
        assert_eq!(listing.total_file_bytes(), 42);
    }
}
