// ──────────────────────────────────────────────────────────────────────────────
// cloudnav-dav · listing
// ──────────────────────────────────────────────────────────────────────────────
// Listing Normalizer:
//  • Strict decode of WebDAV multistatus XML and structured JSON listings
//  • Path relativization against the storage root
//  • Self-record / out-of-subtree / duplicate filtering
//  • Directories-first, case-aware name ordering
//  • Name filter and MIME guessing helpers
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::{DavError, DavResult};
use crate::paths::{canonical_path, decode_href, is_within, join_path, last_segment, strip_root};
use crate::types::{DavResource, Entry, RawListing, StructuredRecord, DIRECTORY_MEDIA_TYPE};
use log::debug;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Converts raw provider listings into canonical [`Entry`] sequences.
#[derive(Debug, Clone)]
pub struct ListingNormalizer {
    storage_root: String,
}

impl ListingNormalizer {
    /// `storage_root` is the fixed prefix of every provider identifier,
    /// e.g. `/remote.php/dav/files/alice`.
    pub fn new(storage_root: &str) -> Self {
        Self {
            storage_root: canonical_path(storage_root),
        }
    }

    pub fn storage_root(&self) -> &str {
        &self.storage_root
    }

    /// Absolute provider path of a path relative to the browsing root.
    pub fn absolute_path(&self, relative: &str) -> String {
        join_path(&self.storage_root, relative)
    }

    /// Decode `raw` and normalize it as the listing of `query_path`.
    ///
    /// `query_path` may be relative to the browsing root or an absolute
    /// provider path. Fails with `MalformedResponse` when the raw listing
    /// cannot be decoded.
    pub fn normalize(&self, raw: &RawListing, query_path: &str) -> DavResult<Vec<Entry>> {
        let resources = decode_listing(raw)?;
        Ok(self.normalize_resources(resources, query_path))
    }

    /// Normalize already-decoded provider records.
    pub fn normalize_resources(&self, resources: Vec<DavResource>, query_path: &str) -> Vec<Entry> {
        let query = canonical_path(query_path);
        let mut seen: HashSet<String> = HashSet::new();
        let mut entries = Vec::with_capacity(resources.len());

        for res in resources {
            let absolute = decode_href(&res.href);
            let Some(path) = strip_root(&absolute, &self.storage_root) else {
                debug!("listing: dropping {} (outside storage root {})", absolute, self.storage_root);
                continue;
            };

            // Self-reference: the queried collection echoed back.
            if path == "/" || path == query || absolute == query {
                continue;
            }
            if !is_within(&path, &query) && !is_within(&absolute, &query) {
                debug!("listing: dropping {} (outside {})", path, query);
                continue;
            }
            if !seen.insert(path.clone()) {
                debug!("listing: dropping duplicate {}", path);
                continue;
            }

            entries.push(into_entry(res, path));
        }

        sort_entries(&mut entries);
        entries
    }
}

fn into_entry(res: DavResource, path: String) -> Entry {
    let name = match res.display_name.as_deref().map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => last_segment(&path).to_string(),
    };
    let (size_bytes, media_type) = if res.is_collection {
        (0, DIRECTORY_MEDIA_TYPE.to_string())
    } else {
        let mime = match res.content_type {
            Some(ct) if !ct.trim().is_empty() => ct.trim().to_string(),
            _ => guess_mime(&name).to_string(),
        };
        (res.content_length.unwrap_or(0), mime)
    };

    Entry {
        name,
        path,
        is_directory: res.is_collection,
        size_bytes,
        media_type,
        last_modified: res.last_modified,
        etag: res.etag,
    }
}

// ── Ordering ─────────────────────────────────────────────────────────────────

/// Case-aware name order: case-insensitive first, exact order as tiebreak.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Directories first, then [`compare_names`], then path.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| {
        b.is_directory
            .cmp(&a.is_directory)
            .then_with(|| compare_names(&a.name, &b.name))
            .then_with(|| a.path.cmp(&b.path))
    });
}

/// Entries whose name contains `needle`, case-insensitively. An empty or
/// blank needle keeps everything.
pub fn filter_by_name<'a>(entries: &'a [Entry], needle: &str) -> Vec<&'a Entry> {
    let needle = needle.trim().to_lowercase();
    entries
        .iter()
        .filter(|e| needle.is_empty() || e.name.to_lowercase().contains(&needle))
        .collect()
}

// ── Decoding ─────────────────────────────────────────────────────────────────

/// Decode either listing form into provider records.
pub fn decode_listing(raw: &RawListing) -> DavResult<Vec<DavResource>> {
    match raw {
        RawListing::Multistatus(xml) => parse_multistatus(xml),
        RawListing::Structured(json) => parse_structured(json),
    }
}

/// Decode a structured JSON listing. Every record needs `filename` and `type`.
pub fn parse_structured(json: &str) -> DavResult<Vec<DavResource>> {
    let records: Vec<StructuredRecord> = serde_json::from_str(json)?;
    records
        .into_iter()
        .map(|r| {
            if r.filename.trim().is_empty() {
                Err(DavError::malformed("structured record with empty filename"))
            } else {
                Ok(DavResource::from(r))
            }
        })
        .collect()
}

/// Properties collected inside one `<propstat>`.
#[derive(Default)]
struct PropBlock {
    display_name: Option<String>,
    content_length: Option<String>,
    content_type: Option<String>,
    last_modified: Option<String>,
    etag: Option<String>,
    has_resourcetype: bool,
    is_collection: bool,
    status: Option<u16>,
}

/// One `<response>` under construction.
#[derive(Default)]
struct ResponseBlock {
    href: Option<String>,
    resource: DavResource,
    has_resourcetype: bool,
}

impl ResponseBlock {
    fn accept(&mut self, block: PropBlock) -> DavResult<()> {
        if let Some(status) = block.status {
            if !(200..300).contains(&status) {
                return Ok(());
            }
        }
        if block.has_resourcetype {
            self.has_resourcetype = true;
            self.resource.is_collection = block.is_collection;
        }
        if let Some(raw) = block.content_length.filter(|r| !r.trim().is_empty()) {
            let len = raw.trim().parse::<u64>().map_err(|_| {
                DavError::malformed(format!("invalid getcontentlength {:?}", raw))
            })?;
            self.resource.content_length = Some(len);
        }
        if block.display_name.is_some() {
            self.resource.display_name = block.display_name;
        }
        if block.content_type.is_some() {
            self.resource.content_type = block.content_type;
        }
        if block.last_modified.is_some() {
            self.resource.last_modified = block.last_modified;
        }
        if let Some(etag) = block.etag {
            self.resource.etag = Some(etag.trim_matches('"').to_string());
        }
        Ok(())
    }

    fn finish(mut self) -> DavResult<DavResource> {
        let href = match self.href {
            Some(h) if !h.trim().is_empty() => h,
            _ => return Err(DavError::malformed("response without href")),
        };
        if !self.has_resourcetype {
            return Err(DavError::malformed(format!(
                "response {} has no resourcetype in a successful propstat",
                href
            )));
        }
        self.resource.href = href;
        Ok(self.resource)
    }
}

/// Parse `HTTP/1.1 200 OK` into `200`.
fn parse_status_line(line: &str) -> DavResult<u16> {
    line.split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| DavError::malformed(format!("invalid status line {:?}", line)))
}

/// Strict decode of a WebDAV `207 Multi-Status` body.
///
/// The root element must be `multistatus`; each `response` needs an `href` and
/// a `resourcetype` reported in a 2xx (or status-less) `propstat`. Properties
/// from non-2xx propstats are ignored.
pub fn parse_multistatus(xml: &str) -> DavResult<Vec<DavResource>> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut resources = Vec::new();
    let mut root_seen = false;
    let mut response: Option<ResponseBlock> = None;
    let mut propstat: Option<PropBlock> = None;
    let mut in_resourcetype = false;
    let mut current_tag: Option<String> = None;
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let local = local_name(e.name().as_ref());
                if !root_seen {
                    if local != "multistatus" {
                        return Err(DavError::malformed(format!(
                            "expected multistatus root, found <{}>",
                            local
                        )));
                    }
                    root_seen = true;
                    buf.clear();
                    continue;
                }
                match local.as_str() {
                    "response" => response = Some(ResponseBlock::default()),
                    "propstat" if response.is_some() => propstat = Some(PropBlock::default()),
                    "resourcetype" => {
                        if let Some(block) = propstat.as_mut() {
                            block.has_resourcetype = true;
                            in_resourcetype = true;
                        }
                    }
                    "collection" if in_resourcetype => {
                        if let Some(block) = propstat.as_mut() {
                            block.is_collection = true;
                        }
                    }
                    "href" | "status" | "displayname" | "getcontentlength" | "getcontenttype"
                    | "getlastmodified" | "getetag" => {
                        current_tag = Some(local);
                        text.clear();
                    }
                    _ => {}
                }
            }
            Event::Empty(ref e) => {
                let local = local_name(e.name().as_ref());
                if !root_seen {
                    return Err(DavError::malformed(format!(
                        "expected multistatus root, found <{}/>",
                        local
                    )));
                }
                if let Some(block) = propstat.as_mut() {
                    match local.as_str() {
                        "resourcetype" => block.has_resourcetype = true,
                        "collection" if in_resourcetype => block.is_collection = true,
                        _ => {}
                    }
                }
            }
            Event::Text(ref e) => {
                if current_tag.is_some() {
                    text.push_str(&e.unescape()?);
                }
            }
            Event::CData(ref e) => {
                if current_tag.is_some() {
                    text.push_str(&String::from_utf8_lossy(e));
                }
            }
            Event::End(ref e) => {
                let local = local_name(e.name().as_ref());
                match local.as_str() {
                    "response" => {
                        if let Some(block) = response.take() {
                            resources.push(block.finish()?);
                        }
                    }
                    "propstat" => {
                        if let (Some(block), Some(resp)) = (propstat.take(), response.as_mut()) {
                            resp.accept(block)?;
                        }
                    }
                    "resourcetype" => in_resourcetype = false,
                    _ if current_tag.as_deref() == Some(local.as_str()) => {
                        current_tag = None;
                        let value = std::mem::take(&mut text);
                        store_text(&local, value, response.as_mut(), propstat.as_mut())?;
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !root_seen {
        return Err(DavError::malformed("empty multistatus body"));
    }
    if response.is_some() {
        return Err(DavError::malformed("truncated multistatus body"));
    }
    Ok(resources)
}

fn store_text(
    tag: &str,
    value: String,
    response: Option<&mut ResponseBlock>,
    propstat: Option<&mut PropBlock>,
) -> DavResult<()> {
    match (tag, propstat) {
        ("status", Some(block)) => block.status = Some(parse_status_line(&value)?),
        ("displayname", Some(block)) => block.display_name = Some(value),
        ("getcontentlength", Some(block)) => block.content_length = Some(value),
        ("getcontenttype", Some(block)) => block.content_type = Some(value),
        ("getlastmodified", Some(block)) => block.last_modified = Some(value),
        ("getetag", Some(block)) => block.etag = Some(value),
        ("href", None) => {
            if let Some(resp) = response {
                resp.href = Some(value);
            }
        }
        _ => {}
    }
    Ok(())
}

/// Extract the local name from a possibly-namespaced XML tag.
fn local_name(full: &[u8]) -> String {
    let s = std::str::from_utf8(full).unwrap_or("");
    match s.rfind(':') {
        Some(pos) => s[pos + 1..].to_string(),
        None => s.to_string(),
    }
}

// ── MIME ─────────────────────────────────────────────────────────────────────

/// Guess a MIME type from a file name's extension.
pub fn guess_mime(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "log" | "md" | "csv" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        "tar" => "application/x-tar",
        "7z" => "application/x-7z-compressed",
        "rar" => "application/vnd.rar",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "odt" => "application/vnd.oasis.opendocument.text",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DavErrorKind;

    fn dir(href: &str) -> DavResource {
        DavResource {
            href: href.into(),
            is_collection: true,
            ..Default::default()
        }
    }

    fn file(href: &str, size: u64) -> DavResource {
        DavResource {
            href: href.into(),
            content_length: Some(size),
            ..Default::default()
        }
    }

    const MULTISTATUS: &str = r#"<?xml version="1.0"?>
<d:multistatus xmlns:d="DAV:" xmlns:oc="http://owncloud.org/ns">
  <d:response>
    <d:href>/remote.php/dav/files/alice/Docs/</d:href>
    <d:propstat>
      <d:prop>
        <d:resourcetype><d:collection/></d:resourcetype>
        <d:displayname>Docs</d:displayname>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/remote.php/dav/files/alice/Docs/My%20Report.pdf</d:href>
    <d:propstat>
      <d:prop>
        <d:resourcetype/>
        <d:getcontentlength>2048</d:getcontentlength>
        <d:getcontenttype>application/pdf</d:getcontenttype>
        <d:getlastmodified>Tue, 01 Oct 2024 10:00:00 GMT</d:getlastmodified>
        <d:getetag>"abc123"</d:getetag>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
    <d:propstat>
      <d:prop><d:displayname/><oc:size/></d:prop>
      <d:status>HTTP/1.1 404 Not Found</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/remote.php/dav/files/alice/Docs/archive/</d:href>
    <d:propstat>
      <d:prop>
        <d:resourcetype><d:collection/></d:resourcetype>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

    #[test]
    fn parse_multistatus_reads_records() {
        let res = parse_multistatus(MULTISTATUS).unwrap();
        assert_eq!(res.len(), 3);
        assert!(res[0].is_collection);
        assert_eq!(res[0].display_name.as_deref(), Some("Docs"));
        assert!(!res[1].is_collection);
        assert_eq!(res[1].content_length, Some(2048));
        assert_eq!(res[1].content_type.as_deref(), Some("application/pdf"));
        assert_eq!(res[1].etag.as_deref(), Some("abc123"));
        assert_eq!(res[1].display_name, None);
        assert!(res[2].is_collection);
    }

    #[test]
    fn normalize_multistatus_drops_self_and_sorts() {
        let n = ListingNormalizer::new("/remote.php/dav/files/alice");
        let raw = RawListing::Multistatus(MULTISTATUS.to_string());
        let entries = n.normalize(&raw, "/Docs").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "/Docs/archive");
        assert_eq!(entries[0].name, "archive");
        assert_eq!(entries[0].media_type, DIRECTORY_MEDIA_TYPE);
        assert_eq!(entries[1].path, "/Docs/My Report.pdf");
        assert_eq!(entries[1].name, "My Report.pdf");
        assert_eq!(entries[1].size_bytes, 2048);
    }

    #[test]
    fn scenario_self_record_dropped_with_absolute_query() {
        let n = ListingNormalizer::new("/base");
        let mut a = dir("/base/A");
        a.display_name = Some("A".into());
        let entries = n.normalize_resources(vec![a, file("/base/A/doc.txt", 2048)], "/base/A");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "/A/doc.txt");
        assert!(!entries[0].is_directory);
        assert_eq!(entries[0].size_bytes, 2048);
        assert_eq!(entries[0].media_type, "text/plain");
    }

    #[test]
    fn relative_query_is_equivalent() {
        let n = ListingNormalizer::new("/base");
        let entries =
            n.normalize_resources(vec![dir("/base/A/"), file("/base/A/doc.txt", 1)], "/A/");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "/A/doc.txt");
    }

    #[test]
    fn root_listing_skips_root_record() {
        let n = ListingNormalizer::new("/base");
        let entries = n.normalize_resources(
            vec![dir("/base/"), dir("/base/Photos"), file("/base/a.txt", 3)],
            "/",
        );
        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/Photos", "/a.txt"]);
    }

    #[test]
    fn drops_out_of_tree_and_duplicates() {
        let n = ListingNormalizer::new("/base");
        let entries = n.normalize_resources(
            vec![
                dir("/wrapper"),
                dir("/basement/x"),
                file("/base/B/elsewhere.txt", 1),
                file("/base/A/one.txt", 1),
                file("/base/A//one.txt/", 99),
            ],
            "/A",
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "/A/one.txt");
        assert_eq!(entries[0].size_bytes, 1);
    }

    #[test]
    fn sort_is_directories_first_then_case_aware() {
        let n = ListingNormalizer::new("/");
        let entries = n.normalize_resources(
            vec![
                file("/b.txt", 1),
                file("/B.txt", 1),
                file("/a.txt", 1),
                dir("/zeta"),
                dir("/Alpha"),
            ],
            "/",
        );
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "zeta", "a.txt", "B.txt", "b.txt"]);
    }

    #[test]
    fn blank_display_name_falls_back_to_segment() {
        let n = ListingNormalizer::new("/base");
        let mut f = file("/base/x/report%202024.csv", 5);
        f.display_name = Some("  ".into());
        let entries = n.normalize_resources(vec![f], "/x");
        assert_eq!(entries[0].name, "report 2024.csv");
    }

    #[test]
    fn directories_report_zero_size() {
        let n = ListingNormalizer::new("/");
        let mut d = dir("/d");
        d.content_length = Some(4096);
        let entries = n.normalize_resources(vec![d], "/");
        assert_eq!(entries[0].size_bytes, 0);
    }

    #[test]
    fn absolute_url_hrefs_are_accepted() {
        let n = ListingNormalizer::new("/remote.php/dav/files/alice");
        let entries = n.normalize_resources(
            vec![file("https://cloud.test/remote.php/dav/files/alice/x.png", 7)],
            "/",
        );
        assert_eq!(entries[0].path, "/x.png");
        assert_eq!(entries[0].media_type, "image/png");
    }

    #[test]
    fn multistatus_rejects_wrong_root_and_empty_body() {
        let err = parse_multistatus("<html><body/></html>").unwrap_err();
        assert!(err.is(DavErrorKind::MalformedResponse));
        let err = parse_multistatus("").unwrap_err();
        assert!(err.is(DavErrorKind::MalformedResponse));
    }

    #[test]
    fn multistatus_rejects_missing_href() {
        let xml = r#"<d:multistatus xmlns:d="DAV:"><d:response><d:propstat>
            <d:prop><d:resourcetype/></d:prop><d:status>HTTP/1.1 200 OK</d:status>
            </d:propstat></d:response></d:multistatus>"#;
        assert!(parse_multistatus(xml).unwrap_err().is(DavErrorKind::MalformedResponse));
    }

    #[test]
    fn multistatus_rejects_resourcetype_only_in_failed_propstat() {
        let xml = r#"<d:multistatus xmlns:d="DAV:"><d:response><d:href>/a</d:href><d:propstat>
            <d:prop><d:resourcetype/></d:prop><d:status>HTTP/1.1 404 Not Found</d:status>
            </d:propstat></d:response></d:multistatus>"#;
        assert!(parse_multistatus(xml).unwrap_err().is(DavErrorKind::MalformedResponse));
    }

    #[test]
    fn multistatus_rejects_bad_content_length() {
        let xml = r#"<d:multistatus xmlns:d="DAV:"><d:response><d:href>/a</d:href><d:propstat>
            <d:prop><d:resourcetype/><d:getcontentlength>lots</d:getcontentlength></d:prop>
            </d:propstat></d:response></d:multistatus>"#;
        assert!(parse_multistatus(xml).unwrap_err().is(DavErrorKind::MalformedResponse));
    }

    #[test]
    fn multistatus_rejects_broken_xml() {
        let xml = r#"<d:multistatus xmlns:d="DAV:"><d:response><d:href>/a</d:hr"#;
        assert!(parse_multistatus(xml).is_err());
    }

    #[test]
    fn multistatus_unescapes_entities() {
        let xml = r#"<d:multistatus xmlns:d="DAV:"><d:response><d:href>/b/Tom%20&amp;%20Jerry</d:href>
            <d:propstat><d:prop><d:resourcetype/><d:displayname>Tom &amp; Jerry</d:displayname></d:prop>
            <d:status>HTTP/1.1 200 OK</d:status></d:propstat></d:response></d:multistatus>"#;
        let res = parse_multistatus(xml).unwrap();
        assert_eq!(res[0].href, "/b/Tom%20&%20Jerry");
        assert_eq!(res[0].display_name.as_deref(), Some("Tom & Jerry"));
    }

    #[test]
    fn structured_listing_normalizes() {
        let json = r#"[
            {"filename":"/base/A","basename":"A","type":"directory"},
            {"filename":"/base/A/doc.txt","basename":"doc.txt","type":"file","size":2048,"mime":"text/plain"},
            {"filename":"/base/A/Sub","basename":"","type":"directory"}
        ]"#;
        let n = ListingNormalizer::new("/base");
        let entries = n
            .normalize(&RawListing::Structured(json.to_string()), "/A")
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Sub");
        assert!(entries[0].is_directory);
        assert_eq!(entries[1].path, "/A/doc.txt");
    }

    #[test]
    fn structured_listing_rejects_missing_fields() {
        let n = ListingNormalizer::new("/base");
        let raw = RawListing::Structured(r#"[{"basename":"x","type":"file"}]"#.into());
        assert!(n.normalize(&raw, "/").unwrap_err().is(DavErrorKind::MalformedResponse));
        let raw = RawListing::Structured(r#"{"not":"an array"}"#.into());
        assert!(n.normalize(&raw, "/").unwrap_err().is(DavErrorKind::MalformedResponse));
        let raw = RawListing::Structured(r#"[{"filename":"","type":"file"}]"#.into());
        assert!(n.normalize(&raw, "/").unwrap_err().is(DavErrorKind::MalformedResponse));
    }

    #[test]
    fn filter_by_name_is_case_insensitive() {
        let n = ListingNormalizer::new("/");
        let entries = n.normalize_resources(
            vec![file("/Holiday.JPG", 1), file("/notes.txt", 1), dir("/holidays")],
            "/",
        );
        let hits: Vec<_> = filter_by_name(&entries, "HOLI").iter().map(|e| e.name.clone()).collect();
        assert_eq!(hits, vec!["holidays", "Holiday.JPG"]);
        assert_eq!(filter_by_name(&entries, "  ").len(), 3);
    }

    #[test]
    fn compare_names_tiebreaks_on_exact_order() {
        assert_eq!(compare_names("a", "B"), Ordering::Less);
        assert_eq!(compare_names("B", "b"), Ordering::Less);
        assert_eq!(compare_names("x", "x"), Ordering::Equal);
    }

    #[test]
    fn guess_mime_cases() {
        assert_eq!(guess_mime("test.PDF"), "application/pdf");
        assert_eq!(guess_mime("photo.jpeg"), "image/jpeg");
        assert_eq!(guess_mime("noext"), "application/octet-stream");
        assert_eq!(guess_mime("file.xyz123"), "application/octet-stream");
    }
}
