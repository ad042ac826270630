// ──────────────────────────────────────────────────────────────────────────────
// cloudnav-dav · paths
// ──────────────────────────────────────────────────────────────────────────────
// Path helpers shared by the normalizer, the client and the orchestrator:
//  • Canonical form (single leading slash, no slash runs, no trailing slash)
//  • Join / parent / last segment / subtree tests
//  • Href decoding and storage-root stripping
//  • URL encoding for request paths
//  • Destination name sanitization
// ──────────────────────────────────────────────────────────────────────────────

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left untouched when encoding a single path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Canonicalize a path: one leading slash, slash runs collapsed, trailing
/// slash stripped (except for the root itself).
pub fn canonical_path(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 1);
    for segment in raw.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Join a child name or relative path onto a base directory.
pub fn join_path(base: &str, child: &str) -> String {
    canonical_path(&format!("{}/{}", base, child))
}

/// Parent directory of a path; the root is its own parent.
pub fn parent_path(path: &str) -> String {
    let canon = canonical_path(path);
    match canon.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(pos) => canon[..pos].to_string(),
    }
}

/// Last segment of a path (empty for the root).
pub fn last_segment(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

/// Whether canonical `path` is `dir` itself or lies beneath it.
pub fn is_within(path: &str, dir: &str) -> bool {
    if dir == "/" {
        return true;
    }
    path == dir
        || path
            .strip_prefix(dir)
            .map(|rest| rest.starts_with('/'))
            .unwrap_or(false)
}

/// Strip the canonical storage root from a canonical absolute path, at a
/// segment boundary. Returns the canonical remainder, or `None` when the path
/// lies outside the root.
pub fn strip_root(path: &str, root: &str) -> Option<String> {
    if root == "/" {
        return Some(path.to_string());
    }
    if !is_within(path, root) {
        return None;
    }
    Some(canonical_path(&path[root.len()..]))
}

/// Decode a provider href into a canonical absolute path.
///
/// Absolute URLs lose their scheme and authority; percent-escapes are
/// decoded (invalid UTF-8 is replaced rather than rejected).
pub fn decode_href(href: &str) -> String {
    let trimmed = href.trim();
    let raw_path = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        match url::Url::parse(trimmed) {
            Ok(url) => url.path().to_string(),
            Err(_) => trimmed.to_string(),
        }
    } else {
        trimmed.to_string()
    };
    canonical_path(&percent_decode_str(&raw_path).decode_utf8_lossy())
}

/// Percent-encode every segment of a path for use in a request URL.
/// The result has no leading slash.
pub fn encode_dav_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|seg| utf8_percent_encode(seg, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Derive the destination name shown by the remote store: every character
/// outside `[A-Za-z0-9._-]` becomes `_`. Names that would be empty or made
/// only of dots become `_` so they can never address a parent directory.
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        sanitized
    }
}
