//! Byte-offset extraction and text normalization for scraped responses.
//!
//! The scrape target embeds what we need inside page bodies rather than a
//! stable API: an anti-automation token (`vqd`) somewhere in the handshake
//! HTML, and the results JSON array between two fixed script markers.
//! Extraction works on raw bytes and returns `None` on any malformed body;
//! callers turn that into a provider failure.

/// Known delimiter variants surrounding the vqd token, as
/// `(start pattern, offset past it, end pattern)`.
const VQD_PATTERNS: &[(&[u8], usize, &[u8])] = &[
    (b"vqd=\"", 5, b"\""),
    (b"vqd=", 4, b"&"),
    (b"vqd='", 5, b"'"),
];

const RESULTS_START: &[u8] = b"DDG.pageLayout.load('d',";
const RESULTS_END: &[u8] = b");DDG.duckbar.load(";

/// Scan the handshake body for the vqd token under any known delimiter.
pub(crate) fn extract_vqd(body: &[u8]) -> Option<String> {
    for (start_pattern, offset, end_pattern) in VQD_PATTERNS {
        let Some(start) = find(body, start_pattern, 0).map(|i| i + offset) else {
            continue;
        };
        let Some(end) = find(body, end_pattern, start) else {
            continue;
        };
        if let Ok(vqd) = std::str::from_utf8(&body[start..end]) {
            return Some(vqd.to_string());
        }
    }
    None
}

/// Slice the raw results JSON array out of the d.js body.
pub(crate) fn extract_results_json(body: &[u8]) -> Option<&[u8]> {
    let start = find(body, RESULTS_START, 0)? + RESULTS_START.len();
    let end = find(body, RESULTS_END, start)?;
    Some(&body[start..end])
}

/// Strip markup tags and unescape HTML entities.
pub(crate) fn normalize_html(raw: &str) -> String {
    html_escape::decode_html_entities(&strip_tags(raw)).into_owned()
}

/// Percent-decode a result URL, mapping spaces to `+` first (the scrape
/// target emits both encodings).
pub(crate) fn normalize_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    let plussed = url.replace(' ', "+");
    percent_encoding::percent_decode_str(&plussed)
        .decode_utf8_lossy()
        .into_owned()
}

/// Remove `<...>` spans. An unterminated `<` is kept as literal text.
fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                out.push_str(&rest[open..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

/// First occurrence of `needle` in `haystack` at or after `from`.
fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}
