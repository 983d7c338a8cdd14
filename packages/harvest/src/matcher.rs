//! Per-root-domain name matching.
//!
//! A [`DomainMatcher`] recognizes the root domain itself and any subdomain of
//! it inside free-form text (HTML, JSON, CSV). Matches are cleaned before they
//! are returned, and every returned name is guaranteed to be either the root
//! domain or to end with `"." + root`.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{HarvestError, HarvestResult};

/// One DNS label followed by a dot. Labels may carry underscores (SRV-style
/// names show up in CT logs) and may not end with a hyphen.
const LABEL_PATTERN: &str = r"(?:[a-z0-9_](?:[a-z0-9_-]{0,61}[a-z0-9_])?\.)*";

/// Leading JSON escape remnants such as `u002f` or `u2019` left behind when a
/// body is scanned without unescaping.
fn escape_artifact() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^u[0-9a-f]{4}").expect("static pattern"))
}

/// Normalize a root domain: trim, lowercase, drop a trailing dot.
///
/// Returns `None` when the result is empty or is not a plausible hostname.
pub fn normalize_domain(domain: &str) -> Option<String> {
    let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
    if domain.is_empty() || domain.starts_with('.') || domain.contains("..") {
        return None;
    }
    if !domain.bytes().all(|b| is_label_byte(b) || b == b'.') {
        return None;
    }
    Some(domain)
}

/// Clean a raw match: trim, lowercase, strip escape artifacts and any
/// leading `-` or `.`.
pub fn clean_name(raw: &str) -> String {
    let mut name = raw.trim().to_ascii_lowercase();
    while let Some(m) = escape_artifact().find(&name) {
        name = name[m.end()..].to_string();
    }
    name.trim_start_matches(['-', '.']).to_string()
}

/// Reverse the character order of a name (`moc.elpmaxe.ipa` -> `api.example.com`).
pub fn reverse_name(name: &str) -> String {
    name.chars().rev().collect()
}

/// Drop everything up to and including the last `*.` wildcard marker.
pub fn strip_wildcard_label(name: &str) -> &str {
    match name.rfind("*.") {
        Some(idx) => &name[idx + 2..],
        None => name,
    }
}

fn is_label_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// Matcher for one root domain and its subdomains.
#[derive(Debug, Clone)]
pub struct DomainMatcher {
    domain: String,
    suffix: String,
    pattern: Regex,
}

impl DomainMatcher {
    /// Compile a matcher for `domain`.
    pub fn new(domain: &str) -> HarvestResult<Self> {
        let domain = normalize_domain(domain).ok_or_else(|| HarvestError::InvalidDomain {
            domain: domain.to_string(),
        })?;
        let pattern = Regex::new(&format!("(?i){}{}", LABEL_PATTERN, regex::escape(&domain)))?;

        Ok(Self {
            suffix: format!(".{}", domain),
            domain,
            pattern,
        })
    }

    /// The normalized root domain.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// True if `name` is the root domain or one of its subdomains.
    pub fn is_member(&self, name: &str) -> bool {
        name == self.domain || name.ends_with(&self.suffix)
    }

    /// Every bounded, non-overlapping match in `text`, in scan order.
    ///
    /// No dedup is done here.
    pub fn find_all(&self, text: &str) -> Vec<String> {
        self.pattern
            .find_iter(text)
            .filter(|m| is_bounded(text, m.start(), m.end()))
            .filter_map(|m| self.accept(m.as_str()))
            .collect()
    }

    /// The first bounded match in an already-assembled candidate.
    pub fn find_first(&self, candidate: &str) -> Option<String> {
        self.pattern
            .find_iter(candidate)
            .filter(|m| is_bounded(candidate, m.start(), m.end()))
            .find_map(|m| self.accept(m.as_str()))
    }

    fn accept(&self, raw: &str) -> Option<String> {
        let name = clean_name(raw);
        if self.is_member(&name) {
            return Some(name);
        }
        // Artifact stripping must never cut into the root domain itself.
        let lowered = raw.trim().to_ascii_lowercase();
        self.is_member(&lowered).then_some(lowered)
    }
}

/// A match must not be glued to surrounding label characters, and must not be
/// followed by a further label (`example.com.evil.org`).
fn is_bounded(text: &str, start: usize, end: usize) -> bool {
    let bytes = text.as_bytes();
    if start > 0 && is_label_byte(bytes[start - 1]) {
        return false;
    }
    match bytes.get(end) {
        Some(&b) if is_label_byte(b) => false,
        Some(b'.') => !bytes.get(end + 1).is_some_and(|&b| is_label_byte(b)),
        _ => true,
    }
}
