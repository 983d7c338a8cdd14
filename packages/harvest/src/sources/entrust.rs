//! Entrust certificate-transparency search.
//!
//! Responses name hosts two ways: forward plaintext mentions, and
//! `valueReversed` fields holding the name with its characters reversed.
//! Both are harvested.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::error::HarvestResult;
use crate::event::SourceTag;
use crate::matcher::{reverse_name, strip_wildcard_label, DomainMatcher};
use crate::traits::fetcher::FetchRequest;
use crate::traits::source::Source;

const API_URL: &str = "https://ctsearch.entrust.com/api/v1/certificates";

const CERT_FIELDS: &str = "subjectO,issuerDN,subjectDN,signAlg,san,sn,subjectCNReversed,cert";

/// Escaped `=` that otherwise glues onto the following name.
const ESCAPE_ARTIFACT: &str = "u003d";

fn reversed_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""valueReversed":\s*"([^"]*)""#).expect("static pattern"))
}

/// Certificate-transparency source backed by Entrust's CT search API.
#[derive(Debug, Clone)]
pub struct Entrust {
    limit: u32,
}

impl Entrust {
    pub const NAME: &'static str = "Entrust";

    /// Create the source with the given result cap.
    pub fn new(limit: u32) -> Self {
        Self { limit }
    }
}

impl Default for Entrust {
    fn default() -> Self {
        Self::new(5000)
    }
}

impl Source for Entrust {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn tag(&self) -> SourceTag {
        SourceTag::Cert
    }

    fn request(&self, domain: &str) -> HarvestResult<FetchRequest> {
        let limit = self.limit.to_string();
        let url = Url::parse_with_params(
            API_URL,
            &[
                ("fields", CERT_FIELDS),
                ("domain", domain),
                ("includeExpired", "true"),
                ("exactMatch", "false"),
                ("limit", limit.as_str()),
            ],
        )?;
        Ok(FetchRequest::get(url.as_str()))
    }

    fn extract(&self, body: &str, matcher: &DomainMatcher) -> Vec<String> {
        let content = body.replace(ESCAPE_ARTIFACT, " ");
        let mut names = matcher.find_all(&content);

        names.extend(
            reversed_values(body)
                .iter()
                .filter_map(|name| matcher.find_first(name)),
        );
        names
    }
}

/// Decode every `"valueReversed": "..."` field back to forward order with
/// any wildcard label removed.
pub fn reversed_values(body: &str) -> Vec<String> {
    reversed_field()
        .captures_iter(body)
        .filter_map(|cap| cap.get(1))
        .map(|m| reverse_name(m.as_str().trim()))
        .map(|name| strip_wildcard_label(&name).to_string())
        .collect()
}
