//! VirusTotal domain information page scrape.

use crate::error::HarvestResult;
use crate::event::SourceTag;
use crate::matcher::DomainMatcher;
use crate::traits::fetcher::FetchRequest;
use crate::traits::source::Source;

/// Scrapes names out of VirusTotal's per-domain information page.
#[derive(Debug, Clone, Default)]
pub struct VirusTotal;

impl VirusTotal {
    pub const NAME: &'static str = "VirusTotal";

    pub fn new() -> Self {
        Self
    }
}

impl Source for VirusTotal {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn tag(&self) -> SourceTag {
        SourceTag::Scrape
    }

    fn request(&self, domain: &str) -> HarvestResult<FetchRequest> {
        Ok(FetchRequest::get(format!(
            "https://www.virustotal.com/en/domain/{}/information/",
            domain
        )))
    }

    fn extract(&self, body: &str, matcher: &DomainMatcher) -> Vec<String> {
        matcher.find_all(body)
    }
}
