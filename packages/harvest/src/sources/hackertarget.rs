//! HackerTarget host search API.

use crate::error::HarvestResult;
use crate::event::SourceTag;
use crate::matcher::DomainMatcher;
use crate::traits::fetcher::FetchRequest;
use crate::traits::source::Source;

/// Queries HackerTarget's host search, which answers with `host,ip` lines.
#[derive(Debug, Clone, Default)]
pub struct HackerTarget;

impl HackerTarget {
    pub const NAME: &'static str = "HackerTarget";

    pub fn new() -> Self {
        Self
    }
}

impl Source for HackerTarget {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn tag(&self) -> SourceTag {
        SourceTag::Api
    }

    fn request(&self, domain: &str) -> HarvestResult<FetchRequest> {
        Ok(FetchRequest::get(format!(
            "https://api.hackertarget.com/hostsearch/?q={}",
            domain
        )))
    }

    fn extract(&self, body: &str, matcher: &DomainMatcher) -> Vec<String> {
        body.lines()
            .filter_map(|line| line.split_once(',').map(|(host, _)| host))
            .filter_map(|host| matcher.find_first(host))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_csv_lines() {
        let matcher = DomainMatcher::new("example.com").unwrap();
        let body = "www.example.com,93.184.216.34\nmail.example.com,93.184.216.35\ncdn.other.net,1.2.3.4\nAPI count exceeded";

        let names = HackerTarget::new().extract(body, &matcher);
        assert_eq!(names, vec!["www.example.com", "mail.example.com"]);
    }

    #[test]
    fn test_error_body_yields_nothing() {
        let matcher = DomainMatcher::new("example.com").unwrap();
        assert!(HackerTarget::new()
            .extract("error check your search parameter", &matcher)
            .is_empty());
    }
}
