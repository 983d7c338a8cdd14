//! Source trait: one external data provider.
//!
//! A source only knows how to build its request and how to pull candidate
//! names out of a response body. Fetching, dedup, gating and publishing are
//! handled by [`HarvestService`](crate::HarvestService), so the extraction
//! rules stay pure and testable without a network.

use crate::error::HarvestResult;
use crate::event::SourceTag;
use crate::matcher::DomainMatcher;
use crate::traits::fetcher::FetchRequest;

pub trait Source: Send + Sync + 'static {
    /// Identifier recorded on every event this source emits.
    fn name(&self) -> &str;

    /// Provenance category of this source's discoveries.
    fn tag(&self) -> SourceTag;

    /// Build the provider request for one root domain.
    fn request(&self, domain: &str) -> HarvestResult<FetchRequest>;

    /// Pull candidate names out of a response body.
    ///
    /// Every returned name must satisfy `matcher.is_member`. Order follows
    /// scan order; duplicates are allowed.
    fn extract(&self, body: &str, matcher: &DomainMatcher) -> Vec<String>;
}
