//! External-Source Subdomain Harvesting
//!
//! Queries third-party data providers (certificate-transparency search,
//! threat-intel aggregators, host search APIs) for names under a root domain,
//! normalizes and deduplicates what comes back, and announces every new name
//! on a [`DiscoveryBus`].
//!
//! # Guarantees
//!
//! - Every emitted name is the root domain or one of its subdomains
//! - A source never emits the same name twice
//! - Outstanding publish work is bounded by a shared [`ConcurrencyGate`]
//! - A failed provider query skips that domain and nothing else
//!
//! # Usage
//!
//! ```rust,ignore
//! use harvest::{DiscoveryBus, HarvestConfig, HarvestPool, HttpFetcher, NEW_NAME};
//!
//! let config = HarvestConfig::new().with_domains(["example.com"]);
//! let fetcher = Arc::new(HttpFetcher::new(&config.http)?);
//! let pool = HarvestPool::new(config, fetcher, DiscoveryBus::new()).with_default_sources();
//!
//! let mut names = pool.bus().subscribe(NEW_NAME).await;
//! pool.start_all().await?;
//! while let Ok(event) = names.recv().await {
//!     println!("{} ({})", event.name, event.source);
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Source, Fetcher and Harvester abstractions
//! - [`sources`] - Provider implementations
//! - [`service`] - Per-source lifecycle wrapper
//! - [`pool`] - Many services over shared resources
//! - [`matcher`] - Per-domain name matching
//! - [`testing`] - Mock fetcher for tests

pub mod bus;
pub mod config;
pub mod error;
pub mod event;
pub mod fetchers;
pub mod filter;
pub mod gate;
pub mod matcher;
pub mod pool;
pub mod service;
pub mod sources;
pub mod testing;
pub mod traits;

pub use bus::{DiscoveryBus, NEW_NAME};
pub use config::{HarvestConfig, HttpConfig, ShutdownMode};
pub use error::{FetchError, FetchResult, HarvestError, HarvestResult};
pub use event::{DiscoveryEvent, SourceTag};
pub use fetchers::HttpFetcher;
pub use filter::NameFilter;
pub use gate::{ConcurrencyGate, GatePermit};
pub use matcher::DomainMatcher;
pub use pool::HarvestPool;
pub use service::{HarvestService, ServiceState};
pub use traits::{
    fetcher::{FetchRequest, Fetcher},
    harvester::Harvester,
    source::Source,
};
