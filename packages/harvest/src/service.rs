//! Lifecycle wrapper that drives one [`Source`] across the configured domains.
//!
//! # Flow
//!
//! ```text
//! start()
//!   └─► sweep task (one domain at a time)
//!         ├─► Source::request(domain) ─► Fetcher::fetch
//!         ├─► Source::extract(body, matcher)
//!         └─► per novel name: tracked task
//!               ├─► ConcurrencyGate::acquire(1)   (released on drop)
//!               └─► DiscoveryBus::publish(NEW_NAME, event)
//! ```
//!
//! Stopping is cooperative: the sweep checks the stop flag between domains and
//! an in-flight request is never aborted. [`ShutdownMode::Drain`] additionally
//! waits for the sweep and every publish task. `join()` and `stop()` may wait
//! on the sweep concurrently, and a restart first waits for a sweep left
//! running by an immediate stop.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::bus::{DiscoveryBus, NEW_NAME};
use crate::config::{HarvestConfig, ShutdownMode};
use crate::error::{HarvestError, HarvestResult};
use crate::event::{DiscoveryEvent, SourceTag};
use crate::filter::NameFilter;
use crate::gate::ConcurrencyGate;
use crate::traits::fetcher::Fetcher;
use crate::traits::source::Source;

/// Lifecycle state of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    NotStarted,
    Running,
    Stopped,
}

struct Lifecycle {
    state: ServiceState,
    cancel: CancellationToken,
}

struct Shared<S: Source> {
    source: S,
    fetcher: Arc<dyn Fetcher>,
    bus: DiscoveryBus,
    gate: ConcurrencyGate,
    config: Arc<HarvestConfig>,
    filter: NameFilter,
    publishers: TaskTracker,
    last_active: RwLock<Option<DateTime<Utc>>>,
}

/// Drives a single source: start/stop, domain iteration, dedup and publish.
///
/// # Example
///
/// ```rust,ignore
/// use harvest::{sources::VirusTotal, HarvestService, DiscoveryBus, ConcurrencyGate};
///
/// let service = HarvestService::new(VirusTotal::new(), fetcher, bus, gate, config);
/// service.start().await?;
/// service.join().await;
/// service.stop().await;
/// ```
pub struct HarvestService<S: Source> {
    shared: Arc<Shared<S>>,
    lifecycle: Mutex<Lifecycle>,
    sweeper: TaskTracker,
}

impl<S: Source> HarvestService<S> {
    /// Create a service. Bus, gate, config and fetcher are shared; the name
    /// filter is private to this service.
    pub fn new(
        source: S,
        fetcher: Arc<dyn Fetcher>,
        bus: DiscoveryBus,
        gate: ConcurrencyGate,
        config: Arc<HarvestConfig>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                source,
                fetcher,
                bus,
                gate,
                config,
                filter: NameFilter::new(),
                publishers: TaskTracker::new(),
                last_active: RwLock::new(None),
            }),
            lifecycle: Mutex::new(Lifecycle {
                state: ServiceState::NotStarted,
                cancel: CancellationToken::new(),
            }),
            sweeper: TaskTracker::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.shared.source.name()
    }

    pub fn tag(&self) -> SourceTag {
        self.shared.source.tag()
    }

    pub fn source(&self) -> &S {
        &self.shared.source
    }

    /// Launch the domain sweep in the background and return immediately.
    ///
    /// Fails only if the service is already running. After an immediate
    /// stop, waits for the previous sweep to finish its in-flight query.
    pub async fn start(&self) -> HarvestResult<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.state == ServiceState::Running {
            return Err(HarvestError::AlreadyRunning {
                name: self.name().to_string(),
            });
        }

        self.sweeper.close();
        self.sweeper.wait().await;
        self.sweeper.reopen();

        let cancel = CancellationToken::new();
        self.shared.publishers.reopen();
        self.sweeper.spawn(Arc::clone(&self.shared).sweep(cancel.clone()));

        lifecycle.state = ServiceState::Running;
        lifecycle.cancel = cancel;

        info!(
            source = self.name(),
            domains = self.shared.config.domains().len(),
            "Harvest service started"
        );
        Ok(())
    }

    /// Stop using the configured [`ShutdownMode`].
    pub async fn stop(&self) {
        self.stop_with(self.shared.config.shutdown).await;
    }

    /// Stop with an explicit mode. No-op unless running.
    pub async fn stop_with(&self, mode: ShutdownMode) {
        {
            let mut lifecycle = self.lifecycle.lock().await;
            if lifecycle.state != ServiceState::Running {
                return;
            }
            lifecycle.state = ServiceState::Stopped;
            lifecycle.cancel.cancel();
        }

        info!(source = self.name(), mode = ?mode, "Harvest service stopping");

        if mode == ShutdownMode::Drain {
            self.wait_idle().await;
        }
    }

    /// Wait for the current domain sweep to finish and every publish task it
    /// spawned to complete. Does not change the lifecycle state.
    pub async fn join(&self) {
        self.wait_idle().await;
    }

    pub async fn state(&self) -> ServiceState {
        self.lifecycle.lock().await.state
    }

    /// Liveness signal only; says nothing about whether queries succeeded.
    pub async fn is_active(&self) -> bool {
        self.state().await == ServiceState::Running
    }

    /// Time of the last successful provider response.
    pub async fn last_active(&self) -> Option<DateTime<Utc>> {
        *self.shared.last_active.read().await
    }

    /// Query one root domain now. Returns the number of novel names
    /// dispatched for publishing.
    pub async fn query(&self, domain: &str) -> usize {
        self.shared.query(domain).await
    }

    /// Distinct names this service has dispatched so far.
    pub fn seen_count(&self) -> usize {
        self.shared.filter.len()
    }

    /// The sweep spawns publish tasks, so it is waited on first.
    async fn wait_idle(&self) {
        self.sweeper.close();
        self.sweeper.wait().await;
        self.shared.publishers.close();
        self.shared.publishers.wait().await;
    }
}

impl<S: Source> Shared<S> {
    async fn sweep(self: Arc<Self>, cancel: CancellationToken) {
        for domain in self.config.domains() {
            if cancel.is_cancelled() {
                debug!(source = self.source.name(), "Stop requested, skipping remaining domains");
                break;
            }
            self.query(domain).await;
        }
    }

    async fn query(self: &Arc<Self>, domain: &str) -> usize {
        let source = self.source.name();

        let matcher = match self.config.domain_matcher(domain) {
            Ok(matcher) => matcher,
            Err(e) => {
                warn!(source, domain, error = %e, "Skipping domain");
                return 0;
            }
        };

        let request = match self.source.request(matcher.domain()) {
            Ok(request) => request,
            Err(e) => {
                warn!(source, domain, error = %e, "Failed to build provider request");
                return 0;
            }
        };

        let body = match self.fetcher.fetch(&request).await {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    source,
                    fetcher = self.fetcher.name(),
                    url = %request.url,
                    error = %e,
                    "Provider query failed"
                );
                return 0;
            }
        };
        *self.last_active.write().await = Some(Utc::now());

        let mut dispatched = 0;
        for name in self.source.extract(&body, &matcher) {
            // Enforced here as well as in the matcher; sources are pluggable.
            if !matcher.is_member(&name) || self.filter.is_duplicate(&name) {
                continue;
            }
            self.dispatch(name, matcher.domain());
            dispatched += 1;
        }

        info!(source, domain = matcher.domain(), dispatched, "Domain query complete");
        dispatched
    }

    /// Publish one name on a tracked task holding a gate permit for its whole
    /// lifetime.
    fn dispatch(self: &Arc<Self>, name: String, domain: &str) {
        let shared = Arc::clone(self);
        let domain = domain.to_string();

        self.publishers.spawn(async move {
            let _permit = match shared.gate.acquire(1).await {
                Ok(permit) => permit,
                Err(e) => {
                    warn!(source = shared.source.name(), name = %name, error = %e, "Dropping name");
                    return;
                }
            };

            debug!(source = shared.source.name(), name = %name, domain = %domain, "New name");
            let event = DiscoveryEvent::new(name, domain, shared.source.tag(), shared.source.name());
            shared.bus.publish(NEW_NAME, event).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::VirusTotal;
    use crate::testing::MockFetcher;

    fn service(fetcher: MockFetcher, domains: &[&str]) -> HarvestService<VirusTotal> {
        HarvestService::new(
            VirusTotal::new(),
            Arc::new(fetcher),
            DiscoveryBus::new(),
            ConcurrencyGate::new(4),
            Arc::new(HarvestConfig::new().with_domains(domains)),
        )
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let service = service(MockFetcher::new(), &["example.com"]);
        assert_eq!(service.state().await, ServiceState::NotStarted);

        service.start().await.unwrap();
        assert!(service.is_active().await);

        service.stop().await;
        assert_eq!(service.state().await, ServiceState::Stopped);
        assert!(!service.is_active().await);
    }

    #[tokio::test]
    async fn test_double_start_fails() {
        let service = service(MockFetcher::new(), &["example.com"]);
        service.start().await.unwrap();

        let err = service.start().await.unwrap_err();
        assert!(matches!(err, HarvestError::AlreadyRunning { ref name } if name == "VirusTotal"));

        service.stop().await;
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let service = service(MockFetcher::new(), &["example.com"]);
        service.start().await.unwrap();
        service.stop().await;

        service.start().await.unwrap();
        assert!(service.is_active().await);
        service.stop().await;
    }

    #[tokio::test]
    async fn test_stop_when_not_running_is_noop() {
        let service = service(MockFetcher::new(), &[]);
        service.stop().await;
        assert_eq!(service.state().await, ServiceState::NotStarted);
    }

    #[tokio::test]
    async fn test_query_dedups_within_instance() {
        let url = VirusTotal::new().request("example.com").unwrap().url;
        let fetcher = MockFetcher::new().with_body(&url, "a.example.com b.example.com a.example.com");
        let service = service(fetcher, &[]);

        assert_eq!(service.query("example.com").await, 2);
        assert_eq!(service.query("example.com").await, 0);
        assert_eq!(service.seen_count(), 2);
        assert!(service.last_active().await.is_some());
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_last_active_unset() {
        let url = VirusTotal::new().request("example.com").unwrap().url;
        let service = service(MockFetcher::new().with_failure(&url), &[]);

        assert_eq!(service.query("example.com").await, 0);
        assert!(service.last_active().await.is_none());
    }

    #[tokio::test]
    async fn test_invalid_domain_skipped() {
        let fetcher = MockFetcher::new();
        let service = service(fetcher.clone(), &[]);

        assert_eq!(service.query("bad..domain").await, 0);
        assert_eq!(fetcher.call_count(), 0);
    }
}
