//! A set of services sharing one bus, gate, config and fetcher.
//!
//! Services run fully in parallel; nothing synchronizes them beyond the
//! shared concurrency gate.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::bus::DiscoveryBus;
use crate::config::HarvestConfig;
use crate::error::HarvestResult;
use crate::gate::ConcurrencyGate;
use crate::service::HarvestService;
use crate::sources::{Entrust, HackerTarget, VirusTotal};
use crate::traits::fetcher::Fetcher;
use crate::traits::harvester::Harvester;
use crate::traits::source::Source;

/// Owns one [`HarvestService`] per registered source.
///
/// # Example
///
/// ```rust,ignore
/// let config = HarvestConfig::from_env()?;
/// let fetcher = Arc::new(HttpFetcher::new(&config.http)?);
/// let pool = HarvestPool::new(config, fetcher, DiscoveryBus::new()).with_default_sources();
///
/// let mut names = pool.bus().subscribe(NEW_NAME).await;
/// pool.start_all().await?;
/// ```
pub struct HarvestPool {
    services: Vec<Box<dyn Harvester>>,
    config: Arc<HarvestConfig>,
    fetcher: Arc<dyn Fetcher>,
    bus: DiscoveryBus,
    gate: ConcurrencyGate,
}

impl HarvestPool {
    /// Create an empty pool. The gate is sized from `config.max_flow`.
    pub fn new(config: HarvestConfig, fetcher: Arc<dyn Fetcher>, bus: DiscoveryBus) -> Self {
        let gate = ConcurrencyGate::new(config.max_flow);
        Self::with_gate(config, fetcher, bus, gate)
    }

    /// Create an empty pool around an existing gate.
    pub fn with_gate(
        config: HarvestConfig,
        fetcher: Arc<dyn Fetcher>,
        bus: DiscoveryBus,
        gate: ConcurrencyGate,
    ) -> Self {
        Self {
            services: Vec::new(),
            config: Arc::new(config),
            fetcher,
            bus,
            gate,
        }
    }

    /// Register every built-in source.
    pub fn with_default_sources(self) -> Self {
        let limit = self.config.entrust_limit;
        self.with_source(Entrust::new(limit))
            .with_source(VirusTotal::new())
            .with_source(HackerTarget::new())
    }

    /// Register a source.
    pub fn with_source<S: Source>(mut self, source: S) -> Self {
        self.add_source(source);
        self
    }

    /// Register a source.
    pub fn add_source<S: Source>(&mut self, source: S) {
        let service = HarvestService::new(
            source,
            Arc::clone(&self.fetcher),
            self.bus.clone(),
            self.gate.clone(),
            Arc::clone(&self.config),
        );
        self.services.push(Box::new(service));
    }

    pub fn bus(&self) -> &DiscoveryBus {
        &self.bus
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Registered source names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Start every service. Services already running are reported after the
    /// rest have been started.
    pub async fn start_all(&self) -> HarvestResult<()> {
        let mut first_err = None;
        for service in &self.services {
            if let Err(e) = service.start().await {
                warn!(source = service.name(), error = %e, "Service failed to start");
                first_err.get_or_insert(e);
            }
        }

        info!(services = self.services.len(), "Harvest pool started");
        first_err.map_or(Ok(()), Err)
    }

    /// Wait for every service's sweep and publish tasks.
    pub async fn join_all(&self) {
        join_all(self.services.iter().map(|s| s.join())).await;
    }

    /// Stop every service with the configured shutdown mode.
    pub async fn stop_all(&self) {
        join_all(self.services.iter().map(|s| s.stop())).await;
        info!(services = self.services.len(), "Harvest pool stopped");
    }

    /// Number of services currently running.
    pub async fn active_count(&self) -> usize {
        let states = join_all(self.services.iter().map(|s| s.is_active())).await;
        states.into_iter().filter(|active| *active).count()
    }
}
