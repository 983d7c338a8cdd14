//! Harvest configuration.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HarvestError, HarvestResult};
use crate::gate::ConcurrencyGate;
use crate::matcher::{normalize_domain, DomainMatcher};

/// How `stop()` treats outstanding work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownMode {
    /// Flip the stop flag and return; publish tasks finish on their own.
    Immediate,
    /// Flip the stop flag, then wait for the domain sweep and every publish
    /// task to finish.
    #[default]
    Drain,
}

impl FromStr for ShutdownMode {
    type Err = HarvestError;

    fn from_str(s: &str) -> HarvestResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(ShutdownMode::Immediate),
            "drain" => Ok(ShutdownMode::Drain),
            other => Err(HarvestError::Config(format!(
                "unknown shutdown mode {:?} (expected immediate or drain)",
                other
            ))),
        }
    }
}

/// HTTP collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout. Default: 30.
    pub timeout_secs: u64,

    /// User-Agent header sent to providers.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("harvest/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Configuration shared by every source in one enumeration run.
///
/// Missing fields deserialize to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Root domains, in the order they are queried.
    pub domains: Vec<String>,

    /// Capacity of the concurrency gate. Default: 100.
    pub max_flow: usize,

    /// What `stop()` does with outstanding work. Default: drain.
    pub shutdown: ShutdownMode,

    pub http: HttpConfig,

    /// Result cap requested from the Entrust CT search. Default: 5000.
    pub entrust_limit: u32,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            domains: Vec::new(),
            max_flow: 100,
            shutdown: ShutdownMode::default(),
            http: HttpConfig::default(),
            entrust_limit: 5000,
        }
    }
}

impl HarvestConfig {
    /// Create a config with default values and no domains.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is read first if present.
    pub fn from_env() -> HarvestResult<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();
        if let Ok(domains) = env::var("HARVEST_DOMAINS") {
            config = config.with_domains(domains.split(','));
        }
        if let Some(max_flow) = parse_var("HARVEST_MAX_FLOW")? {
            config.max_flow = max_flow;
        }
        if let Ok(mode) = env::var("HARVEST_SHUTDOWN_MODE") {
            config.shutdown = mode.parse()?;
        }
        if let Some(timeout) = parse_var("HARVEST_HTTP_TIMEOUT_SECS")? {
            config.http.timeout_secs = timeout;
        }
        if let Ok(user_agent) = env::var("HARVEST_USER_AGENT") {
            config.http.user_agent = user_agent;
        }
        if let Some(limit) = parse_var("HARVEST_ENTRUST_LIMIT")? {
            config.entrust_limit = limit;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values that would stall or crash a run.
    pub fn validate(&self) -> HarvestResult<()> {
        if self.max_flow == 0 || self.max_flow > ConcurrencyGate::MAX_CAPACITY {
            return Err(HarvestError::Config(format!(
                "max_flow must be between 1 and {}, got {}",
                ConcurrencyGate::MAX_CAPACITY,
                self.max_flow
            )));
        }
        if self.http.timeout_secs == 0 {
            return Err(HarvestError::Config("http.timeout_secs must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Set the root domains. Entries are normalized; blank or malformed
    /// entries are dropped, as are repeats.
    pub fn with_domains(mut self, domains: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        self.domains.clear();
        for domain in domains {
            if let Some(domain) = normalize_domain(domain.as_ref()) {
                if !self.domains.contains(&domain) {
                    self.domains.push(domain);
                }
            }
        }
        self
    }

    /// Set the concurrency gate capacity.
    pub fn with_max_flow(mut self, max_flow: usize) -> Self {
        self.max_flow = max_flow;
        self
    }

    /// Set the shutdown mode.
    pub fn with_shutdown(mut self, mode: ShutdownMode) -> Self {
        self.shutdown = mode;
        self
    }

    /// Set the HTTP settings.
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Root domains in query order.
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Compile the matcher for one root domain.
    pub fn domain_matcher(&self, domain: &str) -> HarvestResult<DomainMatcher> {
        DomainMatcher::new(domain)
    }
}

fn parse_var<T: FromStr>(key: &str) -> HarvestResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| HarvestError::Config(format!("{} must be a valid number: {}", key, e))),
        Err(_) => Ok(None),
    }
}
