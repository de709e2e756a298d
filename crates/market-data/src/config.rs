//! Externally supplied configuration.
//!
//! The crate never reads credential files itself; hosts either build a
//! [`MarketDataConfig`] programmatically or call
//! [`MarketDataConfig::from_env`] to pick up the conventional environment
//! variables. Configuration is immutable once the service is built.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use crate::provider::RateLimit;

/// Default broadcast tick interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5_000);

/// Default cache entry lifetime.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(60_000);

/// Default per-call deadline wrapped around every adapter call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for one provider. Anything left unset falls back to the
/// adapter's own defaults.
#[derive(Clone, Debug)]
pub struct ProviderSettings {
    /// Switch the provider off entirely; it is not even built.
    pub enabled: bool,

    /// Upstream credential. `None` or a placeholder keeps the adapter in the
    /// chain but permanently unavailable.
    pub api_key: Option<String>,

    /// Overrides the adapter's default priority rank. Lower tries first.
    pub priority: Option<u8>,

    /// Per-call deadline for this provider.
    pub timeout: Duration,

    /// Overrides the adapter's default request budget.
    pub rate_limit: Option<RateLimit>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            priority: None,
            timeout: DEFAULT_CALL_TIMEOUT,
            rate_limit: None,
        }
    }
}

impl ProviderSettings {
    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            ..Self::default()
        }
    }
}

/// Crate-wide configuration.
#[derive(Clone, Debug)]
pub struct MarketDataConfig {
    /// Provider id -> settings. Providers without an entry use defaults.
    pub providers: HashMap<String, ProviderSettings>,

    /// Broadcast loop tick interval.
    pub poll_interval: Duration,

    /// Default cache entry lifetime.
    pub cache_ttl: Duration,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl MarketDataConfig {
    /// Defaults plus credentials from `FINNHUB_API_KEY` and
    /// `ALPHA_VANTAGE_API_KEY` when set. Keyless providers need nothing.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = env::var("FINNHUB_API_KEY") {
            config.providers.entry("FINNHUB".to_string()).or_default().api_key = Some(key);
        }
        if let Ok(key) = env::var("ALPHA_VANTAGE_API_KEY") {
            config
                .providers
                .entry("ALPHA_VANTAGE".to_string())
                .or_default()
                .api_key = Some(key);
        }
        config
    }

    /// Effective settings for a provider; defaults when unconfigured.
    pub fn provider(&self, id: &str) -> ProviderSettings {
        self.providers.get(id).cloned().unwrap_or_default()
    }

    pub fn provider_enabled(&self, id: &str) -> bool {
        self.providers.get(id).map_or(true, |s| s.enabled)
    }

    /// Builder-style override for one provider.
    pub fn with_provider(mut self, id: impl Into<String>, settings: ProviderSettings) -> Self {
        self.providers.insert(id.into(), settings);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}
