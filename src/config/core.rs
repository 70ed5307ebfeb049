// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::query::{censys, dehashed, github, hibp, leakcheck, mitre, SourcePolicy};
use crate::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    #[serde(default)]
    pub http: HttpConfig,

    #[validate(nested)]
    #[serde(default)]
    pub fingerprint: FingerprintConfig,

    #[validate(nested)]
    #[serde(default)]
    pub sources: SourcesConfig,

    #[validate(nested)]
    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HttpConfig {
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub user_agent: Option<String>,

    #[validate(range(max = 20))]
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    #[serde(default)]
    pub accept_invalid_certs: bool,

    #[validate(nested)]
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[validate(range(min = 1, max = 1000000))]
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,

    #[validate(range(min = 1, max = 3600))]
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FingerprintConfig {
    #[validate(range(min = 1, max = 1000))]
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[validate(length(min = 1))]
    #[serde(default = "default_tomcat_ports")]
    pub tomcat_ports: Vec<u16>,
}

/// Per-API overrides; unset fields keep the published defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SourceConfig {
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub pacing_ms: Option<u64>,

    #[validate(range(max = 600000))]
    #[serde(default)]
    pub backoff_ms: Option<u64>,

    #[validate(range(min = 1.0, max = 10.0))]
    #[serde(default)]
    pub backoff_multiplier: Option<f64>,

    #[validate(range(min = 1, max = 10))]
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl SourceConfig {
    /// Published defaults for `source` with any configured override applied
    pub fn policy(&self, source: &str) -> SourcePolicy {
        let defaults = SourcePolicy::defaults_for(source);
        let pacing = self.pacing_ms.map(Duration::from_millis).unwrap_or(defaults.pacing);

        let mut retry: RetryConfig = defaults.retry;
        if let Some(backoff_ms) = self.backoff_ms {
            let backoff = Duration::from_millis(backoff_ms);
            let max_backoff = backoff.max(retry.max_backoff);
            retry = retry.with_initial_backoff(backoff).with_max_backoff(max_backoff);
        }
        if let Some(multiplier) = self.backoff_multiplier {
            retry = retry.with_multiplier(multiplier);
        }
        if let Some(max_attempts) = self.max_attempts {
            retry = retry.with_max_attempts(max_attempts);
        }

        SourcePolicy { pacing, retry }
    }

    pub fn base_url_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.base_url.as_deref().unwrap_or(default)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SourcesConfig {
    #[validate(nested)]
    #[serde(default)]
    pub censys: SourceConfig,

    #[validate(nested)]
    #[serde(default)]
    pub github: SourceConfig,

    #[validate(nested)]
    #[serde(default)]
    pub hibp: SourceConfig,

    #[validate(nested)]
    #[serde(default)]
    pub leakcheck: SourceConfig,

    #[validate(nested)]
    #[serde(default)]
    pub dehashed: SourceConfig,

    #[validate(nested)]
    #[serde(default)]
    pub mitre: SourceConfig,
}

impl SourcesConfig {
    pub fn get(&self, source: &str) -> Option<&SourceConfig> {
        match source {
            censys::SOURCE_NAME => Some(&self.censys),
            github::SOURCE_NAME => Some(&self.github),
            hibp::SOURCE_NAME => Some(&self.hibp),
            leakcheck::SOURCE_NAME => Some(&self.leakcheck),
            dehashed::SOURCE_NAME => Some(&self.dehashed),
            mitre::SOURCE_NAME => Some(&self.mitre),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &SourceConfig)> {
        [
            (censys::SOURCE_NAME, &self.censys),
            (github::SOURCE_NAME, &self.github),
            (hibp::SOURCE_NAME, &self.hibp),
            (leakcheck::SOURCE_NAME, &self.leakcheck),
            (dehashed::SOURCE_NAME, &self.dehashed),
            (mitre::SOURCE_NAME, &self.mitre),
        ]
        .into_iter()
    }

    pub fn policy(&self, source: &str) -> SourcePolicy {
        self.get(source)
            .map(|config| config.policy(source))
            .unwrap_or_else(|| SourcePolicy::defaults_for(source))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AggregationConfig {
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_aggregation_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: None,
            max_redirects: default_max_redirects(),
            accept_invalid_certs: false,
            cache: CacheConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            tomcat_ports: default_tomcat_ports(),
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            concurrency: default_aggregation_concurrency(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

fn default_max_redirects() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_cache_capacity() -> u64 {
    1000
}

fn default_cache_ttl() -> u64 {
    60
}

fn default_concurrency() -> usize {
    (num_cpus::get() * 4).clamp(4, 64)
}

fn default_tomcat_ports() -> Vec<u16> {
    crate::scanners::tomcat::DEFAULT_PORTS.to_vec()
}

fn default_aggregation_concurrency() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}
