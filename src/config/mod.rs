// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

pub mod core;
pub mod loader;
pub mod secrets;
pub mod validation;

pub use core::{
    AggregationConfig, AppConfig, CacheConfig, FingerprintConfig, HttpConfig, ObservabilityConfig,
    SourceConfig, SourcesConfig,
};

pub use loader::{apply_env_overrides, load_config, load_profile, ConfigFormat, ConfigLoader};

pub use secrets::{Credentials, EnvVarsProvider, SecretsProvider};

pub use validation::ConfigValidator;

use crate::http_client::HttpClient;
use anyhow::Result;

impl AppConfig {
    /// Shared HTTP client with the configured timeout, redirects and response cache
    pub fn http_client(&self) -> Result<HttpClient> {
        let client = HttpClient::with_config(
            self.http.timeout_secs,
            self.http.user_agent.as_deref(),
            self.http.accept_invalid_certs,
            self.http.max_redirects,
        )?;

        Ok(if self.http.cache.enabled {
            client.with_cache(self.http.cache.max_capacity, self.http.cache.ttl_secs)
        } else {
            client
        })
    }

    /// Merge command-line overrides and re-check the result against the file bounds
    pub fn with_overrides(mut self, timeout_secs: Option<u64>, concurrency: Option<usize>) -> Result<Self> {
        if let Some(timeout) = timeout_secs {
            self.http.timeout_secs = timeout;
        }
        if let Some(concurrency) = concurrency {
            self.fingerprint.concurrency = concurrency;
            self.aggregation.concurrency = concurrency;
        }
        ConfigValidator::validate_app_config(&self)?;
        Ok(self)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http.timeout_secs)
    }
}
