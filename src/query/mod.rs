// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Remote Intelligence Sources
 * Paced, retry-bounded lookups against third-party APIs
 *
 * Each remote API is described by a `RemoteSource` (request shape and
 * payload parsing). `RateLimitedClient` adds the shared pacing clock, the
 * bounded 429 retry loop and status classification on top.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod censys;
pub mod client;
pub mod dehashed;
pub mod github;
pub mod hibp;
pub mod leakcheck;
pub mod mitre;

pub use client::RateLimitedClient;

use crate::errors::ReconResult;
use crate::http_client::{ApiRequest, HttpResponse};
use crate::retry::RetryConfig;
use crate::types::QueryItem;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Terminal outcome of one lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum QueryResponse {
    Success(Vec<QueryItem>),
    Unauthorized,
    NotFound,
    /// Still throttled after the retry budget was spent
    RateLimited,
    TransientError(String),
}

impl QueryResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, QueryResponse::Success(_))
    }
}

impl fmt::Display for QueryResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResponse::Success(items) => write!(f, "{} result(s)", items.len()),
            QueryResponse::Unauthorized => f.write_str("unauthorized"),
            QueryResponse::NotFound => f.write_str("not found"),
            QueryResponse::RateLimited => f.write_str("rate limited"),
            QueryResponse::TransientError(message) => write!(f, "error: {}", message),
        }
    }
}

/// What a source made of a successful HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Items(Vec<QueryItem>),
    NotFound,
}

/// Request shape and payload parsing for one remote API
pub trait RemoteSource: Send + Sync {
    /// Stable API name; also the pacing registry key
    fn name(&self) -> &str;

    /// Keys this API can answer; others are never sent
    fn accepts(&self, _key: &str) -> bool {
        true
    }

    fn build_request(&self, key: &str) -> ApiRequest;

    /// Parse a 2xx response. Errors become `TransientError` or `Unauthorized`.
    fn parse(&self, key: &str, response: &HttpResponse) -> ReconResult<SourceOutcome>;
}

/// Anything the aggregator can ask about a key
#[async_trait]
pub trait Lookup: Send + Sync {
    fn name(&self) -> &str;

    /// Skipped keys get no record from this source
    fn accepts(&self, _key: &str) -> bool {
        true
    }

    async fn lookup(&self, key: &str) -> QueryResponse;
}

/// Pacing and retry budget for one remote API
#[derive(Debug, Clone)]
pub struct SourcePolicy {
    /// Minimum interval between consecutive requests
    pub pacing: Duration,
    pub retry: RetryConfig,
}

impl SourcePolicy {
    pub fn new(pacing: Duration, backoff: Duration, max_attempts: u32) -> Self {
        Self {
            pacing,
            retry: RetryConfig::fixed(max_attempts, backoff),
        }
    }

    /// Published limits of the APIs shipped with the toolkit
    pub fn defaults_for(source: &str) -> Self {
        match source {
            censys::SOURCE_NAME => Self::new(Duration::from_millis(2500), Duration::from_secs(60), 3),
            github::SOURCE_NAME => Self::new(Duration::from_secs(2), Duration::from_secs(10), 3),
            hibp::SOURCE_NAME => Self::new(Duration::from_secs(6), Duration::from_secs(5), 3),
            leakcheck::SOURCE_NAME => Self::new(Duration::from_millis(350), Duration::from_secs(5), 3),
            dehashed::SOURCE_NAME => Self::new(Duration::from_secs(1), Duration::from_secs(5), 3),
            _ => Self::new(Duration::from_secs(1), Duration::from_secs(5), 3),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Leak source selection as exposed on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeakPlatform {
    Dehashed,
    Hibp,
    Leakcheck,
    /// Dehashed and HIBP
    Both,
    All,
}

impl LeakPlatform {
    pub fn sources(&self) -> &'static [&'static str] {
        match self {
            LeakPlatform::Dehashed => &[dehashed::SOURCE_NAME],
            LeakPlatform::Hibp => &[hibp::SOURCE_NAME],
            LeakPlatform::Leakcheck => &[leakcheck::SOURCE_NAME],
            LeakPlatform::Both => &[dehashed::SOURCE_NAME, hibp::SOURCE_NAME],
            LeakPlatform::All => &[dehashed::SOURCE_NAME, hibp::SOURCE_NAME, leakcheck::SOURCE_NAME],
        }
    }
}

impl std::str::FromStr for LeakPlatform {
    type Err = crate::errors::ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dehashed" => Ok(LeakPlatform::Dehashed),
            "hibp" => Ok(LeakPlatform::Hibp),
            "leakcheck" => Ok(LeakPlatform::Leakcheck),
            "both" => Ok(LeakPlatform::Both),
            "all" => Ok(LeakPlatform::All),
            other => Err(crate::errors::ReconError::Configuration(format!(
                "Unknown platform '{}' (expected dehashed, hibp, leakcheck, both or all)",
                other
            ))),
        }
    }
}

/// `local@domain` with both halves present
pub fn is_email(key: &str) -> bool {
    key.trim()
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && !domain.is_empty() && !domain.contains('@'))
        .unwrap_or(false)
}

/// Parse a JSON body into `T`, mapping failures to a malformed-upstream error
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    source_name: &str,
    response: &HttpResponse,
) -> ReconResult<T> {
    serde_json::from_str(&response.body).map_err(|e| crate::errors::ReconError::MalformedUpstream {
        source_name: source_name.to_string(),
        reason: e.to_string(),
    })
}
