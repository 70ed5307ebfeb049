// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Recon Error Types
 * Error taxonomy shared by probes, query clients and the aggregator
 *
 * Errors are scoped to the smallest unit of work (one probe, one source,
 * one query key). Only configuration errors abort a run.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::time::Duration;
use thiserror::Error;

/// Main error type for the recon toolkit
#[derive(Error, Debug)]
pub enum ReconError {
    /// Timeouts, refused connections, DNS failures
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Unexpected HTTP status from a remote API
    #[error("HTTP {status_code} from {url}")]
    UnexpectedStatus { status_code: u16, url: String },

    /// Remote API rejected the supplied credentials
    #[error("Authentication failed for {source_name}: {reason}")]
    AuthFailure { source_name: String, reason: String },

    /// Remote API kept throttling after the retry budget was spent
    #[error("Rate limit exceeded for {source_name} after {attempts} attempts")]
    RateLimitExceeded { source_name: String, attempts: u32 },

    /// Response payload did not have the expected shape
    #[error("Malformed response from {source_name}: {reason}")]
    MalformedUpstream { source_name: String, reason: String },

    /// Upstream reported an error in an otherwise successful response
    #[error("{source_name} reported: {message}")]
    Upstream { source_name: String, message: String },

    /// A requested source has no credentials configured
    #[error("Missing credentials for {source_name}: {hint}")]
    MissingCredentials { source_name: String, hint: String },

    /// Invalid configuration values
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Target string could not be parsed
    #[error("Invalid target '{0}'")]
    InvalidTarget(String),

    /// Signature pattern failed to compile
    #[error("Invalid signature pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    /// Run was cancelled
    #[error("Operation cancelled")]
    Cancelled,
}

/// Network-level failures, always treated as transient
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection timeout after {timeout:?} to {url}")]
    ConnectionTimeout { url: String, timeout: Duration },

    #[error("Connection refused for {url}")]
    ConnectionRefused { url: String },

    #[error("Too many redirects for {url}")]
    TooManyRedirects { url: String },

    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Connection dropped or failed while the body was streaming
    #[error("Failed reading body from {url}: {reason}")]
    BodyRead { url: String, reason: String },

    #[error("Network error: {0}")]
    Other(String),
}

impl NetworkError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::ConnectionTimeout { .. } => true,
            NetworkError::ConnectionRefused { .. } => false,
            NetworkError::TooManyRedirects { .. } => false,
            NetworkError::InvalidUrl { .. } => false,
            NetworkError::BodyRead { .. } => true,
            NetworkError::Other(_) => false,
        }
    }
}

impl ReconError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ReconError::Network(e) => e.is_retryable(),
            ReconError::UnexpectedStatus { status_code, .. } => {
                matches!(status_code, 408 | 429 | 502 | 503 | 504)
            }
            _ => false,
        }
    }
}

/// Convert reqwest errors to our error types
impl From<reqwest::Error> for ReconError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();

        if err.is_timeout() {
            ReconError::Network(NetworkError::ConnectionTimeout {
                url,
                timeout: Duration::ZERO,
            })
        } else if err.is_connect() {
            ReconError::Network(NetworkError::ConnectionRefused { url })
        } else if err.is_redirect() {
            ReconError::Network(NetworkError::TooManyRedirects { url })
        } else if err.is_builder() {
            ReconError::Network(NetworkError::InvalidUrl { url })
        } else if let Some(status) = err.status() {
            ReconError::UnexpectedStatus {
                status_code: status.as_u16(),
                url,
            }
        } else {
            ReconError::Network(NetworkError::Other(err.to_string()))
        }
    }
}

impl From<regex::Error> for ReconError {
    fn from(err: regex::Error) -> Self {
        ReconError::Pattern {
            pattern: String::new(),
            reason: err.to_string(),
        }
    }
}

/// Result type for recon operations
pub type ReconResult<T> = Result<T, ReconError>;
