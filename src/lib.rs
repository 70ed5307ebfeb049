// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Recon Scanner Library
 * Service fingerprinting and rate-limited intelligence aggregation
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod config;
pub mod errors;
pub mod http_client;
pub mod rate_limiter;
pub mod retry;
pub mod types;

// Fingerprinting
pub mod engine;
pub mod extractor;
pub mod probes;
pub mod scanners;

// Remote intelligence
pub mod aggregator;
pub mod query;

// Enumeration helpers
pub mod discovery;

pub mod reporting;

pub use errors::{ReconError, ReconResult};
pub use types::{PrimaryItem, ProbeResult, QueryItem, Scheme, Target, Verdict};
