// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Archived URL Scanner
 * Flags archived URLs whose path or query hints at sensitive content
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use super::LineSource;
use futures::stream::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_SENSITIVE_KEYWORDS: &[&str] = &[
    "password", "credential", "admin", "login", "secret", "key", "config", "confidential",
    "private", "token", "auth", "session", "account", "database", "root", "backup", "user",
    "username", "access", "secure", "payment", "credit", "card", "billing", "invoice",
    "purchase", "order", "customer", "client", "api", "apikey", "hidden", "internal",
    "sensitive", "temp", "tmp", "test", "development", "dev", "stage", "staging", "uat", "prod",
    "production", "debug", "trace", "error", "bug", "logs", "log", "dump", "import", "export",
    "upload", "download",
];

/// Extensions dropped from the archive listing before keyword matching
const STATIC_ASSET_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".bmp", ".ico", ".tiff", ".webp", ".css", ".woff",
    ".woff2", ".ttf", ".otf",
];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveReport {
    pub domain: String,
    /// URLs considered after asset and script filtering
    pub urls_seen: usize,
    pub sensitive_urls: Vec<String>,
}

pub struct ArchivedUrlScanner {
    source: Arc<dyn LineSource>,
    keywords: Vec<String>,
}

impl ArchivedUrlScanner {
    pub fn new(source: Arc<dyn LineSource>) -> Self {
        Self {
            source,
            keywords: DEFAULT_SENSITIVE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Replace the default keyword list. An empty list keeps the defaults.
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        if !keywords.is_empty() {
            self.keywords = keywords;
        }
        self
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_sensitive(&self, url: &str) -> bool {
        let lowered = url.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }

    fn is_candidate(&self, url: &str) -> bool {
        let lowered = url.to_lowercase();
        let path = lowered.split(['?', '#']).next().unwrap_or(&lowered);
        if STATIC_ASSET_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            return false;
        }
        !path.ends_with(".js") || self.is_sensitive(url)
    }

    pub async fn scan(&self, domain: &str) -> ArchiveReport {
        info!("Scanning archived URLs for {} via {}", domain, self.source.name());

        let urls: Vec<String> = self
            .source
            .lines(domain)
            .filter(|url| futures::future::ready(self.is_candidate(url)))
            .collect()
            .await;

        let sensitive_urls: Vec<String> = urls
            .iter()
            .filter(|url| self.is_sensitive(url))
            .cloned()
            .collect();

        debug!(
            domain = domain,
            seen = urls.len(),
            sensitive = sensitive_urls.len(),
            "Archive scan finished"
        );

        ArchiveReport {
            domain: domain.to_string(),
            urls_seen: urls.len(),
            sensitive_urls,
        }
    }
}
