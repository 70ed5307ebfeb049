// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Discovery Module
 * Line sources for subdomain and archived-URL enumeration
 *
 * A `LineSource` maps a domain to a lazy, finite stream of strings. Calling
 * `lines` again for the same domain starts a fresh stream.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod archived_urls;
pub mod subdomain_discovery;

pub use archived_urls::{ArchivedUrlScanner, ArchiveReport, DEFAULT_SENSITIVE_KEYWORDS};
pub use subdomain_discovery::{SubdomainDiscovery, SubdomainReport};

use crate::http_client::HttpClient;
use crate::types::input_lines;
use futures::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub trait LineSource: Send + Sync {
    fn name(&self) -> &str;

    fn lines(&self, domain: &str) -> BoxStream<'static, String>;
}

/// Fixed lines per domain. Domains without an entry yield nothing.
#[derive(Debug, Clone, Default)]
pub struct StaticLines {
    by_domain: HashMap<String, Vec<String>>,
}

impl StaticLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lines<I, S>(mut self, domain: &str, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by_domain
            .insert(domain.to_string(), lines.into_iter().map(Into::into).collect());
        self
    }
}

impl LineSource for StaticLines {
    fn name(&self) -> &str {
        "static"
    }

    fn lines(&self, domain: &str) -> BoxStream<'static, String> {
        let lines = self.by_domain.get(domain).cloned().unwrap_or_default();
        stream::iter(lines).boxed()
    }
}

/// Newline-delimited file read on each call; blank lines and `#` comments are skipped
#[derive(Debug, Clone)]
pub struct FileLines {
    path: PathBuf,
}

impl FileLines {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LineSource for FileLines {
    fn name(&self) -> &str {
        "file"
    }

    fn lines(&self, _domain: &str) -> BoxStream<'static, String> {
        let path = self.path.clone();
        stream::once(async move {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => input_lines(&content),
                Err(e) => {
                    warn!("Failed to read {}: {}", path.display(), e);
                    Vec::new()
                }
            }
        })
        .flat_map(stream::iter)
        .boxed()
    }
}

#[derive(Debug, Deserialize)]
struct CertTransparencyEntry {
    name_value: String,
}

/// Subdomains from certificate transparency logs (crt.sh)
pub struct CertTransparencyLines {
    http_client: Arc<HttpClient>,
    base_url: String,
    timeout: Duration,
}

impl CertTransparencyLines {
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self::with_base_url(http_client, "https://crt.sh")
    }

    pub fn with_base_url(http_client: Arc<HttpClient>, base_url: &str) -> Self {
        let timeout = http_client.timeout();
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

/// Wildcard and leading-dot prefixes stripped, lowercased, unique in first-seen order
fn clean_ct_names(entries: Vec<CertTransparencyEntry>) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .flat_map(|entry| entry.name_value.lines())
        .map(|name| {
            name.trim()
                .to_lowercase()
                .trim_start_matches("*.")
                .trim_start_matches('.')
                .to_string()
        })
        .filter(|name| !name.is_empty() && !name.contains('*'))
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

impl LineSource for CertTransparencyLines {
    fn name(&self) -> &str {
        "crt.sh"
    }

    fn lines(&self, domain: &str) -> BoxStream<'static, String> {
        let http_client = Arc::clone(&self.http_client);
        let url = format!("{}/?q=%25.{}&output=json", self.base_url, domain);
        let timeout = self.timeout;

        stream::once(async move {
            let response = match http_client.get(&url, timeout).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Certificate transparency query failed: {}", e);
                    return Vec::new();
                }
            };
            match serde_json::from_str::<Vec<CertTransparencyEntry>>(&response.body) {
                Ok(entries) => clean_ct_names(entries),
                Err(e) => {
                    warn!("Malformed crt.sh response: {}", e);
                    Vec::new()
                }
            }
        })
        .flat_map(stream::iter)
        .boxed()
    }
}

/// Archived URLs for a domain from the Wayback Machine CDX index
pub struct WaybackLines {
    http_client: Arc<HttpClient>,
    base_url: String,
    timeout: Duration,
}

impl WaybackLines {
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self::with_base_url(http_client, "https://web.archive.org")
    }

    pub fn with_base_url(http_client: Arc<HttpClient>, base_url: &str) -> Self {
        let timeout = http_client.timeout();
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

impl LineSource for WaybackLines {
    fn name(&self) -> &str {
        "wayback"
    }

    fn lines(&self, domain: &str) -> BoxStream<'static, String> {
        let http_client = Arc::clone(&self.http_client);
        let url = format!(
            "{}/cdx/search/cdx?url=*.{}/*&output=text&fl=original&collapse=urlkey&filter=!statuscode:404",
            self.base_url, domain
        );
        let timeout = self.timeout;

        stream::once(async move {
            match http_client.get(&url, timeout).await {
                Ok(response) if response.is_success() => {
                    debug!("Wayback index returned {} bytes", response.body.len());
                    response
                        .body
                        .lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                }
                Ok(response) => {
                    warn!("Wayback index answered {}", response.status_code);
                    Vec::new()
                }
                Err(e) => {
                    warn!("Wayback index query failed: {}", e);
                    Vec::new()
                }
            }
        })
        .flat_map(stream::iter)
        .boxed()
    }
}
