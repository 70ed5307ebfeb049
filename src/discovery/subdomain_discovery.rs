// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Subdomain Discovery
 * Harvests subdomains from a line source and checks which ones serve HTTP
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use super::LineSource;
use crate::http_client::HttpClient;
use crate::types::Scheme;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const LIVENESS_TIMEOUT: Duration = Duration::from_secs(5);
pub const WEB_SERVICE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubdomainReport {
    pub domain: String,
    /// Every harvested name ending in the domain, first-seen order
    pub subdomains: Vec<String>,
    /// Names answering any HTTP response on plain http
    pub live: Vec<String>,
    /// First URL per live name that answered 200
    pub web_services: Vec<String>,
}

pub struct SubdomainDiscovery {
    source: Arc<dyn LineSource>,
    http_client: Arc<HttpClient>,
    concurrency: usize,
    liveness_timeout: Duration,
    web_timeout: Duration,
}

impl SubdomainDiscovery {
    pub fn new(source: Arc<dyn LineSource>, http_client: Arc<HttpClient>, concurrency: usize) -> Self {
        Self {
            source,
            http_client,
            concurrency: concurrency.max(1),
            liveness_timeout: LIVENESS_TIMEOUT,
            web_timeout: WEB_SERVICE_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, liveness: Duration, web_service: Duration) -> Self {
        self.liveness_timeout = liveness;
        self.web_timeout = web_service;
        self
    }

    /// Harvested names that belong to `domain`, deduplicated
    pub async fn harvest(&self, domain: &str) -> Vec<String> {
        let suffix = domain.trim().trim_start_matches('.').to_lowercase();
        let dotted = format!(".{}", suffix);
        let mut seen = HashSet::new();

        self.source
            .lines(&suffix)
            .map(|line| line.trim().trim_end_matches('.').to_lowercase())
            .filter(|name| futures::future::ready(!name.is_empty() && (*name == suffix || name.ends_with(&dotted))))
            .filter(|name| futures::future::ready(seen.insert(name.clone())))
            .collect()
            .await
    }

    /// Any response at all on `http://` counts as live
    pub async fn is_live(&self, subdomain: &str) -> bool {
        let url = format!("{}://{}", Scheme::Http, subdomain);
        self.http_client
            .request_with_method(reqwest::Method::GET, &url, self.liveness_timeout)
            .await
            .is_ok()
    }

    /// First of http/https that answers 200
    pub async fn web_service(&self, subdomain: &str) -> Option<String> {
        for scheme in [Scheme::Http, Scheme::Https] {
            let url = format!("{}://{}", scheme, subdomain);
            match self
                .http_client
                .request_with_method(reqwest::Method::GET, &url, self.web_timeout)
                .await
            {
                Ok(response) if response.status_code == 200 => return Some(url),
                Ok(response) => debug!("{} answered {}", url, response.status_code),
                Err(e) => debug!("{} unreachable: {}", url, e),
            }
        }
        None
    }

    pub async fn discover(&self, domain: &str, cancel: CancellationToken) -> SubdomainReport {
        let subdomains = self.harvest(domain).await;
        info!("Harvested {} subdomains for {} via {}", subdomains.len(), domain, self.source.name());

        let checks: Vec<(String, bool, Option<String>)> = stream::iter(subdomains.clone())
            .take_while(|_| futures::future::ready(!cancel.is_cancelled()))
            .map(|name| async move {
                if !self.is_live(&name).await {
                    return (name, false, None);
                }
                let service = self.web_service(&name).await;
                (name, true, service)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let live: Vec<String> = checks
            .iter()
            .filter(|(_, live, _)| *live)
            .map(|(name, _, _)| name.clone())
            .collect();
        let web_services: Vec<String> = checks.into_iter().filter_map(|(_, _, url)| url).collect();

        info!(
            "{}: {} live subdomains, {} web services",
            domain,
            live.len(),
            web_services.len()
        );

        SubdomainReport {
            domain: domain.to_string(),
            subdomains,
            live,
            web_services,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::StaticLines;

    fn discovery(lines: &[&str]) -> SubdomainDiscovery {
        let source = StaticLines::new().with_lines("example.com", lines.iter().copied());
        let http = Arc::new(HttpClient::new(2).unwrap());
        SubdomainDiscovery::new(Arc::new(source), http, 4)
    }

    #[tokio::test]
    async fn test_harvest_filters_suffix_and_duplicates() {
        let names = discovery(&[
            "api.example.com",
            "API.example.com.",
            "example.org",
            "",
            "dev.example.com",
        ])
        .harvest("example.com")
        .await;
        assert_eq!(names, vec!["api.example.com", "dev.example.com"]);
    }

    #[tokio::test]
    async fn test_harvest_requires_label_boundary() {
        let names = discovery(&[
            "evilexample.com",
            "mail.evilexample.com",
            "example.com",
            "www.example.com",
            "example.com.attacker.net",
        ])
        .harvest("example.com")
        .await;
        assert_eq!(names, vec!["example.com", "www.example.com"]);
    }

    #[tokio::test]
    async fn test_cancelled_discovery_skips_checks() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = discovery(&["api.example.com"]).discover("example.com", cancel).await;
        assert_eq!(report.subdomains, vec!["api.example.com"]);
        assert!(report.live.is_empty());
        assert!(report.web_services.is_empty());
    }
}
