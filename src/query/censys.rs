// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Censys Host Search
 * Open ports and services per IP for a domain, address or CIDR range
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use super::{parse_json, RemoteSource, SourceOutcome};
use crate::errors::ReconResult;
use crate::http_client::{ApiAuth, ApiRequest, HttpResponse};
use crate::types::QueryItem;
use serde::Deserialize;
use serde_json::json;

pub const SOURCE_NAME: &str = "censys";
pub const DEFAULT_BASE_URL: &str = "https://search.censys.io/api/v2";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: SearchResult,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(default)]
    ip: Option<String>,
    #[serde(default)]
    services: Vec<Service>,
}

#[derive(Debug, Deserialize)]
struct Service {
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    service_name: Option<String>,
}

/// Ports and service names observed on one IP
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostServices {
    pub ip: String,
    pub ports: Vec<String>,
    pub services: Vec<String>,
}

impl HostServices {
    fn to_item(&self) -> QueryItem {
        QueryItem::new(self.ip.clone()).with_description(format!(
            "Ports: {} - Services: {}",
            self.ports.join(", "),
            self.services.join(", ")
        ))
    }
}

/// `ip:` for CIDR ranges and dotted-numeric addresses, `domain:` otherwise
pub fn build_query(target: &str) -> String {
    let target = target.trim();
    let numeric = target.chars().any(|c| c.is_ascii_digit())
        && target.chars().all(|c| c.is_ascii_digit() || c == '.');
    if target.contains('/') || numeric {
        format!("ip:{}", target)
    } else {
        format!("domain:{}", target)
    }
}

pub struct CensysSource {
    base_url: String,
    api_id: String,
    api_secret: String,
}

impl CensysSource {
    pub fn new(api_id: &str, api_secret: &str) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_id, api_secret)
    }

    pub fn with_base_url(base_url: &str, api_id: &str, api_secret: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_id: api_id.to_string(),
            api_secret: api_secret.to_string(),
        }
    }
}

/// Merge hits per IP in first-seen order. Hits without services are dropped.
fn aggregate_hits(hits: Vec<Hit>) -> Vec<HostServices> {
    let mut hosts: Vec<HostServices> = Vec::new();

    for hit in hits {
        let ip = hit.ip.unwrap_or_else(|| "N/A".to_string());
        for service in hit.services {
            let index = match hosts.iter().position(|h| h.ip == ip) {
                Some(index) => index,
                None => {
                    hosts.push(HostServices {
                        ip: ip.clone(),
                        ..HostServices::default()
                    });
                    hosts.len() - 1
                }
            };
            let host = &mut hosts[index];
            host.ports.push(
                service
                    .port
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "N/A".to_string()),
            );
            host.services
                .push(service.service_name.unwrap_or_else(|| "N/A".to_string()));
        }
    }

    hosts
}

impl RemoteSource for CensysSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn build_request(&self, key: &str) -> ApiRequest {
        ApiRequest::post(format!("{}/hosts/search", self.base_url))
            .header("Accept", "application/json")
            .auth(ApiAuth::Basic {
                username: self.api_id.clone(),
                password: self.api_secret.clone(),
            })
            .json(&json!({ "q": build_query(key) }))
    }

    fn parse(&self, _key: &str, response: &HttpResponse) -> ReconResult<SourceOutcome> {
        let search: SearchResponse = parse_json(SOURCE_NAME, response)?;
        let items = aggregate_hits(search.result.hits)
            .iter()
            .map(HostServices::to_item)
            .collect();
        Ok(SourceOutcome::Items(items))
    }
}
