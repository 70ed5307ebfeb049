// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - GitHub PoC Source
 * Repository search for public exploit code per CVE
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use super::{parse_json, RemoteSource, SourceOutcome};
use crate::errors::{ReconError, ReconResult};
use crate::http_client::{ApiAuth, ApiRequest, HttpClient, HttpResponse};
use crate::rate_limiter::Pacer;
use crate::types::QueryItem;
use serde::Deserialize;
use tracing::info;

pub const SOURCE_NAME: &str = "github";
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Marker reported for a CVE with zero matching repositories
pub const NO_POCS_MARKER: &str = "No PoCs found";

const NO_DESCRIPTION: &str = "No description available";
const ACCEPT: &str = "application/vnd.github.v3+json";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<Repository>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    name: String,
    html_url: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    rate: RateWindow,
}

/// Core API quota as reported by `/rate_limit`
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct RateWindow {
    pub remaining: u64,
    /// Unix timestamp when the window resets
    pub reset: i64,
}

pub struct GitHubSource {
    base_url: String,
    token: String,
}

impl GitHubSource {
    pub fn new(token: &str) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    pub fn with_base_url(base_url: &str, token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Quota pre-flight. An exhausted quota is an error, not a warning.
    /// Takes a slot on the same pacer as the searches that follow.
    pub async fn check_rate_limit(&self, http_client: &HttpClient, pacer: &Pacer) -> ReconResult<RateWindow> {
        pacer.wait_for_slot().await;
        let request = ApiRequest::get(format!("{}/rate_limit", self.base_url))
            .header("Accept", ACCEPT)
            .auth(ApiAuth::Token(self.token.clone()));

        let response = http_client.execute(&request).await?;
        match response.status_code {
            200 => {}
            401 | 403 => {
                return Err(ReconError::AuthFailure {
                    source_name: SOURCE_NAME.to_string(),
                    reason: "token rejected by /rate_limit".to_string(),
                })
            }
            status => {
                return Err(ReconError::UnexpectedStatus {
                    status_code: status,
                    url: request.url,
                })
            }
        }

        let window = parse_json::<RateLimitResponse>(SOURCE_NAME, &response)?.rate;
        let resets_at = chrono::DateTime::<chrono::Utc>::from_timestamp(window.reset, 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| window.reset.to_string());
        info!(
            "GitHub API calls remaining: {} (window resets at {})",
            window.remaining, resets_at
        );

        if window.remaining == 0 {
            return Err(ReconError::RateLimitExceeded {
                source_name: SOURCE_NAME.to_string(),
                attempts: 0,
            });
        }
        Ok(window)
    }
}

impl RemoteSource for GitHubSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn build_request(&self, key: &str) -> ApiRequest {
        ApiRequest::get(format!("{}/search/repositories", self.base_url))
            .query("q", &format!("{} exploit", key))
            .header("Accept", ACCEPT)
            .auth(ApiAuth::Token(self.token.clone()))
    }

    fn parse(&self, _key: &str, response: &HttpResponse) -> ReconResult<SourceOutcome> {
        let search: SearchResponse = parse_json(SOURCE_NAME, response)?;
        let items = search
            .items
            .into_iter()
            .map(|repo| {
                let description = repo
                    .description
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| NO_DESCRIPTION.to_string());
                QueryItem::new(repo.name)
                    .with_url(repo.html_url)
                    .with_description(description)
            })
            .collect();
        Ok(SourceOutcome::Items(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status_code: 200,
            body: body.to_string(),
            headers: HashMap::new(),
            cookies: Vec::new(),
            duration_ms: 1,
        }
    }

    #[test]
    fn test_parse_repositories() {
        let source = GitHubSource::new("t");
        let body = r#"{"total_count": 2, "items": [
            {"name": "CVE-2020-1938", "html_url": "https://github.com/a/CVE-2020-1938", "description": "Ghostcat PoC"},
            {"name": "ghostcat", "html_url": "https://github.com/b/ghostcat", "description": null}
        ]}"#;

        match source.parse("CVE-2020-1938", &ok(body)).unwrap() {
            SourceOutcome::Items(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].url.as_deref(), Some("https://github.com/a/CVE-2020-1938"));
                assert_eq!(items[1].description.as_deref(), Some(NO_DESCRIPTION));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_missing_items_is_malformed() {
        let source = GitHubSource::new("t");
        let err = source.parse("CVE-1", &ok(r#"{"message": "Validation Failed"}"#)).unwrap_err();
        assert!(matches!(err, ReconError::MalformedUpstream { .. }));
    }

    #[test]
    fn test_request_shape() {
        let request = GitHubSource::with_base_url("http://localhost:1/", "t0k").build_request("CVE-2021-44228");
        assert_eq!(request.url, "http://localhost:1/search/repositories");
        assert_eq!(request.query, vec![("q".to_string(), "CVE-2021-44228 exploit".to_string())]);
    }
}
