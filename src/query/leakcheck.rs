// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use super::{is_email, parse_json, RemoteSource, SourceOutcome};
use crate::errors::{ReconError, ReconResult};
use crate::http_client::{ApiRequest, HttpResponse};
use crate::types::QueryItem;
use serde::Deserialize;

pub const SOURCE_NAME: &str = "leakcheck";
pub const DEFAULT_BASE_URL: &str = "https://leakcheck.net/api/v1";

#[derive(Debug, Deserialize)]
struct CheckResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Vec<LeakEntry>,
}

#[derive(Debug, Deserialize)]
struct LeakEntry {
    #[serde(default)]
    password: Option<String>,
}

/// LeakCheck email lookup; the key travels as a query parameter
pub struct LeakCheckSource {
    base_url: String,
    api_key: String,
}

impl LeakCheckSource {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

/// Map a `success: false` message onto the error taxonomy
fn classify_failure(message: &str) -> ReconResult<SourceOutcome> {
    let lowered = message.to_lowercase();
    if lowered.contains("not found") || lowered.contains("no results") {
        Ok(SourceOutcome::NotFound)
    } else if lowered.contains("key") || lowered.contains("unauthorized") {
        Err(ReconError::AuthFailure {
            source_name: SOURCE_NAME.to_string(),
            reason: message.to_string(),
        })
    } else if lowered.contains("limit") {
        Err(ReconError::RateLimitExceeded {
            source_name: SOURCE_NAME.to_string(),
            attempts: 1,
        })
    } else {
        Err(ReconError::Upstream {
            source_name: SOURCE_NAME.to_string(),
            message: message.to_string(),
        })
    }
}

impl RemoteSource for LeakCheckSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    /// Queried with type=email, so only addresses are sent
    fn accepts(&self, key: &str) -> bool {
        is_email(key)
    }

    fn build_request(&self, key: &str) -> ApiRequest {
        ApiRequest::get(format!("{}/check", self.base_url))
            .query("key", &self.api_key)
            .query("query", key.trim())
            .query("type", "email")
            .header("Content-Type", "application/json")
    }

    fn parse(&self, key: &str, response: &HttpResponse) -> ReconResult<SourceOutcome> {
        let check: CheckResponse = parse_json(SOURCE_NAME, response)?;
        if !check.success {
            return classify_failure(check.message.as_deref().unwrap_or("Unknown error"));
        }

        let items = check
            .result
            .into_iter()
            .map(|entry| {
                let password = entry.password.unwrap_or_else(|| "N/A".to_string());
                QueryItem::new(format!("{}:{}", key, password))
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
    fn test_parse_passwords() {
        let body = r#"{"success": true, "found": 2, "result": [{"password": "hunter2"}, {"line": "x"}]}"#;
        let outcome = LeakCheckSource::new("k").parse("carol@example.com", &ok(body)).unwrap();
        assert_eq!(
            outcome,
            SourceOutcome::Items(vec![
                QueryItem::new("carol@example.com:hunter2"),
                QueryItem::new("carol@example.com:N/A"),
            ])
        );
    }

    #[test]
    fn test_unsuccessful_messages_are_classified() {
        let source = LeakCheckSource::new("k");
        assert_eq!(
            source.parse("a@b.c", &ok(r#"{"success": false, "message": "Not found"}"#)).unwrap(),
            SourceOutcome::NotFound
        );
        assert!(matches!(
            source.parse("a@b.c", &ok(r#"{"success": false, "message": "Invalid API key"}"#)),
            Err(ReconError::AuthFailure { .. })
        ));
        assert!(matches!(
            source.parse("a@b.c", &ok(r#"{"success": false, "message": "Daily limit reached"}"#)),
            Err(ReconError::RateLimitExceeded { .. })
        ));
        assert!(matches!(
            source.parse("a@b.c", &ok(r#"{"success": false}"#)),
            Err(ReconError::Upstream { .. })
        ));
    }
}
