// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use super::{is_email, parse_json, RemoteSource, SourceOutcome};
use crate::errors::ReconResult;
use crate::http_client::{ApiAuth, ApiRequest, HttpResponse};
use crate::types::QueryItem;
use serde::Deserialize;
use std::collections::HashSet;

pub const SOURCE_NAME: &str = "dehashed";
pub const DEFAULT_BASE_URL: &str = "https://api.dehashed.com";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    entries: Option<Vec<Entry>>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// Dehashed search. Emails are queried verbatim, anything else as `domain:<key>`.
pub struct DehashedSource {
    base_url: String,
    username: String,
    api_key: String,
}

impl DehashedSource {
    pub fn new(username: &str, api_key: &str) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, username, api_key)
    }

    pub fn with_base_url(base_url: &str, username: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

pub fn search_query(key: &str) -> String {
    let key = key.trim();
    if is_email(key) {
        key.to_string()
    } else {
        format!("domain:{}", key)
    }
}

impl RemoteSource for DehashedSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn build_request(&self, key: &str) -> ApiRequest {
        ApiRequest::get(format!("{}/search", self.base_url))
            .query("query", &search_query(key))
            .header("Accept", "application/json")
            .auth(ApiAuth::Basic {
                username: self.username.clone(),
                password: self.api_key.clone(),
            })
    }

    /// Only entries carrying a password, as unique `email:password` pairs
    fn parse(&self, _key: &str, response: &HttpResponse) -> ReconResult<SourceOutcome> {
        let search: SearchResponse = parse_json(SOURCE_NAME, response)?;
        let mut seen = HashSet::new();

        let items = search
            .entries
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| {
                let password = entry.password.filter(|p| !p.is_empty())?;
                let email = entry.email.unwrap_or_else(|| "N/A".to_string());
                Some(format!("{}:{}", email, password))
            })
            .filter(|credential| seen.insert(credential.clone()))
            .map(QueryItem::new)
            .collect();

        Ok(SourceOutcome::Items(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_query_prefix() {
        assert_eq!(search_query("alice@example.com"), "alice@example.com");
        assert_eq!(search_query(" example.com "), "domain:example.com");
    }

    #[test]
    fn test_only_unique_entries_with_passwords() {
        let response = HttpResponse {
            status_code: 200,
            body: r#"{"success": true, "entries": [
                {"email": "a@example.com", "password": "p1"},
                {"email": "a@example.com", "password": "p1"},
                {"email": "b@example.com", "password": ""},
                {"email": "c@example.com"},
                {"password": "orphan"}
            ]}"#
            .to_string(),
            headers: HashMap::new(),
            cookies: Vec::new(),
            duration_ms: 1,
        };

        let outcome = DehashedSource::new("u", "k").parse("example.com", &response).unwrap();
        assert_eq!(
            outcome,
            SourceOutcome::Items(vec![QueryItem::new("a@example.com:p1"), QueryItem::new("N/A:orphan")])
        );
    }

    #[test]
    fn test_null_entries_is_empty() {
        let response = HttpResponse {
            status_code: 200,
            body: r#"{"entries": null}"#.to_string(),
            headers: HashMap::new(),
            cookies: Vec::new(),
            duration_ms: 1,
        };
        let outcome = DehashedSource::new("u", "k").parse("example.com", &response).unwrap();
        assert_eq!(outcome, SourceOutcome::Items(Vec::new()));
    }
}
