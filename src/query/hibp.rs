// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use super::{is_email, parse_json, RemoteSource, SourceOutcome};
use crate::errors::ReconResult;
use crate::http_client::{ApiRequest, HttpResponse};
use crate::types::QueryItem;
use serde::Deserialize;

pub const SOURCE_NAME: &str = "hibp";
pub const DEFAULT_BASE_URL: &str = "https://haveibeenpwned.com/api/v3";

const USER_AGENT: &str = "CredentialSearcher";

#[derive(Debug, Deserialize)]
struct Breach {
    #[serde(rename = "Name", default)]
    name: Option<String>,
}

/// Have I Been Pwned breached-account lookup. A 404 means no breaches.
pub struct HibpSource {
    base_url: String,
    api_key: String,
}

impl HibpSource {
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

impl RemoteSource for HibpSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    /// Breach lookups are per account; domains go to Dehashed only
    fn accepts(&self, key: &str) -> bool {
        is_email(key)
    }

    fn build_request(&self, key: &str) -> ApiRequest {
        ApiRequest::get(format!("{}/breachedaccount/{}", self.base_url, key.trim()))
            .header("hibp-api-key", &self.api_key)
            .header("user-agent", USER_AGENT)
    }

    fn parse(&self, key: &str, response: &HttpResponse) -> ReconResult<SourceOutcome> {
        let breaches: Vec<Breach> = parse_json(SOURCE_NAME, response)?;
        let items = breaches
            .into_iter()
            .map(|breach| {
                let name = breach.name.unwrap_or_else(|| "Unknown".to_string());
                let description = format!("{} was found in {}", key, name);
                QueryItem::new(name).with_description(description)
            })
            .collect();
        Ok(SourceOutcome::Items(items))
    }
}
