// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use std::env;
use std::fmt;

use crate::errors::{ReconError, ReconResult};
use crate::query::{censys, dehashed, github, hibp, leakcheck};

pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const CENSYS_API_ID: &str = "CENSYS_API_ID";
pub const CENSYS_API_SECRET: &str = "CENSYS_API_SECRET";
pub const DEHASHED_USERNAME: &str = "DEHASHED_USERNAME";
pub const DEHASHED_API_KEY: &str = "DEHASHED_API_KEY";
pub const HIBP_API_KEY: &str = "HIBP_API_KEY";
pub const LEAKCHECK_API_KEY: &str = "LEAKCHECK_API_KEY";

pub trait SecretsProvider: Send + Sync {
    fn get_secret(&self, key: &str) -> Option<String>;
}

pub struct EnvVarsProvider;

impl SecretsProvider for EnvVarsProvider {
    fn get_secret(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

/// Opaque API secrets. Blank values count as missing.
#[derive(Clone, Default)]
pub struct Credentials {
    pub github_token: Option<String>,
    pub censys_api_id: Option<String>,
    pub censys_api_secret: Option<String>,
    pub dehashed_username: Option<String>,
    pub dehashed_api_key: Option<String>,
    pub hibp_api_key: Option<String>,
    pub leakcheck_api_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(value: &Option<String>) -> &'static str {
            if value.as_deref().map(str::trim).filter(|v| !v.is_empty()).is_some() {
                "<set>"
            } else {
                "<unset>"
            }
        }
        f.debug_struct("Credentials")
            .field("github_token", &mask(&self.github_token))
            .field("censys_api_id", &mask(&self.censys_api_id))
            .field("censys_api_secret", &mask(&self.censys_api_secret))
            .field("dehashed_username", &mask(&self.dehashed_username))
            .field("dehashed_api_key", &mask(&self.dehashed_api_key))
            .field("hibp_api_key", &mask(&self.hibp_api_key))
            .field("leakcheck_api_key", &mask(&self.leakcheck_api_key))
            .finish()
    }
}

fn required<'a>(value: &'a Option<String>, source: &str, hint: &str) -> ReconResult<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ReconError::MissingCredentials {
            source_name: source.to_string(),
            hint: hint.to_string(),
        })
}

impl Credentials {
    pub fn from_provider(provider: &dyn SecretsProvider) -> Self {
        Self {
            github_token: provider.get_secret(GITHUB_TOKEN),
            censys_api_id: provider.get_secret(CENSYS_API_ID),
            censys_api_secret: provider.get_secret(CENSYS_API_SECRET),
            dehashed_username: provider.get_secret(DEHASHED_USERNAME),
            dehashed_api_key: provider.get_secret(DEHASHED_API_KEY),
            hibp_api_key: provider.get_secret(HIBP_API_KEY),
            leakcheck_api_key: provider.get_secret(LEAKCHECK_API_KEY),
        }
    }

    pub fn from_env() -> Self {
        Self::from_provider(&EnvVarsProvider)
    }

    /// Fill unset fields from `fallback`
    pub fn or(self, fallback: Credentials) -> Self {
        Self {
            github_token: self.github_token.or(fallback.github_token),
            censys_api_id: self.censys_api_id.or(fallback.censys_api_id),
            censys_api_secret: self.censys_api_secret.or(fallback.censys_api_secret),
            dehashed_username: self.dehashed_username.or(fallback.dehashed_username),
            dehashed_api_key: self.dehashed_api_key.or(fallback.dehashed_api_key),
            hibp_api_key: self.hibp_api_key.or(fallback.hibp_api_key),
            leakcheck_api_key: self.leakcheck_api_key.or(fallback.leakcheck_api_key),
        }
    }

    pub fn github(&self) -> ReconResult<&str> {
        required(&self.github_token, github::SOURCE_NAME, "set --github-token or GITHUB_TOKEN")
    }

    /// (API ID, API secret)
    pub fn censys(&self) -> ReconResult<(&str, &str)> {
        Ok((
            required(&self.censys_api_id, censys::SOURCE_NAME, "set --api-id or CENSYS_API_ID")?,
            required(&self.censys_api_secret, censys::SOURCE_NAME, "set --api-secret or CENSYS_API_SECRET")?,
        ))
    }

    /// (username, API key)
    pub fn dehashed(&self) -> ReconResult<(&str, &str)> {
        Ok((
            required(&self.dehashed_username, dehashed::SOURCE_NAME, "set --dehashed-username or DEHASHED_USERNAME")?,
            required(&self.dehashed_api_key, dehashed::SOURCE_NAME, "set --dehashed-api-key or DEHASHED_API_KEY")?,
        ))
    }

    pub fn hibp(&self) -> ReconResult<&str> {
        required(&self.hibp_api_key, hibp::SOURCE_NAME, "set --hibp-api-key or HIBP_API_KEY")
    }

    pub fn leakcheck(&self) -> ReconResult<&str> {
        required(&self.leakcheck_api_key, leakcheck::SOURCE_NAME, "set --leakcheck-api-key or LEAKCHECK_API_KEY")
    }

    /// Fail before any work starts when a requested source has no credentials
    pub fn ensure(&self, sources: &[&str]) -> ReconResult<()> {
        for source in sources {
            match *source {
                github::SOURCE_NAME => self.github().map(|_| ())?,
                censys::SOURCE_NAME => self.censys().map(|_| ())?,
                dehashed::SOURCE_NAME => self.dehashed().map(|_| ())?,
                hibp::SOURCE_NAME => self.hibp().map(|_| ())?,
                leakcheck::SOURCE_NAME => self.leakcheck().map(|_| ())?,
                _ => {}
            }
        }
        Ok(())
    }
}
