// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::errors::{NetworkError, ReconError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// URL scheme a target is bound to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Default for Scheme {
    fn default() -> Self {
        Scheme::Http
    }
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    /// Scheme conventionally served on a port (443 is TLS, everything else plain)
    pub fn for_port(port: u16) -> Self {
        if port == 443 {
            Scheme::Https
        } else {
            Scheme::Http
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An addressable endpoint. Bindings (`with_scheme`, `with_port`) return new values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Target {
    pub host: String,
    /// Only set when the input named a port (`:80` included)
    pub port: Option<u16>,
    pub scheme: Scheme,
    /// Mount point of the application, no trailing slash (`/portal`)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base_path: String,
}

impl Target {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            scheme: Scheme::Http,
            base_path: String::new(),
        }
    }

    pub fn with_scheme(&self, scheme: Scheme) -> Self {
        Self {
            scheme,
            ..self.clone()
        }
    }

    pub fn with_port(&self, port: u16) -> Self {
        Self {
            port: Some(port),
            ..self.clone()
        }
    }

    /// Base URL without trailing slash, e.g. `https://example.com:8443/portal`
    pub fn base_url(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}{}", self.scheme, self.host, port, self.base_path),
            None => format!("{}://{}{}", self.scheme, self.host, self.base_path),
        }
    }

    /// Join an absolute path onto the base URL
    pub fn url_for(&self, path: &str) -> String {
        if path.is_empty() || path == "/" {
            return self.base_url();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url(), path)
        } else {
            format!("{}/{}", self.base_url(), path)
        }
    }

    /// `host` or `host:port`, the form written to fingerprint results
    pub fn display_host(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }
}

impl FromStr for Target {
    type Err = ReconError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ReconError::InvalidTarget(input.to_string()));
        }

        let (scheme, candidate) = if trimmed.contains("://") {
            (None, trimmed.to_string())
        } else {
            (Some(Scheme::Http), format!("http://{}", trimmed))
        };

        let url = Url::parse(&candidate)
            .map_err(|_| ReconError::InvalidTarget(input.to_string()))?;

        let scheme = match scheme {
            Some(s) => s,
            None => match url.scheme() {
                "http" => Scheme::Http,
                "https" => Scheme::Https,
                _ => return Err(ReconError::InvalidTarget(input.to_string())),
            },
        };

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ReconError::InvalidTarget(input.to_string()))?;

        let port = if url.port().is_some() || names_port(&candidate) {
            url.port_or_known_default()
        } else {
            None
        };

        Ok(Self {
            host: host.to_string(),
            port,
            scheme,
            base_path: url.path().trim_end_matches('/').to_string(),
        })
    }
}

/// `Url::port` hides default ports, so look at the authority text itself
fn names_port(url: &str) -> bool {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    let after_host = match host_port.rfind(']') {
        Some(end) => &host_port[end + 1..],
        None => host_port,
    };
    after_host
        .rsplit_once(':')
        .map(|(_, port)| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url())
    }
}

/// Why a probe produced no signal because of the network
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Connection,
    Other,
}

/// Transient error marker carried by a probe result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProbeFailure {
    pub kind: FailureKind,
    pub url: String,
    pub message: String,
}

impl ProbeFailure {
    pub fn from_error(url: &str, err: &ReconError) -> Self {
        let kind = match err {
            ReconError::Network(NetworkError::ConnectionTimeout { .. }) => FailureKind::Timeout,
            ReconError::Network(NetworkError::ConnectionRefused { .. })
            | ReconError::Network(NetworkError::BodyRead { .. }) => FailureKind::Connection,
            _ => FailureKind::Other,
        };
        Self {
            kind,
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

/// Outcome of one probe invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeResult {
    pub probe_id: String,
    pub matched: bool,
    pub evidence: Option<String>,
    pub error: Option<ProbeFailure>,
}

impl ProbeResult {
    pub fn matched(probe_id: &str, evidence: Option<String>) -> Self {
        Self {
            probe_id: probe_id.to_string(),
            matched: true,
            evidence,
            error: None,
        }
    }

    pub fn no_match(probe_id: &str) -> Self {
        Self {
            probe_id: probe_id.to_string(),
            matched: false,
            evidence: None,
            error: None,
        }
    }

    pub fn failed(probe_id: &str, failure: ProbeFailure) -> Self {
        Self {
            probe_id: probe_id.to_string(),
            matched: false,
            evidence: None,
            error: Some(failure),
        }
    }
}

/// Final fingerprinting outcome for one target binding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub target: Target,
    pub detected: bool,
    pub evidence: Option<String>,
    pub matched_probe: Option<String>,
    pub probes_run: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ProbeFailure>,
}

impl Verdict {
    pub fn negative(target: Target, probes_run: usize, errors: Vec<ProbeFailure>) -> Self {
        Self {
            target,
            detected: false,
            evidence: None,
            matched_probe: None,
            probes_run,
            errors,
        }
    }
}

/// One result item returned by a remote source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryItem {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl QueryItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: None,
            description: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Identity used for within-source deduplication
    pub fn identity(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.label)
    }
}

/// An input to the aggregator, e.g. a CVE ID with its description or an email
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrimaryItem {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl PrimaryItem {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Entries of a newline-delimited list; blank lines and `#` comments are skipped
pub fn input_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
