// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Fingerprint Probes
 * One bounded HTTP check per probe, evaluated by the evidence extractor
 *
 * Probe kinds:
 * - header-check / cookie-check / body-check: the target's base page
 * - path-probe: fixed path list, first positive wins
 * - method-probe: OPTIONS/PUT/DELETE against one path
 * - vulnerability-probe: (path, label) indicators, a hit reports the label
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod http_probe;

pub use http_probe::HttpProbe;

use crate::extractor::SignatureDef;
use crate::types::{ProbeResult, Target};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single fingerprinting signal check.
///
/// Implementations never return errors: network failures are folded into
/// `ProbeResult::error` so the engine treats them as "no evidence".
#[async_trait]
pub trait Probe: Send + Sync {
    fn id(&self) -> &str;

    async fn run(&self, target: &Target, timeout: Duration) -> ProbeResult;
}

/// Status a response must carry before signatures are evaluated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusRequirement {
    #[default]
    Any,
    Success,
    Exact(u16),
}

impl StatusRequirement {
    pub fn accepts(&self, status_code: u16) -> bool {
        match self {
            StatusRequirement::Any => true,
            StatusRequirement::Success => (200..300).contains(&status_code),
            StatusRequirement::Exact(code) => *code == status_code,
        }
    }
}

/// A path whose presence indicates a known weakness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicator {
    pub path: String,
    pub label: String,
    #[serde(default)]
    pub status: StatusRequirement,
}

impl Indicator {
    pub fn new(path: &str, label: &str, status: StatusRequirement) -> Self {
        Self {
            path: path.to_string(),
            label: label.to_string(),
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProbeKind {
    HeaderCheck,
    CookieCheck,
    BodyCheck,
    PathProbe {
        paths: Vec<String>,
    },
    MethodProbe {
        methods: Vec<String>,
        #[serde(default = "default_path")]
        path: String,
    },
    VulnerabilityProbe {
        indicators: Vec<Indicator>,
    },
}

fn default_path() -> String {
    "/".to_string()
}

impl ProbeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProbeKind::HeaderCheck => "header-check",
            ProbeKind::CookieCheck => "cookie-check",
            ProbeKind::BodyCheck => "body-check",
            ProbeKind::PathProbe { .. } => "path-probe",
            ProbeKind::MethodProbe { .. } => "method-probe",
            ProbeKind::VulnerabilityProbe { .. } => "vulnerability-probe",
        }
    }
}

/// Probe description as it appears in a service profile file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeDef {
    pub id: String,
    #[serde(flatten)]
    pub kind: ProbeKind,
    #[serde(default)]
    pub status: StatusRequirement,
    /// Evidence reported when a match carries no value of its own
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub signatures: Vec<SignatureDef>,
}
