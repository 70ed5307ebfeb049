// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Service Fingerprint Scanner
 * Runs a service profile across many targets with bounded concurrency
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod liferay;
pub mod tomcat;

use crate::engine::FingerprintEngine;
use crate::errors::{ReconError, ReconResult};
use crate::http_client::HttpClient;
use crate::probes::{HttpProbe, Probe, ProbeDef};
use crate::types::{Target, Verdict};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// How a parsed target is bound before the engine runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum Binding {
    /// Scheme and port exactly as given
    AsGiven,
    /// `http://` first, `https://` when nothing matched
    DualScheme,
    /// One verdict per port unless the target names a port itself
    PortSweep { ports: Vec<u16> },
}

impl Default for Binding {
    fn default() -> Self {
        Binding::AsGiven
    }
}

/// A named probe cascade, pure data until built against an HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceProfile {
    pub name: String,
    #[serde(default)]
    pub binding: Binding,
    pub probes: Vec<ProbeDef>,
}

impl ServiceProfile {
    /// Compile every signature and instantiate the probes
    pub fn build_probes(&self, http_client: &Arc<HttpClient>) -> ReconResult<Vec<Arc<dyn Probe>>> {
        if self.probes.is_empty() {
            return Err(ReconError::Configuration(format!(
                "Profile '{}' defines no probes",
                self.name
            )));
        }

        self.probes
            .iter()
            .map(|def| {
                HttpProbe::from_def(def, Arc::clone(http_client))
                    .map(|probe| Arc::new(probe) as Arc<dyn Probe>)
            })
            .collect()
    }
}

/// Built-in profile by name
pub fn builtin_profile(name: &str, tomcat_ports: &[u16]) -> Option<ServiceProfile> {
    match name.to_ascii_lowercase().as_str() {
        tomcat::PROFILE_NAME => Some(tomcat::profile(tomcat_ports)),
        liferay::PROFILE_NAME => Some(liferay::profile()),
        _ => None,
    }
}

pub struct FingerprintScanner {
    name: String,
    engine: FingerprintEngine,
    binding: Binding,
    concurrency: usize,
}

impl FingerprintScanner {
    pub fn new(name: &str, engine: FingerprintEngine, binding: Binding, concurrency: usize) -> Self {
        Self {
            name: name.to_string(),
            engine,
            binding,
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_profile(
        profile: &ServiceProfile,
        http_client: &Arc<HttpClient>,
        timeout: Duration,
        concurrency: usize,
    ) -> ReconResult<Self> {
        let probes = profile.build_probes(http_client)?;
        info!(
            "Loaded profile '{}' with {} probes ({:?})",
            profile.name,
            probes.len(),
            profile.binding
        );
        Ok(Self::new(
            &profile.name,
            FingerprintEngine::new(probes, timeout),
            profile.binding.clone(),
            concurrency,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All verdicts for one target under the profile's binding
    pub async fn fingerprint(&self, target: &Target) -> Vec<Verdict> {
        match &self.binding {
            Binding::AsGiven => vec![self.engine.identify(target).await],
            Binding::DualScheme => vec![self.engine.identify_dual_scheme(target).await],
            Binding::PortSweep { ports } => {
                if target.port.is_some() {
                    vec![self.engine.identify(target).await]
                } else {
                    self.engine.sweep_ports(target, ports).await
                }
            }
        }
    }

    /// Verdicts in completion order; no new target starts once `cancel` fires
    pub fn scan<'a>(
        &'a self,
        targets: Vec<Target>,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Verdict> + 'a {
        debug!(scanner = %self.name, targets = targets.len(), "Starting fingerprint scan");

        stream::iter(targets)
            .take_while(move |_| futures::future::ready(!cancel.is_cancelled()))
            .map(move |target| async move { self.fingerprint(&target).await })
            .buffer_unordered(self.concurrency)
            .flat_map(stream::iter)
    }

    pub async fn scan_all(&self, targets: Vec<Target>, cancel: CancellationToken) -> Vec<Verdict> {
        self.scan(targets, cancel).collect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles() {
        let tomcat = builtin_profile("Tomcat", &[8080]).unwrap();
        assert_eq!(tomcat.binding, Binding::PortSweep { ports: vec![8080] });
        assert_eq!(builtin_profile("liferay", &[]).unwrap().binding, Binding::DualScheme);
        assert!(builtin_profile("jboss", &[]).is_none());
    }

    #[test]
    fn test_profile_from_yaml() {
        let yaml = r#"
name: jenkins
binding:
  mode: dual-scheme
probes:
  - id: header-check
    kind: header-check
    signatures:
      - name: x-jenkins
        surface: { type: header, name: X-Jenkins }
        matcher: { kind: present }
  - id: login-page
    kind: path-probe
    paths: ["/login"]
    status: { exact: 200 }
    label: Jenkins login page
    signatures:
      - name: title
        surface: { type: body }
        matcher: { kind: contains, needle: "Sign in [Jenkins]" }
"#;
        let profile: ServiceProfile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(profile.binding, Binding::DualScheme);
        assert_eq!(profile.probes.len(), 2);
        assert_eq!(profile.probes[1].label.as_deref(), Some("Jenkins login page"));

        let client = Arc::new(HttpClient::new(5).unwrap());
        assert_eq!(profile.build_probes(&client).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_profile_is_configuration_error() {
        let profile = ServiceProfile {
            name: "empty".into(),
            binding: Binding::AsGiven,
            probes: Vec::new(),
        };
        let client = Arc::new(HttpClient::new(5).unwrap());
        assert!(matches!(profile.build_probes(&client), Err(ReconError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_cancelled_scan_starts_nothing() {
        let client = Arc::new(HttpClient::new(1).unwrap());
        let scanner =
            FingerprintScanner::from_profile(&liferay::profile(), &client, Duration::from_secs(1), 4).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let verdicts = scanner
            .scan_all(vec![Target::new("unreachable.invalid")], cancel)
            .await;
        assert!(verdicts.is_empty());
    }
}
