// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use super::{Probe, ProbeDef, ProbeKind, StatusRequirement};
use crate::errors::{NetworkError, ReconError, ReconResult};
use crate::extractor::{compile_all, extract_response, Signature};
use crate::http_client::{HttpClient, HttpResponse};
use crate::types::{ProbeFailure, ProbeResult, Target};
use async_trait::async_trait;
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Probe backed by one or more HTTP requests against the target
pub struct HttpProbe {
    id: String,
    kind: ProbeKind,
    status: StatusRequirement,
    label: Option<String>,
    signatures: Vec<Signature>,
    http_client: Arc<HttpClient>,
}

impl HttpProbe {
    pub fn new(id: &str, kind: ProbeKind, http_client: Arc<HttpClient>) -> Self {
        Self {
            id: id.to_string(),
            kind,
            status: StatusRequirement::Any,
            label: None,
            signatures: Vec::new(),
            http_client,
        }
    }

    pub fn from_def(def: &ProbeDef, http_client: Arc<HttpClient>) -> ReconResult<Self> {
        Ok(Self::new(&def.id, def.kind.clone(), http_client)
            .with_status(def.status)
            .with_signatures(compile_all(&def.signatures)?)
            .with_label_opt(def.label.clone()))
    }

    pub fn with_status(mut self, status: StatusRequirement) -> Self {
        self.status = status;
        self
    }

    pub fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.signatures = signatures;
        self
    }

    pub fn with_label(self, label: &str) -> Self {
        self.with_label_opt(Some(label.to_string()))
    }

    fn with_label_opt(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    async fn fetch(&self, method: Method, url: &str, timeout: Duration) -> ReconResult<HttpResponse> {
        if method == Method::GET {
            // Base page is shared by header/cookie/body checks through the cache
            self.http_client.get(url, timeout).await
        } else {
            self.http_client.request_with_method(method, url, timeout).await
        }
    }

    /// `Some(evidence)` when the response satisfies status and signatures
    fn evaluate(&self, response: &HttpResponse, status: StatusRequirement) -> Option<Option<String>> {
        if !status.accepts(response.status_code) {
            return None;
        }
        if self.signatures.is_empty() {
            return Some(None);
        }
        extract_response(response, &self.signatures).map(|extraction| extraction.value)
    }

    fn positive(&self, evidence: Option<String>) -> ProbeResult {
        ProbeResult::matched(&self.id, evidence.or_else(|| self.label.clone()))
    }

    /// Try requests in order, short-circuiting on the first positive
    async fn run_sequence(
        &self,
        requests: Vec<(Method, String, StatusRequirement, Option<String>)>,
        timeout: Duration,
    ) -> ProbeResult {
        let mut last_failure: Option<ProbeFailure> = None;

        for (method, url, status, indicator_label) in requests {
            match self.fetch(method.clone(), &url, timeout).await {
                Ok(response) => {
                    debug!(
                        probe = %self.id,
                        method = %method,
                        url = %url,
                        status = response.status_code,
                        "Probe response"
                    );
                    // An answered request overrides earlier transport failures
                    last_failure = None;
                    if let Some(evidence) = self.evaluate(&response, status) {
                        let evidence = indicator_label.or(evidence);
                        return self.positive(evidence);
                    }
                }
                Err(e) => {
                    debug!(probe = %self.id, url = %url, error = %e, "Probe request failed");
                    last_failure = Some(ProbeFailure::from_error(&url, &e));
                }
            }
        }

        match last_failure {
            Some(failure) => ProbeResult::failed(&self.id, failure),
            None => ProbeResult::no_match(&self.id),
        }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    fn id(&self) -> &str {
        &self.id
    }

    async fn run(&self, target: &Target, timeout: Duration) -> ProbeResult {
        let requests = match &self.kind {
            ProbeKind::HeaderCheck | ProbeKind::CookieCheck | ProbeKind::BodyCheck => {
                vec![(Method::GET, target.base_url(), self.status, None)]
            }
            ProbeKind::PathProbe { paths } => paths
                .iter()
                .map(|path| (Method::GET, target.url_for(path), self.status, None))
                .collect(),
            ProbeKind::MethodProbe { methods, path } => {
                let mut requests = Vec::with_capacity(methods.len());
                for name in methods {
                    match Method::from_bytes(name.to_ascii_uppercase().as_bytes()) {
                        Ok(method) => requests.push((method, target.url_for(path), self.status, None)),
                        Err(_) => {
                            let err = ReconError::Network(NetworkError::Other(format!(
                                "invalid HTTP method '{}'",
                                name
                            )));
                            return ProbeResult::failed(
                                &self.id,
                                ProbeFailure::from_error(&target.url_for(path), &err),
                            );
                        }
                    }
                }
                requests
            }
            ProbeKind::VulnerabilityProbe { indicators } => indicators
                .iter()
                .map(|indicator| {
                    (
                        Method::GET,
                        target.url_for(&indicator.path),
                        indicator.status,
                        Some(indicator.label.clone()),
                    )
                })
                .collect(),
        };

        self.run_sequence(requests, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Surface;
    use crate::probes::Indicator;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn target_for(server: &MockServer) -> Target {
        server.uri().parse().unwrap()
    }

    fn client() -> Arc<HttpClient> {
        Arc::new(HttpClient::new(5).unwrap())
    }

    #[tokio::test]
    async fn test_path_probe_short_circuits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/docs/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Apache Tomcat 9 Documentation"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/examples/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Apache Tomcat Examples"))
            .expect(0)
            .mount(&server)
            .await;

        let probe = HttpProbe::new(
            "fingerprint-paths",
            ProbeKind::PathProbe {
                paths: vec!["/missing".into(), "/docs/".into(), "/examples/".into()],
            },
            client(),
        )
        .with_status(StatusRequirement::Success)
        .with_signatures(vec![Signature::contains("marker", Surface::Body, "Apache Tomcat")])
        .with_label("Tomcat fingerprint resource");

        let result = probe.run(&target_for(&server), Duration::from_secs(5)).await;
        assert!(result.matched);
        assert_eq!(result.evidence.as_deref(), Some("Apache Tomcat"));
    }

    #[tokio::test]
    async fn test_vulnerability_probe_reports_label() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/AJP/13"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let probe = HttpProbe::new(
            "ajp",
            ProbeKind::VulnerabilityProbe {
                indicators: vec![Indicator::new(
                    "/AJP/13",
                    "Vulnerable to CVE-2020-1938 (Ghostcat)",
                    StatusRequirement::Exact(200),
                )],
            },
            client(),
        );

        let result = probe.run(&target_for(&server), Duration::from_secs(5)).await;
        assert!(result.matched);
        assert_eq!(result.evidence.as_deref(), Some("Vulnerable to CVE-2020-1938 (Ghostcat)"));
    }

    #[tokio::test]
    async fn test_method_probe_uses_requested_verbs() {
        let server = MockServer::start().await;
        Mock::given(method("OPTIONS"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Apache Tomcat/8.5"))
            .mount(&server)
            .await;

        let probe = HttpProbe::new(
            "methods",
            ProbeKind::MethodProbe {
                methods: vec!["options".into(), "PUT".into(), "DELETE".into()],
                path: "/".into(),
            },
            client(),
        )
        .with_status(StatusRequirement::Exact(200))
        .with_signatures(vec![Signature::contains("marker", Surface::Body, "Apache Tomcat")]);

        let result = probe.run(&target_for(&server), Duration::from_secs(5)).await;
        assert!(result.matched);
    }

    #[tokio::test]
    async fn test_network_failure_is_transient_marker() {
        // Nothing listens on port 1
        let target: Target = "http://127.0.0.1:1".parse().unwrap();
        let probe = HttpProbe::new("base", ProbeKind::HeaderCheck, client())
            .with_signatures(vec![Signature::contains("server", Surface::Header("Server".into()), "tomcat")]);

        let result = probe.run(&target, Duration::from_secs(2)).await;
        assert!(!result.matched);
        assert!(result.evidence.is_none());
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_later_answer_clears_earlier_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let probe = HttpProbe::new(
            "fingerprint-paths",
            ProbeKind::PathProbe {
                paths: vec!["/slow".into(), "/docs/".into()],
            },
            client(),
        )
        .with_status(StatusRequirement::Success);

        let result = probe.run(&target_for(&server), Duration::from_millis(300)).await;
        assert!(!result.matched);
        assert!(result.error.is_none());

        // Failure after the last answer is still reported
        let probe = HttpProbe::new(
            "fingerprint-paths",
            ProbeKind::PathProbe {
                paths: vec!["/docs/".into(), "/slow".into()],
            },
            client(),
        )
        .with_status(StatusRequirement::Success);

        let result = probe.run(&target_for(&server), Duration::from_millis(300)).await;
        assert!(!result.matched);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_status_gate_blocks_signatures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).insert_header("Liferay-Portal", "Liferay DXP 7.4"))
            .mount(&server)
            .await;

        let probe = HttpProbe::new("header-check", ProbeKind::HeaderCheck, client())
            .with_status(StatusRequirement::Success)
            .with_signatures(vec![Signature::present("liferay", Surface::Header("Liferay-Portal".into()))]);

        let result = probe.run(&target_for(&server), Duration::from_secs(5)).await;
        assert!(!result.matched);
        assert!(result.error.is_none());
    }
}
