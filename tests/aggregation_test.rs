// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Aggregation Tests
 * Multi-source fan-out against mocked upstream APIs
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use recon_scanner::aggregator::{Aggregator, RecordOutcome, NOT_FOUND_MARKER};
use recon_scanner::http_client::HttpClient;
use recon_scanner::query::github::{self, GitHubSource};
use recon_scanner::query::dehashed::DehashedSource;
use recon_scanner::query::hibp::HibpSource;
use recon_scanner::query::leakcheck::LeakCheckSource;
use recon_scanner::query::{Lookup, RateLimitedClient, SourcePolicy};
use recon_scanner::rate_limiter::PacerRegistry;
use recon_scanner::PrimaryItem;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn fast_policy() -> SourcePolicy {
    SourcePolicy::new(Duration::ZERO, Duration::from_millis(10), 3)
}

async fn github_lookup(server: &MockServer, registry: &PacerRegistry) -> Arc<dyn Lookup> {
    let http = Arc::new(HttpClient::new(5).unwrap());
    Arc::new(
        RateLimitedClient::new(
            GitHubSource::with_base_url(&server.uri(), "ghp_test"),
            http,
            registry,
            fast_policy(),
        )
        .await,
    )
}

async fn hibp_lookup(server: &MockServer, registry: &PacerRegistry) -> Arc<dyn Lookup> {
    let http = Arc::new(HttpClient::new(5).unwrap());
    Arc::new(
        RateLimitedClient::new(
            HibpSource::with_base_url(&server.uri(), "hibp_test"),
            http,
            registry,
            fast_policy(),
        )
        .await,
    )
}

#[tokio::test]
async fn test_failure_is_isolated_to_its_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("q", "CVE-2020-1938 exploit"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"total_count":2,"items":[
                {"name":"ghostcat-poc","html_url":"https://github.com/a/ghostcat-poc","description":"AJP LFI"},
                {"name":"CVE-2020-1938","html_url":"https://github.com/b/CVE-2020-1938","description":null}
            ]}"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("q", "CVE-2019-0232 exploit"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let registry = PacerRegistry::new();
    let aggregator = Aggregator::new(vec![github_lookup(&mock_server, &registry).await], 2)
        .with_empty_marker(github::NO_POCS_MARKER);

    let report = aggregator
        .aggregate(vec![
            PrimaryItem::new("CVE-2020-1938").with_context("Ghostcat"),
            PrimaryItem::new("CVE-2019-0232").with_context("CGI Servlet RCE"),
        ])
        .await;

    assert_eq!(report.len(), 2);
    assert_eq!(report.entries[0].query_key, "CVE-2020-1938");
    assert_eq!(report.entries[1].query_key, "CVE-2019-0232");

    let ghostcat = report.get("CVE-2020-1938").unwrap().record(github::SOURCE_NAME).unwrap();
    assert_eq!(ghostcat.items().len(), 2);
    assert_eq!(
        ghostcat.items()[1].description.as_deref(),
        Some("No description available")
    );
    assert!(!ghostcat.is_failure());

    let cgi = report.get("CVE-2019-0232").unwrap().record(github::SOURCE_NAME).unwrap();
    assert!(cgi.is_failure());
    assert!(matches!(cgi.outcome, RecordOutcome::Failed(_)));
    assert_eq!(report.failure_count(), 1);
}

#[tokio::test]
async fn test_zero_repositories_get_marker() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"total_count":0,"items":[]}"#))
        .mount(&mock_server)
        .await;

    let registry = PacerRegistry::new();
    let aggregator = Aggregator::new(vec![github_lookup(&mock_server, &registry).await], 1)
        .with_empty_marker(github::NO_POCS_MARKER);

    let report = aggregator.aggregate(vec![PrimaryItem::new("CVE-2024-0001")]).await;
    let record = report.get("CVE-2024-0001").unwrap().record(github::SOURCE_NAME).unwrap();

    assert!(record.items().is_empty());
    assert_eq!(record.marker.as_deref(), Some(github::NO_POCS_MARKER));
}

#[tokio::test]
async fn test_every_source_reports_for_every_key() {
    let github_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"items":[]}"#))
        .mount(&github_server)
        .await;

    let hibp_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/breachedaccount/alice@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"Name":"Adobe"},{"Name":"Adobe"}]"#))
        .mount(&hibp_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/breachedaccount/bob@example.com"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&hibp_server)
        .await;

    let registry = PacerRegistry::new();
    let aggregator = Aggregator::new(
        vec![
            github_lookup(&github_server, &registry).await,
            hibp_lookup(&hibp_server, &registry).await,
        ],
        2,
    );
    assert_eq!(aggregator.source_names(), vec!["github", "hibp"]);

    let report = aggregator
        .aggregate(vec![
            PrimaryItem::new("alice@example.com"),
            PrimaryItem::new("bob@example.com"),
            PrimaryItem::new("alice@example.com"),
            PrimaryItem::new("  "),
        ])
        .await;

    assert_eq!(report.len(), 2);
    for entry in &report.entries {
        assert_eq!(entry.records.len(), 2);
    }

    let alice = report.get("alice@example.com").unwrap();
    assert_eq!(alice.record("hibp").unwrap().items().len(), 1);
    assert_eq!(alice.record("github").unwrap().marker.as_deref(), Some("No results found"));

    let bob = report.get("bob@example.com").unwrap().record("hibp").unwrap();
    assert_eq!(bob.outcome, RecordOutcome::NotFound);
    assert_eq!(bob.marker.as_deref(), Some(NOT_FOUND_MARKER));
    assert!(!bob.is_failure());
}

#[tokio::test]
async fn test_domains_only_reach_dehashed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("query", "domain:example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"entries":[{"email":"ops@example.com","password":"winter2024"}]}"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("query", "dave@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"entries":[]}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/breachedaccount/example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/breachedaccount/dave@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"Name":"LinkedIn"}]"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/check"))
        .and(query_param("query", "example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success":true,"result":[]}"#))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/check"))
        .and(query_param("query", "dave@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success":false,"message":"Not found"}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let registry = PacerRegistry::new();
    let http = Arc::new(HttpClient::new(5).unwrap());
    let uri = mock_server.uri();
    let dehashed = RateLimitedClient::new(
        DehashedSource::with_base_url(&uri, "analyst", "dh_key"),
        Arc::clone(&http),
        &registry,
        fast_policy(),
    )
    .await;
    let hibp = RateLimitedClient::new(
        HibpSource::with_base_url(&uri, "hibp_key"),
        Arc::clone(&http),
        &registry,
        fast_policy(),
    )
    .await;
    let leakcheck = RateLimitedClient::new(
        LeakCheckSource::with_base_url(&uri, "lc_key"),
        Arc::clone(&http),
        &registry,
        fast_policy(),
    )
    .await;
    let sources: Vec<Arc<dyn Lookup>> = vec![Arc::new(dehashed), Arc::new(hibp), Arc::new(leakcheck)];

    let report = Aggregator::new(sources, 2)
        .aggregate(vec![PrimaryItem::new("example.com"), PrimaryItem::new("dave@example.com")])
        .await;

    let domain = report.get("example.com").unwrap();
    assert_eq!(domain.records.len(), 1);
    assert_eq!(domain.record("dehashed").unwrap().items()[0].label, "ops@example.com:winter2024");
    assert!(domain.record("hibp").is_none());
    assert!(domain.record("leakcheck").is_none());

    let email = report.get("dave@example.com").unwrap();
    assert_eq!(email.records.len(), 3);
    assert_eq!(email.record("hibp").unwrap().items()[0].label, "LinkedIn");
    assert_eq!(email.record("leakcheck").unwrap().outcome, RecordOutcome::NotFound);
    assert_eq!(report.failure_count(), 0);
}
