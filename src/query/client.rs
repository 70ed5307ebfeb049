// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use super::{Lookup, QueryResponse, RemoteSource, SourceOutcome, SourcePolicy};
use crate::errors::ReconError;
use crate::http_client::HttpClient;
use crate::rate_limiter::{Pacer, PacerRegistry};
use crate::retry::RetryConfig;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Paced client for one remote API.
///
/// The pacer comes from a shared registry so every client and task talking
/// to the same API draws from one request budget.
pub struct RateLimitedClient<S: RemoteSource> {
    source: S,
    http_client: Arc<HttpClient>,
    pacer: Arc<Pacer>,
    retry: RetryConfig,
    cancel: Option<CancellationToken>,
}

impl<S: RemoteSource> RateLimitedClient<S> {
    pub async fn new(
        source: S,
        http_client: Arc<HttpClient>,
        registry: &PacerRegistry,
        policy: SourcePolicy,
    ) -> Self {
        let pacer = registry.pacer(source.name(), policy.pacing).await;
        Self {
            source,
            http_client,
            pacer,
            retry: policy.retry,
            cancel: None,
        }
    }

    /// Stop waiting in backoff once `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Issue one logical query. At most `max_attempts` HTTP calls are made.
    pub async fn query(&self, key: &str) -> QueryResponse {
        let name = self.source.name();
        let request = self.source.build_request(key);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            self.pacer.wait_for_slot().await;

            let response = match self.http_client.execute(&request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(source = name, key = key, error = %e, "Query failed");
                    return QueryResponse::TransientError(e.to_string());
                }
            };

            debug!(
                source = name,
                key = key,
                attempt = attempt,
                status = response.status_code,
                "Query response"
            );

            match response.status_code {
                429 => {
                    if attempt >= self.retry.max_attempts {
                        let err = ReconError::RateLimitExceeded {
                            source_name: name.to_string(),
                            attempts: attempt,
                        };
                        warn!(key = key, "{}", err);
                        return QueryResponse::RateLimited;
                    }

                    let delay = self.retry.calculate_backoff(attempt);
                    info!(
                        "{} throttled request for {}, retrying in {}ms ({}/{})",
                        name,
                        key,
                        delay.as_millis(),
                        attempt,
                        self.retry.max_attempts
                    );

                    if !self.sleep_or_cancel(delay).await {
                        return QueryResponse::TransientError(ReconError::Cancelled.to_string());
                    }
                }
                401 | 403 => {
                    warn!(source = name, key = key, "Credentials rejected");
                    return QueryResponse::Unauthorized;
                }
                404 => return QueryResponse::NotFound,
                status if (200..300).contains(&status) => {
                    return self.classify_payload(key, &response);
                }
                status => {
                    let err = ReconError::UnexpectedStatus {
                        status_code: status,
                        url: request.url.clone(),
                    };
                    warn!(source = name, key = key, "{}", err);
                    return QueryResponse::TransientError(err.to_string());
                }
            }
        }
    }

    fn classify_payload(&self, key: &str, response: &crate::http_client::HttpResponse) -> QueryResponse {
        match self.source.parse(key, response) {
            Ok(SourceOutcome::Items(items)) => QueryResponse::Success(items),
            Ok(SourceOutcome::NotFound) => QueryResponse::NotFound,
            Err(ReconError::AuthFailure { source_name, reason }) => {
                warn!(source = %source_name, key = key, "Credentials rejected: {}", reason);
                QueryResponse::Unauthorized
            }
            Err(ReconError::RateLimitExceeded { .. }) => QueryResponse::RateLimited,
            Err(e) => {
                warn!(source = self.source.name(), key = key, error = %e, "Discarding response payload");
                QueryResponse::TransientError(e.to_string())
            }
        }
    }

    /// `false` when cancelled before the delay elapsed
    async fn sleep_or_cancel(&self, delay: std::time::Duration) -> bool {
        match &self.cancel {
            Some(cancel) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => true,
                    _ = cancel.cancelled() => false,
                }
            }
            None => {
                tokio::time::sleep(delay).await;
                true
            }
        }
    }
}

#[async_trait]
impl<S: RemoteSource> Lookup for RateLimitedClient<S> {
    fn name(&self) -> &str {
        self.source.name()
    }

    fn accepts(&self, key: &str) -> bool {
        self.source.accepts(key)
    }

    async fn lookup(&self, key: &str) -> QueryResponse {
        self.query(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ReconResult;
    use crate::http_client::{ApiRequest, HttpResponse};
    use crate::types::QueryItem;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct EchoSource {
        base_url: String,
    }

    impl RemoteSource for EchoSource {
        fn name(&self) -> &str {
            "echo"
        }

        fn build_request(&self, key: &str) -> ApiRequest {
            ApiRequest::get(format!("{}/lookup/{}", self.base_url, key))
        }

        fn parse(&self, _key: &str, response: &HttpResponse) -> ReconResult<SourceOutcome> {
            let labels: Vec<String> = super::super::parse_json("echo", response)?;
            Ok(SourceOutcome::Items(labels.into_iter().map(QueryItem::new).collect()))
        }
    }

    async fn client_for(server: &MockServer, max_attempts: u32) -> RateLimitedClient<EchoSource> {
        let registry = PacerRegistry::new();
        RateLimitedClient::new(
            EchoSource { base_url: server.uri() },
            Arc::new(HttpClient::new(5).unwrap()),
            &registry,
            SourcePolicy::new(Duration::ZERO, Duration::from_millis(50), max_attempts),
        )
        .await
    }

    #[tokio::test]
    async fn test_status_classification() {
        let server = MockServer::start().await;
        Mock::given(path("/lookup/denied"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/lookup/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(path("/lookup/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(path("/lookup/garbled"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let client = client_for(&server, 3).await;
        assert_eq!(client.query("denied").await, QueryResponse::Unauthorized);
        assert_eq!(client.query("missing").await, QueryResponse::NotFound);
        assert!(matches!(client.query("broken").await, QueryResponse::TransientError(_)));
        assert!(matches!(client.query("garbled").await, QueryResponse::TransientError(_)));
    }

    #[tokio::test]
    async fn test_persistent_throttling_is_bounded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server, 2).await;
        assert_eq!(client.query("anything").await, QueryResponse::RateLimited);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_backoff() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let registry = PacerRegistry::new();
        let cancel = CancellationToken::new();
        let client = RateLimitedClient::new(
            EchoSource { base_url: server.uri() },
            Arc::new(HttpClient::new(5).unwrap()),
            &registry,
            SourcePolicy::new(Duration::ZERO, Duration::from_secs(30), 3),
        )
        .await
        .with_cancellation(cancel.clone());

        let trigger = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        });

        let started = std::time::Instant::now();
        let response = client.query("anything").await;
        trigger.await.unwrap();

        assert!(matches!(response, QueryResponse::TransientError(_)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
